use super::KnowledgeImportError;
use std::time::Duration;
use tracing::info;

const EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extracts the document id from a Google Sheets link (`.../d/<id>/...`).
pub(crate) fn sheet_id(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("/d/")?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let id = &rest[..end];
    (!id.is_empty()).then_some(id)
}

pub(crate) fn csv_export_url(url: &str) -> Result<String, KnowledgeImportError> {
    let id =
        sheet_id(url).ok_or_else(|| KnowledgeImportError::InvalidSheetUrl(url.to_string()))?;
    Ok(format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv"))
}

/// Downloads the public CSV export of a sheet.
pub(crate) async fn fetch_csv(url: &str) -> Result<String, KnowledgeImportError> {
    let export_url = csv_export_url(url)?;
    info!(%export_url, "downloading dialog sheet");

    let client = reqwest::Client::builder().timeout(EXPORT_TIMEOUT).build()?;
    let body = client
        .get(&export_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_edit_link() {
        let url = "https://docs.google.com/spreadsheets/d/1AbC-d_9xYz/edit#gid=0";
        assert_eq!(sheet_id(url), Some("1AbC-d_9xYz"));
        assert_eq!(
            csv_export_url(url).expect("valid"),
            "https://docs.google.com/spreadsheets/d/1AbC-d_9xYz/export?format=csv"
        );
    }

    #[test]
    fn rejects_links_without_id() {
        assert!(sheet_id("https://docs.google.com/spreadsheets/").is_none());
        assert!(sheet_id("https://docs.google.com/spreadsheets/d/").is_none());
        assert!(matches!(
            csv_export_url("https://example.com/table.csv"),
            Err(KnowledgeImportError::InvalidSheetUrl(_))
        ));
    }
}
