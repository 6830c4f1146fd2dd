use serde::Serialize;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogMessage {
    pub source: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub dialog_id: String,
    pub messages: Vec<DialogMessage>,
}

/// Reads `source, content…, dialog_id, <ignored>` rows after a header line. Content
/// spanning several columns is re-joined with commas, keeping the spacing between the
/// pieces; consecutive rows with the same dialog id form one dialog.
pub(crate) fn parse_dialogs<R: Read>(reader: R) -> Result<Vec<Dialog>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut dialogs: Vec<Dialog> = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        if record.len() < 3 {
            continue;
        }

        let fields: Vec<&str> = record.iter().collect();
        let source = clean_field(fields[0]).to_string();
        let dialog_id = clean_field(fields[fields.len() - 2]).to_string();
        let content = clean_field(&fields[1..fields.len() - 2].join(",")).to_string();
        let message = DialogMessage { source, content };

        match dialogs.last_mut() {
            Some(current) if current.dialog_id == dialog_id => current.messages.push(message),
            _ => dialogs.push(Dialog {
                dialog_id,
                messages: vec![message],
            }),
        }
    }

    Ok(dialogs)
}

fn clean_field(value: &str) -> &str {
    value.trim().trim_matches('"').trim_start_matches('\u{feff}')
}
