use std::path::PathBuf;
use support_trainer::knowledge::{KnowledgeImportError, KnowledgeImporter};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn imports_dialog_export_from_disk() {
    let base = KnowledgeImporter::default()
        .import_path(fixture("dialogs.csv"))
        .expect("fixture imports");

    let ids: Vec<&str> = base
        .dialogs
        .iter()
        .map(|dialog| dialog.dialog_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1001", "1002", "1003"]);
    assert_eq!(base.dialogs[0].messages.len(), 3);
    assert_eq!(
        base.dialogs[0].messages[1].content,
        "Добрый день! Проверьте момент затяжки колец, рекомендуем 2,5 Нм."
    );

    assert_eq!(base.knowledge.problems.len(), 3);
    assert_eq!(base.knowledge.solutions.len(), 4);
    assert!(base
        .knowledge
        .products
        .iter()
        .any(|product| product.contains("бинокль")));
    assert!(base
        .knowledge
        .solutions
        .iter()
        .filter(|pair| pair.problem == "Как настроить параллакс на моём прицеле?")
        .count()
        == 2);
}

#[test]
fn summary_reports_counts() {
    let summary = KnowledgeImporter::default()
        .import_path(fixture("dialogs.csv"))
        .expect("fixture imports")
        .summary();
    assert_eq!(summary.dialogs_count, 3);
    assert_eq!(summary.problems_found, 3);
    assert_eq!(summary.knowledge.solutions.len(), 4);
}

#[test]
fn export_url_rejects_foreign_links() {
    assert!(matches!(
        KnowledgeImporter::export_url("https://example.com/dialogs"),
        Err(KnowledgeImportError::InvalidSheetUrl(_))
    ));
    assert!(KnowledgeImporter::export_url("https://docs.google.com/spreadsheets/d/abc123/edit")
        .is_ok_and(|url| url.ends_with("/d/abc123/export?format=csv")));
}
