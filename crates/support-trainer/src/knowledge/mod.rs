//! Knowledge mined from exported support dialogs: product mentions, customer problems,
//! and problem/solution pairs.

mod extract;
mod parser;
mod sheets;

pub use extract::{ExtractedKnowledge, KnowledgeRules, SolutionPair};
pub use parser::{Dialog, DialogMessage};

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Number of entries per list in a [`KnowledgeSummary`].
pub const SUMMARY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeImportError {
    #[error("failed to read dialog export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid dialog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("dialog table is empty")]
    EmptyTable,
    #[error("not a Google Sheets link: {0}")]
    InvalidSheetUrl(String),
    #[error("failed to download sheet: {0}")]
    Download(#[from] reqwest::Error),
}

/// Parsed dialogs plus everything extracted from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    pub dialogs: Vec<Dialog>,
    pub knowledge: ExtractedKnowledge,
}

impl KnowledgeBase {
    pub fn summary(&self) -> KnowledgeSummary {
        KnowledgeSummary {
            dialogs_count: self.dialogs.len(),
            products_found: self.knowledge.products.len(),
            problems_found: self.knowledge.problems.len(),
            knowledge: ExtractedKnowledge {
                products: head(&self.knowledge.products),
                problems: head(&self.knowledge.problems),
                solutions: head(&self.knowledge.solutions),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSummary {
    pub dialogs_count: usize,
    pub products_found: usize,
    pub problems_found: usize,
    pub knowledge: ExtractedKnowledge,
}

pub struct KnowledgeImporter {
    rules: KnowledgeRules,
}

impl KnowledgeImporter {
    pub fn new(rules: KnowledgeRules) -> Self {
        Self { rules }
    }

    pub fn import_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<KnowledgeBase, KnowledgeImportError> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file)
    }

    pub fn import_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<KnowledgeBase, KnowledgeImportError> {
        let dialogs = parser::parse_dialogs(reader)?;
        if dialogs.is_empty() {
            return Err(KnowledgeImportError::EmptyTable);
        }

        let knowledge = extract::extract_knowledge(&dialogs, &self.rules);
        info!(
            dialogs = dialogs.len(),
            products = knowledge.products.len(),
            problems = knowledge.problems.len(),
            solutions = knowledge.solutions.len(),
            "dialog export processed"
        );

        Ok(KnowledgeBase { dialogs, knowledge })
    }

    /// Downloads a public Google Sheets table as CSV and processes it.
    pub async fn import_sheet(&self, url: &str) -> Result<KnowledgeBase, KnowledgeImportError> {
        let csv = sheets::fetch_csv(url).await?;
        self.import_reader(csv.as_bytes())
    }

    pub fn export_url(url: &str) -> Result<String, KnowledgeImportError> {
        sheets::csv_export_url(url)
    }
}

impl Default for KnowledgeImporter {
    fn default() -> Self {
        Self::new(KnowledgeRules::default())
    }
}

fn head<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().take(SUMMARY_LIMIT).cloned().collect()
}
