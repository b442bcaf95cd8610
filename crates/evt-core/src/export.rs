//! Tabular export seam.
//!
//! The core produces an [`ExportTable`]; rendering it to a shareable
//! document is the job of an [`Exporter`] supplied by the caller.

use serde::Serialize;

use crate::timing::RaceEntry;

/// Rows ready for rendering. Every row has one cell per header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// The standard `ID | Time` results table.
    pub fn race_results<'a>(
        subtitle: Option<String>,
        entries: impl IntoIterator<Item = &'a RaceEntry>,
    ) -> Self {
        Self {
            title: "Race Results".to_string(),
            subtitle,
            headers: vec!["ID".to_string(), "Time".to_string()],
            rows: entries
                .into_iter()
                .map(|e| vec![e.id.to_string(), e.elapsed_display()])
                .collect(),
        }
    }
}

/// Renders an [`ExportTable`] into some document format.
pub trait Exporter {
    type Output;
    type Error;

    fn export(&self, table: &ExportTable) -> Result<Self::Output, Self::Error>;
}
