//! Publication records as served to the dashboard.

use serde::{Deserialize, Serialize};

/// Summaries are capped at this many characters before the ellipsis.
pub const SUMMARY_MAX_CHARS: usize = 300;

pub const UNTITLED: &str = "Untitled";
pub const NO_LINK: &str = "#";

/// One immutable row of the publication table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub id: u64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Summary")]
    pub summary: String,
}

/// Raw row from the tabular source. Any cell may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublicationRow {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Link", default)]
    pub link: Option<String>,
    #[serde(rename = "Topic", default)]
    pub topic: Option<String>,
    /// Record index in the source table (header excluded), set by the CSV
    /// reader so skipped records do not shift the ids of later rows.
    #[serde(skip)]
    pub position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub name: String,
    pub count: usize,
}

impl TopicCount {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Templated stand-in for an abstract, truncated to [`SUMMARY_MAX_CHARS`].
pub fn synthesize_summary(title: &str, topic: &str) -> String {
    let summary = format!(
        "This NASA bioscience publication explores {}. Categorized under {}, this research provides valuable insights for space exploration and understanding biological processes in microgravity environments.",
        title.to_lowercase(),
        topic
    );
    truncate_summary(summary)
}

fn truncate_summary(summary: String) -> String {
    match summary.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &summary[..cut]),
        None => summary,
    }
}
