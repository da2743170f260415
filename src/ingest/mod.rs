// src/ingest/mod.rs
//! Startup ingestion: read the publication table (CSV or JSON), fill in missing
//! topics with the categorizer and freeze the result for the search index.
//!
//! Downloading/caching the upstream CSV is owned by deployment tooling; this
//! module only reads what is already on disk.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::publication::{
    synthesize_summary, Publication, PublicationRow, TopicCount, NO_LINK, UNTITLED,
};
use crate::topics::TopicCategorizer;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_rows_total", "Rows parsed from the publication table.");
        describe_counter!(
            "ingest_rows_skipped_total",
            "Malformed rows skipped while parsing."
        );
        describe_counter!(
            "ingest_rows_categorized_total",
            "Rows whose topic was assigned by the categorizer."
        );
        describe_gauge!("publications_loaded", "Publications held by the search index.");
    });
}

/// Load raw rows from `path`. `.json` files are read as an array of objects,
/// everything else as CSV with a header row.
pub fn load_rows(path: &Path) -> Result<Vec<PublicationRow>> {
    ensure_metrics_described();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let rows = if ext == "json" {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading publications from {}", path.display()))?;
        serde_json::from_str::<Vec<PublicationRow>>(&content)
            .with_context(|| format!("parsing publications JSON {}", path.display()))?
    } else {
        let file = fs::File::open(path)
            .with_context(|| format!("opening publications CSV {}", path.display()))?;
        parse_csv(file)
    };

    counter!("ingest_rows_total").increment(rows.len() as u64);
    info!(target: "ingest", path = %path.display(), rows = rows.len(), "publication table read");
    Ok(rows)
}

/// Parse CSV rows; records that fail to decode are skipped, not fatal.
pub fn parse_csv<R: Read>(reader: R) -> Vec<PublicationRow> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (position, rec) in rdr.deserialize::<PublicationRow>().enumerate() {
        match rec {
            Ok(mut row) => {
                row.position = Some(position);
                rows.push(row);
            }
            Err(e) => {
                warn!(target: "ingest", line = position + 2, error = %e, "skipping malformed row");
                counter!("ingest_rows_skipped_total").increment(1);
            }
        }
    }
    rows
}

/// Turn raw rows into the immutable publication table.
///
/// `id` is the row's position in the source table (falling back to its index
/// in `rows`); missing title/link get placeholders; rows without
/// a topic are categorized here, before the index becomes queryable.
pub fn build_publications(rows: Vec<PublicationRow>, categorizer: &TopicCategorizer) -> Vec<Publication> {
    ensure_metrics_described();
    let mut categorized = 0u64;

    let table: Vec<Publication> = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let row_position = row.position;
            let title = non_blank(row.title).unwrap_or_else(|| UNTITLED.to_string());
            let link = non_blank(row.link).unwrap_or_else(|| NO_LINK.to_string());
            let topic = match non_blank(row.topic) {
                Some(t) => t,
                None => {
                    categorized += 1;
                    categorizer.categorize(&title).to_string()
                }
            };
            let summary = synthesize_summary(&title, &topic);
            Publication {
                id: row_position.unwrap_or(idx) as u64,
                title,
                link,
                topic,
                summary,
            }
        })
        .collect();

    counter!("ingest_rows_categorized_total").increment(categorized);
    gauge!("publications_loaded").set(table.len() as f64);
    table
}

/// Optional precomputed topic distribution. Absent or unreadable ⇒ `None`.
pub fn load_topic_projection(path: &Path) -> Option<Vec<TopicCount>> {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            if path.exists() {
                warn!(target: "ingest", path = %path.display(), error = %e, "topic projection unreadable");
            }
            return None;
        }
    };
    match serde_json::from_str::<Vec<TopicCount>>(&content) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(target: "ingest", path = %path.display(), error = %e, "topic projection malformed; recomputing");
            None
        }
    }
}

/// Read + build in one step.
pub fn load_table(path: &Path, categorizer: &TopicCategorizer) -> Result<Vec<Publication>> {
    let rows = load_rows(path)?;
    Ok(build_publications(rows, categorizer))
}

/// Like [`load_table`], but a missing or unreadable table yields an empty one.
pub fn load_table_or_empty(path: &Path, categorizer: &TopicCategorizer) -> Vec<Publication> {
    match load_table(path, categorizer) {
        Ok(table) => table,
        Err(e) => {
            warn!(target: "ingest", error = ?e, "publication table unavailable; serving empty index");
            gauge!("publications_loaded").set(0.0);
            Vec::new()
        }
    }
}

fn non_blank(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Title,Link\n\
Mice in Bion-M 1 space mission: training and selection,https://example.org/pmc1\n\
\"Microgravity induces pelvic bone loss, in mice\",https://example.org/pmc2\n\
Stem cell health,\n\
,https://example.org/pmc4\n";

    #[test]
    fn csv_rows_keep_order_and_quoted_commas() {
        let rows = parse_csv(SAMPLE.as_bytes());
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[1].title.as_deref(),
            Some("Microgravity induces pelvic bone loss, in mice")
        );
        assert_eq!(rows[0].topic, None);
    }

    #[test]
    fn build_applies_placeholders_and_categorizes() {
        let rows = parse_csv(SAMPLE.as_bytes());
        let table = build_publications(rows, &TopicCategorizer::default());

        assert_eq!(table[0].id, 0);
        assert_eq!(table[0].topic, "Other");
        assert_eq!(table[1].topic, "Human Health");
        assert_eq!(table[2].link, NO_LINK);
        assert_eq!(table[3].title, UNTITLED);
        assert_eq!(table[3].id, 3);
        assert!(table[1].summary.contains("microgravity induces pelvic bone loss"));
    }

    #[test]
    fn precomputed_topic_is_kept() {
        let rows = vec![PublicationRow {
            title: Some("Bone density study".into()),
            link: Some("https://x".into()),
            topic: Some("Radiation".into()),
            ..Default::default()
        }];
        let table = build_publications(rows, &TopicCategorizer::default());
        assert_eq!(table[0].topic, "Radiation");
    }

    #[test]
    fn missing_projection_is_none() {
        let p = Path::new("definitely/not/here/topics.json");
        assert!(load_topic_projection(p).is_none());
    }

    #[test]
    fn malformed_projection_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("topics.json");
        fs::write(&p, r#"{"Plants": 3}"#).unwrap();
        assert!(load_topic_projection(&p).is_none());
    }

    #[test]
    fn malformed_record_is_skipped_and_ids_keep_source_position() {
        let mut raw = b"Title,Link\nFirst bone,https://example.org/1\n".to_vec();
        raw.extend_from_slice(b"Bad \xff\xfe row,https://example.org/2\n");
        raw.extend_from_slice(b"Third plant,https://example.org/3\n");

        let rows = parse_csv(raw.as_slice());
        assert_eq!(rows.len(), 2);

        let table = build_publications(rows, &TopicCategorizer::default());
        let ids: Vec<(u64, &str)> = table.iter().map(|p| (p.id, p.title.as_str())).collect();
        assert_eq!(ids, vec![(0, "First bone"), (2, "Third plant")]);
    }

    #[test]
    fn json_table_is_read_as_array() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("publications.json");
        fs::write(
            &p,
            r#"[
                {"Title": "Arabidopsis root growth", "Link": "https://example.org/a"},
                {"Title": "Cosmic rays in orbit", "Topic": "Radiation"},
                {"Link": "https://example.org/c"}
            ]"#,
        )
        .unwrap();

        let table = load_table(&p, &TopicCategorizer::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].topic, "Plants");
        assert_eq!(table[1].link, NO_LINK);
        assert_eq!(table[1].topic, "Radiation");
        assert_eq!(table[2].title, UNTITLED);
        assert_eq!(table[2].id, 2);
    }

    #[test]
    fn malformed_json_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("publications.json");
        fs::write(&p, "[{").unwrap();
        assert!(load_rows(&p).is_err());
        assert!(load_table_or_empty(&p, &TopicCategorizer::default()).is_empty());
    }
}
