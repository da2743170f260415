//! # Search Index
//! In-memory, read-only publication table answering keyword and topic queries.
//!
//! Matching is a case-insensitive substring OR over the extracted keywords;
//! results come back in table order, truncated at the effective limit.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::{EngineError, EngineResult};
use crate::publication::{Publication, TopicCount};

pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound for keyword searches.
pub const KEYWORD_LIMIT_CAP: usize = 100;
/// Upper bound for topic browsing without query text.
pub const TOPIC_BROWSE_LIMIT_CAP: usize = 200;
/// Topic filter value that means "no filter".
pub const ALL_TOPICS: &str = "All";

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "what", "does", "do", "is", "are", "how", "why", "when", "where", "who", "the", "a", "an",
        "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "about",
        "as", "into", "through", "during", "before", "after", "above", "below", "between",
        "under", "since", "can", "could", "would", "should", "may", "might", "will", "shall",
        "have", "has", "had", "been", "be", "being", "it", "its", "itself", "they", "them",
        "their", "this", "that", "these", "those", "i", "you", "he", "she", "we", "me", "him",
        "her", "us", "there",
    ]
    .into_iter()
    .collect()
});

/// Meaningful lowercase keywords of a natural-language query.
///
/// Strips `? ! . ,`, splits on whitespace and drops stop words and tokens
/// shorter than three characters.
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .replace(['?', '!', '.', ','], "")
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    table: Vec<Publication>,
    /// Lowercased titles, parallel to `table`.
    lowered: Vec<String>,
    projection: Option<Vec<TopicCount>>,
}

impl SearchIndex {
    pub fn new(table: Vec<Publication>) -> Self {
        let lowered = table.iter().map(|p| p.title.to_lowercase()).collect();
        Self {
            table,
            lowered,
            projection: None,
        }
    }

    /// Attach a precomputed distribution served by [`Self::topic_distribution`].
    pub fn with_projection(mut self, projection: Option<Vec<TopicCount>>) -> Self {
        self.projection = projection;
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Search by query text and/or topic. At least one must be supplied.
    pub fn search(
        &self,
        query: &str,
        topic: Option<&str>,
        limit: usize,
    ) -> EngineResult<Vec<Publication>> {
        let query = if query.trim().is_empty() { "" } else { query };
        let topic = topic.filter(|t| !t.trim().is_empty());

        if query.is_empty() && topic.is_none() {
            return Err(EngineError::InvalidRequest(
                "a query or a topic is required".to_string(),
            ));
        }

        let cap = if query.is_empty() {
            TOPIC_BROWSE_LIMIT_CAP
        } else {
            KEYWORD_LIMIT_CAP
        };
        let limit = limit.min(cap);

        let topic_filter = topic.filter(|t| *t != ALL_TOPICS);
        let keys = if query.is_empty() {
            Vec::new()
        } else {
            match extract_keywords(query) {
                k if k.is_empty() => vec![query.to_lowercase()],
                k => k,
            }
        };

        let hits = self
            .table
            .iter()
            .zip(&self.lowered)
            .filter(|(p, _)| topic_filter.map_or(true, |t| p.topic == t))
            .filter(|(_, title)| keys.is_empty() || keys.iter().any(|k| title.contains(k.as_str())))
            .take(limit)
            .map(|(p, _)| p.clone())
            .collect();

        Ok(hits)
    }

    /// Topic counts, descending; equal counts keep first-seen order.
    pub fn topic_distribution(&self) -> Vec<TopicCount> {
        if let Some(p) = &self.projection {
            return p.clone();
        }

        let mut counts: Vec<TopicCount> = Vec::new();
        for p in &self.table {
            match counts.iter_mut().find(|c| c.name == p.topic) {
                Some(c) => c.count += 1,
                None => counts.push(TopicCount::new(p.topic.clone(), 1)),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::synthesize_summary;

    fn publication(id: u64, title: &str, topic: &str) -> Publication {
        Publication {
            id,
            title: title.to_string(),
            link: format!("https://example.org/{id}"),
            topic: topic.to_string(),
            summary: synthesize_summary(title, topic),
        }
    }

    fn index() -> SearchIndex {
        SearchIndex::new(vec![
            publication(0, "Bone loss in microgravity", "Human Health"),
            publication(1, "Arabidopsis root growth", "Plants"),
            publication(2, "Seed germination aboard ISS", "Plants"),
            publication(3, "Cosmic rays and DNA damage", "Radiation"),
            publication(4, "Muscle atrophy after spaceflight", "Human Health"),
        ])
    }

    #[test]
    fn keywords_drop_stop_words_and_punctuation() {
        let mut k = extract_keywords("What does microgravity do to bone?");
        k.sort();
        assert_eq!(k, vec!["bone".to_string(), "microgravity".to_string()]);
    }

    #[test]
    fn keywords_drop_short_tokens() {
        assert!(extract_keywords("is it ok?").is_empty());
        assert_eq!(extract_keywords("ISS, RNA!"), vec!["iss", "rna"]);
    }

    #[test]
    fn empty_query_and_no_topic_is_invalid() {
        let err = index().search("", None, 10).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
        assert!(index().search("   ", Some(""), 10).is_err());
    }

    #[test]
    fn keyword_or_match_in_table_order() {
        let hits = index().search("bone muscle", None, 10).unwrap();
        let ids: Vec<u64> = hits.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 4]);
    }

    #[test]
    fn all_stop_words_fall_back_to_whole_query() {
        // Every token is a stop word, so the raw lowercased query is the key.
        let idx = SearchIndex::new(vec![publication(0, "What is it", "Other")]);
        let hits = idx.search("What is it", None, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(index().search("What is it", None, 10).unwrap().is_empty());
    }

    #[test]
    fn topic_filter_applies_before_text() {
        let hits = index().search("growth loss", Some("Plants"), 10).unwrap();
        let ids: Vec<u64> = hits.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn all_topic_means_unfiltered() {
        assert_eq!(index().search("", Some(ALL_TOPICS), 50).unwrap().len(), 5);
    }

    #[test]
    fn limit_truncates_first_matches() {
        let hits = index().search("", Some("Plants"), 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn distribution_ties_keep_first_seen_order() {
        let d = index().topic_distribution();
        assert_eq!(
            d,
            vec![
                TopicCount::new("Human Health", 2),
                TopicCount::new("Plants", 2),
                TopicCount::new("Radiation", 1),
            ]
        );
    }

    #[test]
    fn projection_wins_over_recompute() {
        let idx = index().with_projection(Some(vec![TopicCount::new("Cached", 5)]));
        assert_eq!(idx.topic_distribution(), vec![TopicCount::new("Cached", 5)]);
    }
}
