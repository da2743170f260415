//! Rule-based topic categorizer.
//!
//! Rules are checked in declaration order; the first rule with any keyword
//! occurring in the lowercased title wins. No match yields [`OTHER_TOPIC`].

use serde::Deserialize;

use crate::publication::TopicCount;

pub const OTHER_TOPIC: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TopicRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, title_lower: &str) -> bool {
        self.keywords.iter().any(|k| title_lower.contains(k.as_str()))
    }
}

/// Built-in seven-topic rule set, in priority order.
pub fn default_rules() -> Vec<TopicRule> {
    vec![
        TopicRule::new(
            "Human Health",
            &["bone", "muscle", "cardiovascular", "immune", "health", "skeletal", "cardiac", "blood"],
        ),
        TopicRule::new(
            "Plants",
            &["plant", "arabidopsis", "growth", "photosynthesis", "seed", "root", "leaf"],
        ),
        TopicRule::new(
            "Radiation",
            &["radiation", "dna damage", "cosmic rays", "ionizing", "radioprotection"],
        ),
        TopicRule::new(
            "Microgravity",
            &["microgravity", "weightlessness", "gravity", "spaceflight", "simulated microgravity"],
        ),
        TopicRule::new(
            "Cell Biology",
            &["cell", "cellular", "protein", "gene", "expression", "signaling"],
        ),
        TopicRule::new(
            "Development",
            &["development", "embryo", "differentiation", "morphology"],
        ),
        TopicRule::new(
            "Metabolism",
            &["metabolism", "metabolic", "nutrient", "oxidative"],
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct TopicCategorizer {
    rules: Vec<TopicRule>,
}

impl TopicCategorizer {
    /// Keywords are lowercased and trimmed; blank ones are dropped.
    pub fn new(rules: Vec<TopicRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| TopicRule {
                name: r.name.trim().to_string(),
                keywords: r
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[TopicRule] {
        &self.rules
    }

    pub fn categorize(&self, title: &str) -> &str {
        let lower = title.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lower))
            .map(|r| r.name.as_str())
            .unwrap_or(OTHER_TOPIC)
    }

    /// Categorize a batch; returns topics parallel to `titles` plus the counts.
    pub fn categorize_all<S: AsRef<str>>(&self, titles: &[S]) -> (Vec<String>, Vec<TopicCount>) {
        let topics: Vec<String> = titles
            .iter()
            .map(|t| self.categorize(t.as_ref()).to_string())
            .collect();
        let counts = self.topic_counts(&topics);
        (topics, counts)
    }

    /// Counts sorted descending; ties keep rule order, with "Other" last.
    pub fn topic_counts<S: AsRef<str>>(&self, topics: &[S]) -> Vec<TopicCount> {
        let mut counts: Vec<TopicCount> = self
            .rules
            .iter()
            .map(|r| r.name.as_str())
            .chain(std::iter::once(OTHER_TOPIC))
            .map(|name| TopicCount::new(name, 0))
            .collect();

        for t in topics {
            if let Some(c) = counts.iter_mut().find(|c| c.name == t.as_ref()) {
                c.count += 1;
            }
        }

        counts.retain(|c| c.count > 0);
        // sort_by is stable, so equal counts keep declaration order.
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }
}

impl Default for TopicCategorizer {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_other() {
        let c = TopicCategorizer::default();
        assert_eq!(c.categorize(""), OTHER_TOPIC);
    }

    #[test]
    fn bone_is_human_health() {
        let c = TopicCategorizer::default();
        assert_eq!(c.categorize("Bone density study"), "Human Health");
    }

    #[test]
    fn earlier_rule_wins_on_overlap() {
        let c = TopicCategorizer::default();
        // "plant" (Plants) and "microgravity" (Microgravity) both match.
        assert_eq!(c.categorize("Plant roots in microgravity"), "Plants");
        // "cell" (Cell Biology) vs "muscle" (Human Health).
        assert_eq!(c.categorize("Muscle cell atrophy"), "Human Health");
    }

    #[test]
    fn matching_is_case_insensitive_and_substring_based() {
        let c = TopicCategorizer::default();
        assert_eq!(c.categorize("SPACEFLIGHT-induced changes"), "Microgravity");
        assert_eq!(c.categorize("Osteoblast bioenergetics"), OTHER_TOPIC);
    }

    #[test]
    fn configured_keywords_are_normalized() {
        let c = TopicCategorizer::new(vec![TopicRule {
            name: " Rodents ".into(),
            keywords: vec!["  MICE ".into(), "".into()],
        }]);
        assert_eq!(c.rules()[0].keywords, vec!["mice".to_string()]);
        assert_eq!(c.categorize("Mice aboard the ISS"), "Rodents");
        assert_eq!(c.categorize("anything"), OTHER_TOPIC);
    }

    #[test]
    fn counts_sorted_with_rule_order_tie_break() {
        let c = TopicCategorizer::default();
        let titles = [
            "Radiation exposure",
            "Plant growth",
            "Unrelated",
            "Bone loss",
            "Cosmic rays and DNA damage",
        ];
        let (topics, counts) = c.categorize_all(&titles);
        assert_eq!(topics.len(), titles.len());
        assert_eq!(
            counts,
            vec![
                TopicCount::new("Radiation", 2),
                TopicCount::new("Human Health", 1),
                TopicCount::new("Plants", 1),
                TopicCount::new(OTHER_TOPIC, 1),
            ]
        );
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), titles.len());
    }
}
