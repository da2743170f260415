// tests/search_engine.rs
//
// End-to-end over a CSV on disk: ingestion → categorization → search /
// topic distribution, through the AdvisoryService facade.

use std::fmt::Write as _;
use std::fs;
use std::sync::Arc;

use biocosmos::config::EngineConfig;
use biocosmos::generate::MockGenerator;
use biocosmos::ingest::load_table;
use biocosmos::search::{KEYWORD_LIMIT_CAP, TOPIC_BROWSE_LIMIT_CAP};
use biocosmos::{AdvisoryService, EngineError, SearchIndex, TopicCategorizer, TopicCount};
use tempfile::TempDir;

const TABLE: &str = "Title,Link\n\
Microgravity effects on bone density in mice,https://example.org/1\n\
Arabidopsis root growth on the ISS,https://example.org/2\n\
Seed germination in simulated lunar gravity,https://example.org/3\n\
Cosmic rays and DNA damage in astronauts,https://example.org/4\n\
Mice in Bion-M 1 space mission: training and selection,https://example.org/5\n\
Protein crystallization aboard Shuttle,\n";

fn service_for(csv: &str) -> (TempDir, AdvisoryService) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("publications.csv");
    fs::write(&path, csv).unwrap();

    let mut cfg = EngineConfig::default();
    cfg.data.publications_path = path;
    cfg.data.topics_path = dir.path().join("missing-topics.json");
    let svc = AdvisoryService::from_config_with_generator(&cfg, Arc::new(MockGenerator::new("ok")));
    (dir, svc)
}

#[test]
fn ingestion_categorizes_rows() {
    let (_dir, svc) = service_for(TABLE);
    let all = svc.search("", Some("All"), 50).unwrap();
    let topics: Vec<&str> = all.iter().map(|p| p.topic.as_str()).collect();
    assert_eq!(
        topics,
        vec!["Human Health", "Plants", "Plants", "Radiation", "Other", "Cell Biology"]
    );
    assert_eq!(all[5].link, "#");
}

#[test]
fn natural_language_query_matches_any_keyword() {
    let (_dir, svc) = service_for(TABLE);
    let hits = svc.search("What does microgravity do to bone?", None, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 0);

    let hits = svc.search("mice and seed", None, 10).unwrap();
    let ids: Vec<u64> = hits.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 2, 4]);
}

#[test]
fn topic_browse_returns_only_that_topic() {
    let (_dir, svc) = service_for(TABLE);
    let hits = svc.search("", Some("Plants"), 10).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|p| p.topic == "Plants"));
}

#[test]
fn missing_query_and_topic_is_invalid() {
    let (_dir, svc) = service_for(TABLE);
    assert!(matches!(
        svc.search("", None, 10),
        Err(EngineError::InvalidRequest(_))
    ));
}

#[test]
fn limits_are_capped_by_mode() {
    let mut csv = String::from("Title,Link\n");
    for i in 0..250 {
        writeln!(csv, "Plant study number {i},https://example.org/{i}").unwrap();
    }
    let (_dir, svc) = service_for(&csv);

    assert_eq!(svc.search("plant", None, 500).unwrap().len(), KEYWORD_LIMIT_CAP);
    assert_eq!(
        svc.search("", Some("Plants"), 500).unwrap().len(),
        TOPIC_BROWSE_LIMIT_CAP
    );
    assert_eq!(svc.search("plant", None, 7).unwrap().len(), 7);
}

#[test]
fn long_titles_get_truncated_summaries() {
    let title = "Transcriptomic profiling of murine soleus and gastrocnemius skeletal muscle following thirty days of hindlimb unloading and subsequent reloading in a ground analog of long duration spaceflight";
    let csv = format!("Title,Link\n{title},https://example.org/x\nBone,https://example.org/y\n");
    let (_dir, svc) = service_for(&csv);

    let hits = svc.search("", Some("Human Health"), 10).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].summary.ends_with("..."));
    assert_eq!(hits[0].summary.chars().count(), 303);
    assert!(!hits[1].summary.ends_with("..."));
    assert!(hits[1].summary.chars().count() <= 300);
}

#[test]
fn distribution_sums_to_table_size_and_is_sorted() {
    let (_dir, svc) = service_for(TABLE);
    let d = svc.topic_distribution();
    assert_eq!(d.iter().map(|c| c.count).sum::<usize>(), 6);
    assert_eq!(d[0], TopicCount::new("Plants", 2));
    // Ties keep first-seen order.
    let rest: Vec<&str> = d[1..].iter().map(|c| c.name.as_str()).collect();
    assert_eq!(rest, vec!["Human Health", "Radiation", "Other", "Cell Biology"]);
}

#[test]
fn precomputed_projection_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("publications.csv");
    let topics = dir.path().join("topics.json");
    fs::write(&table, TABLE).unwrap();
    fs::write(&topics, r#"[{"name":"Plants","count":300},{"name":"Other","count":1}]"#).unwrap();

    let mut cfg = EngineConfig::default();
    cfg.data.publications_path = table;
    cfg.data.topics_path = topics;
    let svc = AdvisoryService::from_config_with_generator(&cfg, Arc::new(MockGenerator::new("ok")));

    assert_eq!(
        svc.topic_distribution(),
        vec![TopicCount::new("Plants", 300), TopicCount::new("Other", 1)]
    );
}

#[test]
fn missing_table_serves_empty_index() {
    let mut cfg = EngineConfig::default();
    cfg.data.publications_path = "does/not/exist.csv".into();
    cfg.data.topics_path = "does/not/exist.json".into();
    let svc = AdvisoryService::from_config_with_generator(&cfg, Arc::new(MockGenerator::new("ok")));

    assert!(svc.index().is_empty());
    assert!(svc.search("bone", None, 10).unwrap().is_empty());
    assert!(svc.topic_distribution().is_empty());
}

#[tokio::test]
async fn answer_returns_response_and_results() {
    let (_dir, svc) = service_for(TABLE);
    let out = svc.answer("How do roots grow?", 10).await.unwrap();
    assert_eq!(out.response, "ok");
    assert_eq!(out.results.len(), 1);
    assert_eq!(out.results[0].id, 1);

    let none = svc.answer("zebrafish", 10).await.unwrap();
    assert!(none.results.is_empty());
    assert!(none.response.starts_with("No studies found for \"zebrafish\""));

    assert!(matches!(
        svc.answer("  ", 10).await,
        Err(EngineError::InvalidRequest(_))
    ));
}

#[test]
fn loaded_table_keeps_topic_column_and_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categorized.csv");
    fs::write(
        &path,
        "Title,Link,Topic\n\
Bone loss in mice,https://example.org/1,Radiation\n\
,https://example.org/2,Plants\n\
Seed germination,https://example.org/3,\n",
    )
    .unwrap();

    let table = load_table(&path, &TopicCategorizer::default()).unwrap();
    assert_eq!(table[0].topic, "Radiation");
    assert_eq!(table[1].title, "Untitled");

    let index = SearchIndex::new(table);
    assert_eq!(
        index.topic_distribution(),
        vec![TopicCount::new("Plants", 2), TopicCount::new("Radiation", 1)]
    );
}
