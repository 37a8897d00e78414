//! End-to-end scenarios across the crawl-to-search pipeline that no single
//! module's unit tests exercise together.

use std::time::{Duration, SystemTime};

use norrsok::domain::DomainRegistry;
use norrsok::index::{InvertedIndex, SqliteStore};
use norrsok::orchestrator::SearchOrchestrator;
use norrsok::types::{Page, PageId};
use norrsok::Config;

fn page(url: &str, host: &str, title: &str, description: &str, body: &str, outbound: Vec<&str>) -> Page {
    Page {
        id: PageId(0),
        url: url.to_string(),
        host: host.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        body: body.to_string(),
        outbound_links: outbound.into_iter().map(String::from).collect(),
        fetched_at: SystemTime::now(),
        status: 200,
        size: body.len(),
        content_type: "text/html".to_string(),
        language: Some("sv".to_string()),
        discovered_from: None,
        content_hash: format!("hash-{url}"),
    }
}

fn seeded_orchestrator() -> SearchOrchestrator<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("open store");
    let index = InvertedIndex::new(store);

    index
        .upsert(&page(
            "https://smhi.se/vader/stockholm",
            "smhi.se",
            "Väder Stockholm",
            "Väderprognos för Stockholm",
            "Det blir soligt i Stockholm idag med risk för regn imorgon.",
            vec!["https://smhi.se/vader/goteborg"],
        ))
        .unwrap();
    index
        .upsert(&page(
            "https://smhi.se/vader/goteborg",
            "smhi.se",
            "Väder Göteborg",
            "Väderprognos för Göteborg",
            "Molnigt i Göteborg med vind från väster.",
            vec!["https://smhi.se/vader/stockholm"],
        ))
        .unwrap();
    index
        .upsert(&page(
            "https://dn.se/nyheter/politik",
            "dn.se",
            "Riksdagen röstar idag",
            "Nyheter om riksdagens omröstning",
            "Riksdagen samlas för att rösta om det nya förslaget.",
            vec![],
        ))
        .unwrap();

    let store = index.into_store();
    let mut domains = DomainRegistry::default_swedish_news();
    domains.record_success("smhi.se");
    domains.record_success("dn.se");
    SearchOrchestrator::new(store, domains, Config::default())
}

#[test]
fn site_filter_narrows_results_to_one_domain() {
    let orchestrator = seeded_orchestrator();
    let outcome = orchestrator.search("väder site:smhi.se").unwrap();
    assert_eq!(outcome.total, 2);
    assert!(outcome.results.iter().all(|r| r.domain == "smhi.se"));
}

#[test]
fn exclusion_term_filters_out_a_matching_page() {
    let orchestrator = seeded_orchestrator();
    let outcome = orchestrator.search("väder -göteborg").unwrap();
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.results[0].url, "https://smhi.se/vader/stockholm");
}

#[test]
fn phrase_query_requires_the_exact_phrase() {
    let orchestrator = seeded_orchestrator();
    let outcome = orchestrator.search("\"soligt i stockholm\"").unwrap();
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.results[0].url, "https://smhi.se/vader/stockholm");
}

#[test]
fn mutually_linked_pages_both_carry_a_positive_link_component() {
    let orchestrator = seeded_orchestrator();
    let outcome = orchestrator.search("väderprognos").unwrap();
    assert_eq!(outcome.total, 2);
    let urls: Vec<&str> = outcome.results.iter().map(|r| r.url.as_str()).collect();
    assert!(urls.contains(&"https://smhi.se/vader/stockholm"));
    assert!(urls.contains(&"https://smhi.se/vader/goteborg"));
    assert!(outcome.results.iter().all(|r| r.components.link > 0.0));
}

#[test]
fn snippet_windows_around_the_matched_term() {
    let orchestrator = seeded_orchestrator();
    let outcome = orchestrator.search("soligt").unwrap();
    assert_eq!(outcome.total, 1);
    let snippet = &outcome.results[0].snippet;
    assert!(snippet.to_lowercase().contains("soligt"));
    assert!(!outcome.results[0].highlights.is_empty());
}

#[test]
fn repeated_query_is_served_from_cache_with_identical_results() {
    let orchestrator = seeded_orchestrator();
    let first = orchestrator.search("riksdagen").unwrap();
    let second = orchestrator.search("riksdagen").unwrap();
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.results, second.results);
    let stats = orchestrator.cache_stats();
    assert_eq!(stats.hits, 1);
}

#[test]
fn analytics_tracks_every_search_including_cache_hits() {
    let orchestrator = seeded_orchestrator();
    orchestrator.search("riksdagen").unwrap();
    orchestrator.search("riksdagen").unwrap();
    orchestrator.search("väder").unwrap();
    let (total, unique, top) = orchestrator.analytics_snapshot();
    assert_eq!(total, 3);
    assert_eq!(unique, 2);
    assert_eq!(top[0].query, "riksdagen");
    assert_eq!(top[0].count, 2);
}

#[test]
fn language_filter_excludes_pages_without_a_matching_language() {
    let orchestrator = seeded_orchestrator();
    let outcome = orchestrator.search("väder lang:en").unwrap();
    assert_eq!(outcome.total, 0);
}

#[test]
fn consistency_sweep_is_a_no_op_on_a_freshly_built_index() {
    let store = SqliteStore::open_in_memory().expect("open store");
    let index = InvertedIndex::new(store);
    index
        .upsert(&page("https://dn.se/a", "dn.se", "Titel", "Beskrivning", "Text om vädret.", vec![]))
        .unwrap();
    let removed = index.sweep_consistency().unwrap();
    assert_eq!(removed, 0);
}

#[test]
fn frontier_and_domain_registry_agree_on_which_hosts_are_crawlable() {
    use norrsok::frontier::{AddOutcome, Frontier};

    let domains = DomainRegistry::default_swedish_news();
    let mut frontier = Frontier::with_system_clock(Duration::from_millis(100), 10);

    let candidates = ["https://svt.se/a", "https://evil.example.com/a"];
    for url in candidates {
        if domains.is_allowed(url) {
            assert_eq!(frontier.add(url, 5, None), AddOutcome::Added);
        }
    }
    assert_eq!(frontier.len(), 1);
}
