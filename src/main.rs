mod cli;

use std::fs;
use std::time::{Duration, SystemTime};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::{Cli, Commands};
use norrsok::config::Config;
use norrsok::domain::{DomainList, DomainRegistry};
use norrsok::fetch::Fetcher;
use norrsok::frontier::Frontier;
use norrsok::index::{InvertedIndex, SqliteStore};
use norrsok::orchestrator::SearchOrchestrator;
use norrsok::types::{CrawlLogEntry, PageId};
use norrsok::{consistency, SearchError};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Crawl { domains, max_pages } => run_crawl(&config, domains.as_deref(), max_pages),
        Commands::Search { query, limit } => run_search(&config, &query, limit),
        Commands::Stats => run_stats(&config),
        Commands::Sweep { strict } => run_sweep(&config, strict),
        Commands::Check { url, domains } => run_check(&url, domains.as_deref()),
        Commands::Suggest { prefix, limit } => run_suggest(&config, &prefix, limit),
        Commands::Related { page_id, limit } => run_related(&config, page_id, limit),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&str>) -> Result<Config, SearchError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| SearchError::Config { detail: e.to_string() })?;
            Config::from_toml(&text)
        }
        None => Ok(Config::default()),
    }
}

fn load_domains(path: Option<&str>) -> Result<DomainRegistry, SearchError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| SearchError::Config { detail: e.to_string() })?;
            let list: DomainList = serde_json::from_str(&text).map_err(|e| SearchError::Config { detail: e.to_string() })?;
            Ok(DomainRegistry::from_list(list))
        }
        None => Ok(DomainRegistry::default_swedish_news()),
    }
}

fn run_crawl(config: &Config, domains_path: Option<&str>, max_pages: usize) -> Result<(), SearchError> {
    let mut domains = load_domains(domains_path)?;
    let store = SqliteStore::open(&config.db_path)?;
    let index = InvertedIndex::new(store);
    let fetcher = Fetcher::new(
        Duration::from_millis(config.fetch_connect_deadline_ms),
        Duration::from_millis(config.fetch_deadline_ms),
        config.max_redirects,
        "norrsok/0.1 (+https://norrsok.se/bot)",
    )?;

    let mut frontier = Frontier::with_system_clock(config.per_host_delay(), max_pages * 10);
    for host in domains.sample_hosts(usize::MAX) {
        frontier.add(&format!("https://{host}/"), 5, None);
    }

    let progress = ProgressBar::new(max_pages as u64);
    progress.set_style(ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}").unwrap_or_else(|_| ProgressStyle::default_bar()));

    let mut robots_cache: std::collections::HashMap<String, norrsok::fetch::RobotsRules> = std::collections::HashMap::new();

    let mut fetched = 0usize;
    while fetched < max_pages {
        let Some(url) = frontier.next() else { break };
        let Some(host) = norrsok::canonical::host_of(&url) else { continue };

        if let Err(e) = domains.check_allowed(&url) {
            tracing::warn!(url = %url, error = %e, "domain rejected");
            frontier.mark_failed(&url);
            continue;
        }

        let robots = robots_cache.entry(host.clone()).or_insert_with(|| fetcher.fetch_robots(&host));
        let path = norrsok::canonical::path_of(&url).unwrap_or_else(|| "/".to_string());
        if !robots.is_allowed(&path) {
            tracing::warn!(url = %url, "disallowed by robots.txt");
            frontier.mark_failed(&url);
            continue;
        }

        match fetcher.fetch(&url, None) {
            Ok(page) => {
                for link in &page.outbound_links {
                    if domains.is_allowed(link) {
                        frontier.add(link, 5, Some(url.clone()));
                    }
                }
                index.upsert(&page)?;
                index.mark_visited(&url, SystemTime::now())?;
                index.append_crawl_log(&CrawlLogEntry {
                    url: url.clone(),
                    status: Some(page.status),
                    fetched_at: SystemTime::now(),
                    error: None,
                })?;
                domains.record_success(&host);
                fetched += 1;
                progress.set_position(fetched as u64);
                progress.set_message(url.clone());
            }
            Err(e) => {
                domains.record_failure(&host, SystemTime::now());
                index.append_crawl_log(&CrawlLogEntry {
                    url: url.clone(),
                    status: None,
                    fetched_at: SystemTime::now(),
                    error: Some(e.to_string()),
                })?;
                frontier.mark_failed(&url);
                tracing::warn!(url = %url, error = %e, "fetch failed");
            }
        }
    }
    progress.finish_with_message("done");
    Ok(())
}

fn run_search(config: &Config, query: &str, limit: usize) -> Result<(), SearchError> {
    let store = SqliteStore::open(&config.db_path)?;
    let domains = DomainRegistry::default_swedish_news();
    let mut query_config = config.clone();
    query_config.max_query_terms = query_config.max_query_terms.max(limit);
    let orchestrator = SearchOrchestrator::new(store, domains, query_config);

    let query_with_limit = format!("{query} limit={limit}");
    let outcome = orchestrator.search(&query_with_limit)?;

    println!("{} result(s) ({} total, {}ms{})", outcome.results.len(), outcome.total, outcome.execution_time.as_millis(), if outcome.cached { ", cached" } else { "" });
    for result in &outcome.results {
        println!("{:>3}. {} — {}", result.rank + 1, result.title, result.url);
        println!("     {}", result.snippet);
    }
    Ok(())
}

fn run_stats(config: &Config) -> Result<(), SearchError> {
    let store = SqliteStore::open(&config.db_path)?;
    let index = InvertedIndex::new(store);
    let stats = index.stats()?;
    println!("documents:        {}", stats.total_docs);
    println!("avg doc length:   {:.1}", stats.avg_doc_length);
    println!("terms indexed:    {}", stats.term_count);
    Ok(())
}

fn run_sweep(config: &Config, strict: bool) -> Result<(), SearchError> {
    let store = SqliteStore::open(&config.db_path)?;
    let removed = consistency::sweep(&store, strict)?;
    println!("removed {removed} dangling posting(s)");
    Ok(())
}

fn run_check(url: &str, domains_path: Option<&str>) -> Result<(), SearchError> {
    let domains = load_domains(domains_path)?;
    match domains.check_allowed(url) {
        Ok(()) => println!("allowed: {url}"),
        Err(e) => println!("rejected: {e}"),
    }
    Ok(())
}

fn run_suggest(config: &Config, prefix: &str, limit: usize) -> Result<(), SearchError> {
    let store = SqliteStore::open(&config.db_path)?;
    let index = InvertedIndex::new(store);
    for term in index.suggest_prefix(prefix, limit)? {
        println!("{term}");
    }
    Ok(())
}

fn run_related(config: &Config, page_id: u64, limit: usize) -> Result<(), SearchError> {
    let store = SqliteStore::open(&config.db_path)?;
    let index = InvertedIndex::new(store);
    for term in index.related_terms(PageId::from(page_id), limit)? {
        println!("{term}");
    }
    Ok(())
}
