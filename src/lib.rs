//! `norrsok` — a domain-restricted vertical search engine over a curated
//! whitelist of Swedish web sources.
//!
//! The crate is organized by component, each corresponding to one of the
//! system's named responsibilities: a domain whitelist (`domain`), a
//! politeness-aware crawl frontier (`frontier`), a fetcher pool
//! (`fetch`), a Swedish-aware text analysis chain (`analysis`), a
//! persistent inverted index (`index`), a BM25 scorer (`scoring`), a
//! multi-factor ranker (`ranker`), a query parser (`query`), an LRU+TTL
//! result cache (`cache`), and the orchestrator (`orchestrator`) that
//! wires all of the above into a single `search` call. `api` defines the
//! external JSON shapes; no HTTP listener lives in this crate.

pub mod analysis;
pub mod analytics;
pub mod api;
pub mod cache;
pub mod canonical;
pub mod config;
pub mod consistency;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod index;
pub mod orchestrator;
pub mod query;
pub mod ranker;
pub mod scoring;
pub mod snippet;
pub mod types;

pub use config::Config;
pub use error::{Result, SearchError};
pub use orchestrator::{SearchOrchestrator, SearchOutcome};
