//! C1: Domain Registry.
//!
//! Loaded once at startup from a declarative list of host records and
//! immutable thereafter (§5 "Shared resource policy"). A host matches the
//! registry if it equals a registered host exactly or is a subdomain of one
//! — `resolve` walks the label suffixes to find the longest registered
//! match, so `nyheter.example.se` resolves against a registered
//! `example.se` entry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::error::{Result, SearchError};
use crate::types::DomainEntry;

/// Accepts both the flat-list and category-keyed JSON shapes at the loader
/// layer, as called for in `SPEC_FULL.md` §9.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DomainList {
    Flat(Vec<DomainRecord>),
    Categorized(HashMap<String, Vec<DomainRecord>>),
}

/// On-disk representation of one registry entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainRecord {
    pub host: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_trust")]
    pub trust_score: f64,
    #[serde(default)]
    pub path_hints: Vec<String>,
    #[serde(default)]
    pub search_endpoint_template: Option<String>,
    #[serde(default = "default_cadence_secs")]
    pub crawl_cadence_secs: u64,
}

fn default_trust() -> f64 {
    0.5
}

fn default_cadence_secs() -> u64 {
    24 * 3600
}

/// The immutable whitelist the crawler and ranker consult.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    entries: HashMap<String, DomainEntry>,
}

/// Threshold above which consecutive fetch failures mark a domain erroring
/// and push its next crawl out by its cadence (`SPEC_FULL.md` §7).
pub const ERROR_THRESHOLD: u32 = 5;

impl DomainRegistry {
    /// Build a registry from a parsed `DomainList`.
    pub fn from_list(list: DomainList) -> Self {
        let records: Vec<DomainRecord> = match list {
            DomainList::Flat(records) => records,
            DomainList::Categorized(map) => {
                let mut out = Vec::new();
                for (category, mut records) in map {
                    for record in &mut records {
                        if record.category.is_empty() {
                            record.category = category.clone();
                        }
                    }
                    out.extend(records);
                }
                out
            }
        };

        let mut entries = HashMap::new();
        for record in records {
            let host = record.host.to_ascii_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
            let mut entry = DomainEntry::new(host.clone(), record.category, record.trust_score);
            entry.path_hints = record.path_hints;
            entry.search_endpoint_template = record.search_endpoint_template;
            entry.crawl_cadence = std::time::Duration::from_secs(record.crawl_cadence_secs);
            entries.insert(host, entry);
        }
        DomainRegistry { entries }
    }

    /// A conservative built-in whitelist installed when no registry file is
    /// present, so the system degrades gracefully instead of failing open to
    /// the entire web (§4.1).
    pub fn default_swedish_news() -> Self {
        let seeds = [
            ("svt.se", "news", 0.95),
            ("dn.se", "news", 0.9),
            ("aftonbladet.se", "news", 0.8),
            ("sverigesradio.se", "news", 0.9),
            ("smhi.se", "government", 0.95),
        ];
        let mut entries = HashMap::new();
        for (host, category, trust) in seeds {
            entries.insert(host.to_string(), DomainEntry::new(host, category, trust));
        }
        DomainRegistry { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a host against the registry: exact match first, then the
    /// longest registered suffix (so `nyheter.dn.se` matches `dn.se`).
    pub fn resolve(&self, host: &str) -> Option<&DomainEntry> {
        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if let Some(entry) = self.entries.get(host) {
            return Some(entry);
        }
        let labels: Vec<&str> = host.split('.').collect();
        for start in 1..labels.len() {
            let suffix = labels[start..].join(".");
            if let Some(entry) = self.entries.get(&suffix) {
                return Some(entry);
            }
        }
        None
    }

    /// Whether a URL is accepted for crawl or direct navigation: its host
    /// must resolve against the registry and the matched entry must be
    /// active.
    pub fn is_allowed(&self, url: &str) -> bool {
        match canonical::host_of(url) {
            Some(host) => self.resolve(&host).is_some_and(|e| e.active),
            None => false,
        }
    }

    /// Trust score for a host: the registered value, or 0.5 for an
    /// unknown-but-allowed host matched only by suffix (§4.1).
    pub fn trust_score(&self, host: &str) -> f64 {
        self.resolve(host).map_or(0.5, |e| e.trust_score)
    }

    /// Validate a direct-navigation URL, surfacing `DomainNotAllowed` with
    /// a few sample registered hosts instead of a bare bool when rejected.
    pub fn check_allowed(&self, url: &str) -> Result<()> {
        if self.is_allowed(url) {
            return Ok(());
        }
        Err(SearchError::DomainNotAllowed {
            host: canonical::host_of(url).unwrap_or_default(),
            sample_hosts: self.sample_hosts(5),
        })
    }

    pub fn path_hints(&self, host: &str) -> Vec<String> {
        self.resolve(host).map(|e| e.path_hints.clone()).unwrap_or_default()
    }

    /// Build a search URL for a host's declared search-endpoint template,
    /// substituting `{query}` with the (URL-encoded) query text.
    pub fn endpoint_for(&self, host: &str, query: &str) -> Option<String> {
        let entry = self.resolve(host)?;
        let template = entry.search_endpoint_template.as_ref()?;
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        Some(template.replace("{query}", &encoded))
    }

    /// The first few registered hosts, used in `SearchError::DomainNotAllowed`
    /// diagnostics.
    pub fn sample_hosts(&self, limit: usize) -> Vec<String> {
        let mut hosts: Vec<String> = self.entries.keys().cloned().collect();
        hosts.sort();
        hosts.truncate(limit);
        hosts
    }

    /// Record a fetch failure against a host: bump `error_count`, and above
    /// `ERROR_THRESHOLD` flip the domain inactive and push `next_ready` out
    /// by its cadence (`SPEC_FULL.md` §7).
    pub fn record_failure(&mut self, host: &str, now: std::time::SystemTime) {
        if let Some(entry) = self.entries.get_mut(host) {
            entry.error_count += 1;
            if entry.error_count >= ERROR_THRESHOLD {
                entry.active = false;
                entry.next_ready = now + entry.crawl_cadence;
            }
        }
    }

    /// Record a fetch success: reset the error counter.
    pub fn record_success(&mut self, host: &str) {
        if let Some(entry) = self.entries.get_mut(host) {
            entry.error_count = 0;
        }
    }
}
