//! Error types returned by the core.
//!
//! One enum per §7 of the design: every fallible operation in the crate
//! returns `Result<T, SearchError>` rather than panicking or raising an
//! exception for control flow. Variants are hand-written (no `thiserror`)
//! in the same style as the invariant errors this codebase already uses
//! elsewhere — a `Display` impl plus a blanket `std::error::Error` impl.

use std::fmt;

/// Every error kind the core can surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A direct-navigation URL whose host is not in the registry.
    DomainNotAllowed {
        host: String,
        sample_hosts: Vec<String>,
    },
    /// A fetch exceeded its deadline.
    FetchTimeout { url: String },
    /// A fetch failed below the HTTP layer (DNS, connect, TLS, ...).
    FetchTransport { url: String, detail: String },
    /// A fetch completed but the server returned a non-success status.
    FetchHttp { url: String, status: u16 },
    /// A fetch completed but the body could not be parsed as a page.
    FetchParse { url: String, detail: String },
    /// A query string did not parse into a valid `SearchQuery`.
    QueryInvalid { reason: String },
    /// The index has a dangling term/page reference, discovered by a sweep.
    IndexCorrupt { detail: String },
    /// A configuration file failed to parse or had unknown keys.
    Config { detail: String },
    /// The persistence layer failed (open, read, write, migrate).
    Storage { detail: String },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::DomainNotAllowed { host, sample_hosts } => {
                write!(
                    f,
                    "domain '{}' is not on the whitelist (registered hosts include: {})",
                    host,
                    sample_hosts.join(", ")
                )
            }
            SearchError::FetchTimeout { url } => write!(f, "fetch timed out: {}", url),
            SearchError::FetchTransport { url, detail } => {
                write!(f, "fetch transport error for {}: {}", url, detail)
            }
            SearchError::FetchHttp { url, status } => {
                write!(f, "fetch {} returned HTTP {}", url, status)
            }
            SearchError::FetchParse { url, detail } => {
                write!(f, "failed to parse page body for {}: {}", url, detail)
            }
            SearchError::QueryInvalid { reason } => write!(f, "invalid query: {}", reason),
            SearchError::IndexCorrupt { detail } => write!(f, "index corrupt: {}", detail),
            SearchError::Config { detail } => write!(f, "configuration error: {}", detail),
            SearchError::Storage { detail } => write!(f, "storage error: {}", detail),
        }
    }
}

impl std::error::Error for SearchError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
