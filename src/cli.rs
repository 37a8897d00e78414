use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "norrsok", about = "Domain-restricted vertical search engine for Swedish web sources", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file; falls back to built-in defaults when absent.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl registered domains and populate the index.
    Crawl {
        /// Path to a domain list (JSON), falling back to the built-in Swedish news set.
        #[arg(long)]
        domains: Option<String>,

        /// Stop after this many pages have been fetched.
        #[arg(long, default_value_t = 100)]
        max_pages: usize,
    },

    /// Run a single search query against the index and print results.
    Search {
        query: String,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print corpus statistics (document count, average length, term count).
    Stats,

    /// Sweep the index for dangling postings and report what was found.
    Sweep {
        /// Exit non-zero if any dangling postings were found.
        #[arg(long)]
        strict: bool,
    },

    /// Check whether a URL is allowed by the domain registry.
    Check {
        url: String,

        /// Path to a domain list (JSON), falling back to the built-in Swedish news set.
        #[arg(long)]
        domains: Option<String>,
    },

    /// Print term-dictionary completions for a query prefix.
    Suggest {
        prefix: String,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the top related terms for an already-indexed page.
    Related {
        page_id: u64,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}
