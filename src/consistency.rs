//! Index consistency sweep.
//!
//! A page and its postings are written together in one transaction
//! (`index::store::SqliteStore::upsert_page_with_postings`), so under
//! normal operation nothing here ever has work to do. This exists for the
//! cases outside that guarantee: a manually edited database, a process
//! killed between the schema's `ON DELETE CASCADE` triggers and an
//! in-flight write, or a future maintenance command that deletes pages
//! directly. Surfacing a nonzero sweep count as `SearchError::IndexCorrupt`
//! lets an operator notice before it silently skews corpus statistics.

use crate::error::{Result, SearchError};
use crate::index::IndexStore;

/// Remove postings that reference a term or page no longer present.
/// Returns `Ok(n)` with the number of rows removed, or `Err` wrapping
/// `IndexCorrupt` if `fail_on_findings` is set and `n > 0` — callers doing
/// a routine background sweep pass `false` and just log the count;
/// callers verifying integrity before a release pass `true`.
pub fn sweep(store: &impl IndexStore, fail_on_findings: bool) -> Result<usize> {
    let removed = store.delete_orphan_postings()?;
    if removed > 0 && fail_on_findings {
        return Err(SearchError::IndexCorrupt {
            detail: format!("{removed} dangling posting(s) removed"),
        });
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SqliteStore;

    #[test]
    fn clean_index_sweeps_to_zero() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(sweep(&store, true).unwrap(), 0);
    }
}
