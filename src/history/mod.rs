//! Navigation history: an ordered, persisted log of visited targets.
//!
//! The log is most-recent-first and holds at most one record per URL.
//! Appending a URL that is already present moves it to the front with the
//! new record's data.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::HISTORY_KEY;
use crate::navigation::Icon;
use crate::store::{KvStore, StoreError};

/// One entry in the navigation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationRecord {
    pub id: String,
    pub title: String,
    /// Absolute http/https URL; search phrases are rewritten before a
    /// record is built.
    pub url: String,
    pub icon: Icon,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NavigationRecord {
    /// New record with a fresh id, stamped now.
    pub fn new(url: impl Into<String>, title: impl Into<String>, icon: Icon) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            url: url.into(),
            icon,
            timestamp: Utc::now(),
            keywords: None,
            category: None,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Case-insensitive match of `needle` (already lowercased) against
    /// title, url, keywords and category.
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.url.to_lowercase().contains(needle)
            || self
                .keywords
                .iter()
                .flatten()
                .any(|k| k.to_lowercase().contains(needle))
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

/// Capability to record a navigation. Resolver callers depend on this
/// instead of on a concrete store.
pub trait HistorySink {
    fn record(&mut self, record: NavigationRecord) -> Result<(), StoreError>;
}

impl HistorySink for Vec<NavigationRecord> {
    fn record(&mut self, record: NavigationRecord) -> Result<(), StoreError> {
        insert_front(self, record);
        Ok(())
    }
}

/// Move-to-front insert keeping `log` unique by url.
fn insert_front(log: &mut Vec<NavigationRecord>, record: NavigationRecord) {
    log.retain(|existing| existing.url != record.url);
    log.insert(0, record);
}

// ── HistoryStore ──────────────────────────────────────────────────

/// Persisted navigation log.
///
/// Every operation reads the whole log, changes it, and writes it back.
pub struct HistoryStore {
    kv: Rc<KvStore>,
}

impl HistoryStore {
    pub fn new(kv: Rc<KvStore>) -> Self {
        Self { kv }
    }

    /// Current log, most-recent-first. Missing or corrupt data reads as
    /// empty.
    pub fn list(&self) -> Vec<NavigationRecord> {
        self.kv.load(HISTORY_KEY).unwrap_or_default()
    }

    /// Insert `record` at the front, dropping any older record with the
    /// same url.
    pub fn append(&mut self, record: NavigationRecord) -> Result<(), StoreError> {
        let mut log = self.list();
        debug!(url = %record.url, id = %record.id, "appending history record");
        insert_front(&mut log, record);
        self.kv.save(HISTORY_KEY, &log)
    }

    /// Delete the record with `id`. Returns whether anything was removed;
    /// an unknown id is not an error.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut log = self.list();
        let before = log.len();
        log.retain(|record| record.id != id);
        if log.len() == before {
            debug!(id, "no history record to remove");
            return Ok(false);
        }
        self.kv.save(HISTORY_KEY, &log)?;
        Ok(true)
    }

    /// Empty the log.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        info!("clearing navigation history");
        self.kv.save(HISTORY_KEY, &Vec::<NavigationRecord>::new())
    }

    /// Records whose title, url, keywords or category contain `query`
    /// (case-insensitive), in log order. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<NavigationRecord> {
        let needle = query.trim().to_lowercase();
        self.list()
            .into_iter()
            .filter(|record| needle.is_empty() || record.matches(&needle))
            .collect()
    }

    /// Drop records stamped before `cutoff`. Returns how many were removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut log = self.list();
        let before = log.len();
        log.retain(|record| record.timestamp >= cutoff);
        let removed = before - log.len();
        if removed > 0 {
            info!(removed, %cutoff, "pruned history");
            self.kv.save(HISTORY_KEY, &log)?;
        }
        Ok(removed)
    }
}

impl HistorySink for HistoryStore {
    fn record(&mut self, record: NavigationRecord) -> Result<(), StoreError> {
        self.append(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> HistoryStore {
        HistoryStore::new(Rc::new(KvStore::open(None).unwrap()))
    }

    fn record(url: &str, title: &str) -> NavigationRecord {
        NavigationRecord::new(url, title, Icon::Globe)
    }

    // ── append ────────────────────────────────────────────────────

    #[test]
    fn empty_store_lists_nothing() {
        assert!(store().list().is_empty());
    }

    #[test]
    fn append_puts_newest_first() {
        let mut s = store();
        s.append(record("https://a.com/", "A")).unwrap();
        s.append(record("https://b.com/", "B")).unwrap();
        let urls: Vec<_> = s.list().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://b.com/", "https://a.com/"]);
    }

    #[test]
    fn append_same_url_twice_keeps_latest_only() {
        let mut s = store();
        s.append(record("https://u.com/", "first")).unwrap();
        let second = record("https://u.com/", "second");
        let second_id = second.id.clone();
        s.append(second).unwrap();

        let log = s.list();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, second_id);
        assert_eq!(log[0].title, "second");
    }

    #[test]
    fn append_existing_url_moves_to_front() {
        let mut s = store();
        s.append(record("https://a.com/", "A")).unwrap();
        s.append(record("https://b.com/", "B")).unwrap();
        s.append(record("https://c.com/", "C")).unwrap();
        s.append(record("https://a.com/", "A again")).unwrap();

        let log = s.list();
        let urls: Vec<_> = log.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com/", "https://c.com/", "https://b.com/"]);
        assert_eq!(log[0].title, "A again");
    }

    #[test]
    fn dedup_is_exact_string_match() {
        let mut s = store();
        s.append(record("https://a.com/", "slash")).unwrap();
        s.append(record("https://a.com/?x=1", "query")).unwrap();
        assert_eq!(s.list().len(), 2);
    }

    // ── remove / clear ────────────────────────────────────────────

    #[test]
    fn remove_existing_id() {
        let mut s = store();
        let r = record("https://a.com/", "A");
        let id = r.id.clone();
        s.append(r).unwrap();
        s.append(record("https://b.com/", "B")).unwrap();

        assert!(s.remove(&id).unwrap());
        let log = s.list();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].url, "https://b.com/");
    }

    #[test]
    fn remove_unknown_id_leaves_log_unchanged() {
        let mut s = store();
        s.append(record("https://a.com/", "A")).unwrap();
        let before = s.list();
        assert!(!s.remove("no-such-id").unwrap());
        assert_eq!(s.list(), before);
    }

    #[test]
    fn clear_empties_log() {
        let mut s = store();
        s.append(record("https://a.com/", "A")).unwrap();
        s.clear().unwrap();
        assert!(s.list().is_empty());
    }

    #[test]
    fn corrupt_log_reads_as_empty() {
        let kv = Rc::new(KvStore::open(None).unwrap());
        kv.set_raw(HISTORY_KEY, "[{\"broken\":").unwrap();
        let mut s = HistoryStore::new(kv);
        assert!(s.list().is_empty());
        s.append(record("https://a.com/", "A")).unwrap();
        assert_eq!(s.list().len(), 1);
    }

    // ── search ────────────────────────────────────────────────────

    #[test]
    fn search_matches_title_url_keywords_and_category() {
        let mut s = store();
        s.append(record("https://github.com/x", "GitHub Repository")).unwrap();
        s.append(
            record("https://www.google.com/search?q=rust%20book", "Google Search")
                .with_keywords(vec!["rust".to_string(), "book".to_string()])
                .with_category("search"),
        )
        .unwrap();
        s.append(record("https://example.com/", "Example")).unwrap();

        assert_eq!(s.search("GITHUB").len(), 1);
        assert_eq!(s.search("book").len(), 1);
        assert_eq!(s.search("search").len(), 1);
        assert_eq!(s.search("example.com")[0].title, "Example");
        assert!(s.search("nothing-here").is_empty());
        assert_eq!(s.search("  ").len(), 3);
    }

    // ── prune ─────────────────────────────────────────────────────

    #[test]
    fn prune_before_drops_old_records() {
        let mut s = store();
        let mut old = record("https://old.com/", "Old");
        old.timestamp = Utc::now() - Duration::days(10);
        s.append(old).unwrap();
        s.append(record("https://new.com/", "New")).unwrap();

        let removed = s.prune_before(Utc::now() - Duration::days(7)).unwrap();
        assert_eq!(removed, 1);
        let log = s.list();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].url, "https://new.com/");
    }

    #[test]
    fn prune_with_nothing_old_removes_nothing() {
        let mut s = store();
        s.append(record("https://new.com/", "New")).unwrap();
        assert_eq!(s.prune_before(Utc::now() - Duration::days(1)).unwrap(), 0);
        assert_eq!(s.list().len(), 1);
    }

    // ── sinks ─────────────────────────────────────────────────────

    #[test]
    fn vec_sink_dedupes_like_store() {
        let mut sink: Vec<NavigationRecord> = Vec::new();
        sink.record(record("https://a.com/", "A")).unwrap();
        sink.record(record("https://a.com/", "A2")).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].title, "A2");
    }

    #[test]
    fn record_serializes_optional_fields_only_when_set() {
        let plain = record("https://a.com/", "A");
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("keywords").is_none());
        assert!(json.get("category").is_none());
        assert_eq!(json["icon"], "globe");

        let tagged = plain.with_category("search");
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["category"], "search");
    }
}
