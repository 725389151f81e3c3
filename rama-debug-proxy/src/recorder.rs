//! Bounded in-memory log of proxied requests (spec.md §4.6).
//!
//! Grounded on spec.md §5 ("The Recorder's ring buffer is a hotspot; a
//! single lock or equivalent serialization protects it") — one
//! [`parking_lot::Mutex`] around a [`VecDeque`], oldest entry evicted once
//! capacity is exceeded.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::model::{RequestId, RequestRecord};

/// Default ring-buffer capacity, matching [`crate::config::ProxyConfig`]'s
/// `max_request_records` default.
pub const DEFAULT_CAPACITY: usize = 2000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecorderQuery<'a> {
    pub method: Option<&'a str>,
    pub host_contains: Option<&'a str>,
    pub status: Option<u16>,
    pub url_contains: Option<&'a str>,
}

struct Inner {
    capacity: usize,
    records: VecDeque<RequestRecord>,
}

impl Inner {
    fn position(&self, id: RequestId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn evict_if_over_capacity(&mut self) {
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }
}

/// The Request Recorder: a bounded, append-and-update log of every request
/// that has passed (or attempted to pass) through the proxy.
///
/// Insertion and update share one entry point, [`Recorder::insert_or_update`]:
/// inserting a record whose id already exists overwrites it in place,
/// matching the lifecycle in spec.md §4.6 (create → flow decision →
/// response + duration, all sharing one id).
#[derive(Debug)]
pub struct Recorder {
    inner: Mutex<Inner>,
}

impl Recorder {
    /// Create a recorder with the default capacity ([`DEFAULT_CAPACITY`]).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a recorder with an explicit capacity.
    ///
    /// A capacity of `0` is treated as `1`: the Recorder always keeps at
    /// least the most recent record, so callers never observe insert
    /// silently discarding the very record they just inserted.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                records: VecDeque::with_capacity(capacity.min(4096)),
            }),
        }
    }

    /// Insert a new record, or overwrite the existing record sharing its id.
    ///
    /// Overwriting preserves the record's position in iteration order (it
    /// does not get bumped to the front), so `list()` ordering reflects
    /// when a request first arrived, not when it was last updated.
    pub fn insert_or_update(&self, record: RequestRecord) {
        let mut inner = self.inner.lock();
        match inner.position(record.id) {
            Some(idx) => inner.records[idx] = record,
            None => {
                inner.records.push_back(record);
                inner.evict_if_over_capacity();
            }
        }
    }

    /// Look up a single record by id.
    #[must_use]
    pub fn get(&self, id: RequestId) -> Option<RequestRecord> {
        let inner = self.inner.lock();
        inner.records.iter().find(|r| r.id == id).cloned()
    }

    /// List all records, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<RequestRecord> {
        let inner = self.inner.lock();
        inner.records.iter().rev().cloned().collect()
    }

    /// Number of records currently retained.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// List records matching every `Some` field of `query`, newest first.
    ///
    /// `method` and `status` match exactly; `host_contains` and
    /// `url_contains` match case-insensitive substrings of the request's
    /// host and full URL respectively. An entirely empty query returns
    /// every record, equivalent to [`Recorder::list`].
    #[must_use]
    pub fn query(&self, query: RecorderQuery<'_>) -> Vec<RequestRecord> {
        let inner = self.inner.lock();
        inner
            .records
            .iter()
            .rev()
            .filter(|record| matches(record, &query))
            .cloned()
            .collect()
    }

    /// Discard every retained record.
    pub fn clear(&self) {
        self.inner.lock().records.clear();
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(record: &RequestRecord, query: &RecorderQuery<'_>) -> bool {
    if let Some(method) = query.method
        && !record.request.method.eq_ignore_ascii_case(method)
    {
        return false;
    }
    if let Some(host) = query.host_contains {
        let record_host = record.request.host().unwrap_or_default();
        if !record_host
            .to_ascii_lowercase()
            .contains(&host.to_ascii_lowercase())
        {
            return false;
        }
    }
    if let Some(status) = query.status
        && record.response.as_ref().map(|r| r.status) != Some(status)
    {
        return false;
    }
    if let Some(needle) = query.url_contains
        && !record
            .request
            .url
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    {
        return false;
    }
    true
}
