//! Shared test infrastructure for reconciler integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use zone_reconcile::lock::{LockGuard, Locker, SharedLocker, ZoneMutex, ZoneRwLock};
use zone_reconcile::{Client, Error, Record, Result, Rr, ZoneAwareClient};

// --- Constants ---

pub const ZONE: &str = "example.com.";
pub const TTL: u32 = 3600;

// --- MemoryClient ---

#[derive(Default)]
struct Inner {
    zones: HashMap<String, Vec<Rr>>,
    domains: Vec<String>,
    conflicts: Vec<Vec<Rr>>,
    echo: bool,
    fetches: usize,
    submits: usize,
    fail_fetch_after: Option<usize>,
}

/// In-memory store with the contract of a whole-zone API.
///
/// Rejects snapshots containing duplicate records. Conflicts can be queued:
/// each queued conflict applies its records as a concurrent writer would and
/// fails the submit with `Error::Conflict`.
#[derive(Clone, Default)]
pub struct MemoryClient {
    inner: Arc<Mutex<Inner>>,
    locker: Option<CountingLocker>,
}

impl MemoryClient {
    /// Store that answers submits with `None`, forcing a re-fetch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that echoes the written records from submit.
    pub fn echoing() -> Self {
        let client = Self::default();
        client.inner.lock().unwrap().echo = true;
        client
    }

    /// Expose an advisory lock from the client.
    pub fn with_locker(mut self, locker: CountingLocker) -> Self {
        self.locker = Some(locker);
        self
    }

    pub fn seed(&self, zone: &str, records: &[Record]) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .zones
            .insert(zone.to_string(), records.iter().map(|r| r.rr().into_owned()).collect());
    }

    pub fn set_domains(&self, domains: &[&str]) {
        self.inner.lock().unwrap().domains = domains.iter().map(|d| d.to_string()).collect();
    }

    /// Fail the next submit with a conflict after adding `concurrent` to the zone.
    pub fn queue_conflict(&self, concurrent: &[Record]) {
        self.inner
            .lock()
            .unwrap()
            .conflicts
            .push(concurrent.iter().map(|r| r.rr().into_owned()).collect());
    }

    /// Make every fetch after the first `n` fail.
    pub fn fail_fetch_after(&self, n: usize) {
        self.inner.lock().unwrap().fail_fetch_after = Some(n);
    }

    pub fn records(&self, zone: &str) -> Vec<Record> {
        let inner = self.inner.lock().unwrap();
        inner
            .zones
            .get(zone)
            .map(|records| records.iter().cloned().map(Record::Raw).collect())
            .unwrap_or_default()
    }

    pub fn fetches(&self) -> usize {
        self.inner.lock().unwrap().fetches
    }

    pub fn submits(&self) -> usize {
        self.inner.lock().unwrap().submits
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn fetch(&self, zone: &str, _cancel: &CancellationToken) -> Result<Vec<Record>> {
        let mut inner = self.inner.lock().unwrap();
        inner.fetches += 1;
        if let Some(limit) = inner.fail_fetch_after {
            if inner.fetches > limit {
                return Err(Error::client("fetch failed"));
            }
        }
        Ok(inner
            .zones
            .get(zone)
            .map(|records| records.iter().cloned().map(Record::Raw).collect())
            .unwrap_or_default())
    }

    async fn submit(
        &self,
        zone: &str,
        records: Vec<Record>,
        _cancel: &CancellationToken,
    ) -> Result<Option<Vec<Record>>> {
        let mut inner = self.inner.lock().unwrap();
        inner.submits += 1;

        if !inner.conflicts.is_empty() {
            let concurrent = inner.conflicts.remove(0);
            inner.zones.entry(zone.to_string()).or_default().extend(concurrent);
            return Err(Error::Conflict);
        }

        let records: Vec<Rr> = records.iter().map(|r| r.rr().into_owned()).collect();
        let mut seen = HashSet::new();
        for rr in &records {
            if !seen.insert((rr.name.to_lowercase(), rr.rtype.clone(), rr.data.clone())) {
                return Err(Error::Rejected(format!("duplicate record: {rr}")));
            }
        }

        inner.zones.insert(zone.to_string(), records.clone());

        Ok(inner
            .echo
            .then(|| records.into_iter().map(Record::Raw).collect()))
    }

    fn locker(&self) -> Option<&dyn Locker> {
        self.locker.as_ref().map(|l| l as &dyn Locker)
    }
}

#[async_trait]
impl ZoneAwareClient for MemoryClient {
    async fn domains(&self, _cancel: &CancellationToken) -> Result<Vec<String>> {
        Ok(self.inner.lock().unwrap().domains.clone())
    }
}

// --- CountingLocker ---

/// Exclusive lock that counts acquisitions.
#[derive(Clone, Default)]
pub struct CountingLocker {
    mutex: ZoneMutex,
    count: Arc<AtomicUsize>,
}

impl CountingLocker {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Locker for CountingLocker {
    async fn lock(&self) -> LockGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.mutex.lock().await
    }
}

// --- RecordingLocker ---

/// Lock transitions seen by a [`RecordingLocker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    Lock,
    Unlock,
    ReadLock,
    ReadUnlock,
}

/// Reader/writer lock that records every acquisition and release.
#[derive(Clone, Default)]
pub struct RecordingLocker {
    inner: ZoneRwLock,
    events: Arc<Mutex<Vec<LockEvent>>>,
}

struct OnRelease {
    events: Arc<Mutex<Vec<LockEvent>>>,
    event: LockEvent,
}

impl Drop for OnRelease {
    fn drop(&mut self) {
        self.events.lock().unwrap().push(self.event);
    }
}

impl RecordingLocker {
    pub fn events(&self) -> Vec<LockEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, acquired: LockEvent, released: LockEvent, guard: LockGuard) -> LockGuard {
        self.events.lock().unwrap().push(acquired);
        let on_release = OnRelease {
            events: self.events.clone(),
            event: released,
        };
        LockGuard::new((on_release, guard))
    }
}

#[async_trait]
impl Locker for RecordingLocker {
    async fn lock(&self) -> LockGuard {
        let guard = Locker::lock(&self.inner).await;
        self.record(LockEvent::Lock, LockEvent::Unlock, guard)
    }
}

#[async_trait]
impl SharedLocker for RecordingLocker {
    async fn read_lock(&self) -> LockGuard {
        let guard = self.inner.read_lock().await;
        self.record(LockEvent::ReadLock, LockEvent::ReadUnlock, guard)
    }
}

// --- Record helpers ---

pub fn address(name: &str, ip: &str) -> Record {
    let ip: IpAddr = ip.parse().unwrap();
    Record::address(name, ip, TTL)
}

pub fn txt(name: &str, text: &str) -> Record {
    Record::txt(name, text, TTL)
}

/// Deletion criterion matching on name (and type, when given) only.
pub fn criterion(name: &str, rtype: &str) -> Record {
    Record::raw(name, rtype, "", 0)
}

/// Assert that `a` and `b` contain the same records, ignoring order.
pub fn assert_same_records(a: &[Record], b: &[Record]) {
    let mut a: Vec<Rr> = a.iter().map(|r| r.rr().into_owned()).collect();
    let mut b: Vec<Rr> = b.iter().map(|r| r.rr().into_owned()).collect();
    let key = |rr: &Rr| (rr.name.clone(), rr.rtype.clone(), rr.data.clone(), rr.ttl);
    a.sort_by_key(key);
    b.sort_by_key(key);
    assert_eq!(a, b);
}
