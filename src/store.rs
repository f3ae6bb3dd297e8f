//! File-backed zone store.
//!
//! Each zone lives in `<dir>/<zone>.json`:
//!
//! ```json
//! { "revision": 3, "records": [ { "name": "www", "type": "A", "data": "192.0.2.1", "ttl": 300 } ] }
//! ```
//!
//! Every write bumps the revision. The first fetch after a submit (or after
//! the client lock was taken) sets the baseline revision for the zone, and
//! the next submit answers [`Error::Conflict`] when the file has moved on
//! since. Later fetches do not move the baseline, so a read landing between
//! an attempt's fetch and submit cannot hide a foreign write.
//!
//! The compare and the write run under `<zone>.json.lock`, created
//! exclusively, so writers in other processes are serialized too. A writer
//! finding the lock file answers [`Error::Conflict`]; a lock file older than
//! [`STALE_LOCK`] is left over from a crashed writer and is removed.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{Client, ZoneAwareClient};
use crate::error::{Error, Result};
use crate::lock::{LockGuard, Locker, ZoneMutex};
use crate::record::{Record, Rr};

const EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "json.lock";

/// Age after which a zone lock file is considered abandoned.
pub const STALE_LOCK: Duration = Duration::from_secs(30);

type Baselines = Arc<Mutex<HashMap<String, u64>>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ZoneFile {
    revision: u64,
    records: Vec<Rr>,
}

/// In-process client lock. Baselines are reset when it is taken and again
/// before it is released.
#[derive(Debug, Default)]
struct FileLocker {
    mutex: ZoneMutex,
    baselines: Baselines,
}

struct ResetBaselines(Baselines);

impl Drop for ResetBaselines {
    fn drop(&mut self) {
        self.0.lock().clear();
    }
}

#[async_trait]
impl Locker for FileLocker {
    async fn lock(&self) -> LockGuard {
        let guard = self.mutex.lock().await;
        self.baselines.lock().clear();
        // tuple fields drop in order: baselines are reset before the mutex opens
        LockGuard::new((ResetBaselines(self.baselines.clone()), guard))
    }
}

/// Exclusive `<zone>.json.lock` file, removed on drop.
struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove zone lock file");
        }
    }
}

async fn is_stale(path: &Path) -> bool {
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified
            .elapsed()
            .map(|age| age > STALE_LOCK)
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Zone store keeping one JSON file per zone in a directory.
#[derive(Debug)]
pub struct FileClient {
    dir: PathBuf,
    locker: FileLocker,
}

impl FileClient {
    /// Store zones under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locker: FileLocker::default(),
        }
    }

    /// Directory holding the zone files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `zone`.
    pub fn zone_path(&self, zone: &str) -> PathBuf {
        let name = zone.trim_end_matches('.');
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    async fn read(&self, zone: &str) -> Result<ZoneFile> {
        match tokio::fs::read(self.zone_path(zone)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ZoneFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock file guarding writes to `zone`.
    pub fn lock_path(&self, zone: &str) -> PathBuf {
        self.zone_path(zone).with_extension(LOCK_EXTENSION)
    }

    async fn write_lock(&self, zone: &str) -> Result<WriteLock> {
        let path = self.lock_path(zone);
        tokio::fs::create_dir_all(&self.dir).await?;

        for _ in 0..2 {
            let created = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match created {
                Ok(_) => return Ok(WriteLock { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !is_stale(&path).await {
                        debug!(zone, path = %path.display(), "zone file locked by another writer");
                        return Err(Error::Conflict);
                    }
                    warn!(zone, path = %path.display(), "removing stale zone lock file");
                    match tokio::fs::remove_file(&path).await {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Conflict)
    }

    async fn write(&self, zone: &str, file: &ZoneFile) -> Result<()> {
        let path = self.zone_path(zone);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(file)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }
}

/// First record that appears twice, compared case-insensitively by name.
fn find_duplicate(records: &[Rr]) -> Option<&Rr> {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().find(|rr| {
        !seen.insert((
            rr.name.to_ascii_lowercase(),
            rr.rtype.as_str(),
            rr.data.as_str(),
        ))
    })
}

#[async_trait]
impl Client for FileClient {
    async fn fetch(&self, zone: &str, _cancel: &CancellationToken) -> Result<Vec<Record>> {
        let file = self.read(zone).await?;
        self.locker
            .baselines
            .lock()
            .entry(zone.to_string())
            .or_insert(file.revision);

        debug!(zone, revision = file.revision, records = file.records.len(), "read zone file");
        Ok(file.records.into_iter().map(Record::Raw).collect())
    }

    async fn submit(
        &self,
        zone: &str,
        records: Vec<Record>,
        _cancel: &CancellationToken,
    ) -> Result<Option<Vec<Record>>> {
        let expected = self.locker.baselines.lock().remove(zone);
        let records: Vec<Rr> = records.iter().map(|r| r.rr().into_owned()).collect();

        if let Some(duplicate) = find_duplicate(&records) {
            return Err(Error::Rejected(format!("duplicate record: {duplicate}")));
        }

        let _write = self.write_lock(zone).await?;
        let current = self.read(zone).await?;
        if expected != Some(current.revision) {
            debug!(zone, ?expected, actual = current.revision, "zone file changed since fetch");
            return Err(Error::Conflict);
        }

        let file = ZoneFile {
            revision: current.revision + 1,
            records,
        };
        self.write(zone, &file).await?;

        debug!(zone, revision = file.revision, records = file.records.len(), "wrote zone file");
        Ok(Some(file.records.into_iter().map(Record::Raw).collect()))
    }

    fn locker(&self) -> Option<&dyn Locker> {
        Some(&self.locker)
    }
}

#[async_trait]
impl ZoneAwareClient for FileClient {
    async fn domains(&self, _cancel: &CancellationToken) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut domains = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                domains.push(stem.to_string());
            }
        }
        domains.sort();

        Ok(domains)
    }
}
