//! Reconciler: locking, retries and the attempt that ties fetch, plan and
//! submit together.
//!
//! ```text
//! lock ─▶ fetch ─▶ plan ─▶ submit ─▶ unlock ─▶ (read lock ─▶ re-fetch) ─▶ result
//!                            │
//!                            └─ Conflict ─▶ start over with a fresh snapshot
//! ```

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::append::Append;
use crate::change_list::{ChangeList, ChangeState};
use crate::client::Client;
use crate::delete::Delete;
use crate::error::{Error, Result};
use crate::lock::{self, LockGuard, ZoneLock};
use crate::metrics::{self, OperationResult, Timer};
use crate::record::{normalize, normalize_criteria, Record, RecordParser, StandardParser};
use crate::retry::RetryPolicy;
use crate::set::Set;

/// One of the write algorithms.
pub(crate) trait Operation: Sync {
    /// Name used in logs and metrics.
    const NAME: &'static str;

    /// Change list turning `existing` into the desired snapshot.
    fn plan(&self, existing: &[Record]) -> ChangeList;

    /// Records the caller should see as affected.
    fn affected(&self, existing: &[Record], current: &[Record]) -> Vec<Record>;
}

/// Applies append, set and delete requests to a whole-zone store.
pub struct Reconciler<C> {
    client: C,
    lock: Option<ZoneLock>,
    policy: RetryPolicy,
    parser: Arc<dyn RecordParser>,
}

impl<C: Client> Reconciler<C> {
    /// Create a reconciler without caller lock, retrying conflicts forever.
    pub fn new(client: C) -> Self {
        Self {
            client,
            lock: None,
            policy: RetryPolicy::default(),
            parser: Arc::new(StandardParser),
        }
    }

    /// Serialize every operation through `lock`.
    pub fn with_lock(mut self, lock: ZoneLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Replace the conflict retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the parser used to type fetched records.
    pub fn with_parser(mut self, parser: impl RecordParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// The wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The caller-supplied lock, if any.
    pub fn zone_lock(&self) -> Option<&ZoneLock> {
        self.lock.as_ref()
    }

    /// Every record of `zone`, typed where possible.
    pub async fn get_records(&self, zone: &str, cancel: &CancellationToken) -> Result<Vec<Record>> {
        let _guard = self.read_lock(cancel).await?;
        self.fetch(zone, cancel).await
    }

    /// Add `records` to `zone` and return the records that were created.
    ///
    /// Existing records are never changed. Duplicates are not filtered; the
    /// store is expected to reject them.
    pub async fn append_records(
        &self,
        zone: &str,
        records: &[Record],
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>> {
        let records = normalize(records.to_vec(), self.parser.as_ref())?;
        self.run(zone, Append { records: &records }, cancel).await
    }

    /// Replace the records sharing name and type with `records` and return
    /// the records that are new or changed.
    pub async fn set_records(
        &self,
        zone: &str,
        records: &[Record],
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>> {
        let records = normalize(records.to_vec(), self.parser.as_ref())?;
        self.run(zone, Set { records: &records }, cancel).await
    }

    /// Remove every record matched by `criteria` and return what was removed.
    pub async fn delete_records(
        &self,
        zone: &str,
        criteria: &[Record],
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>> {
        let criteria = normalize_criteria(criteria.to_vec(), self.parser.as_ref())?;
        self.run(zone, Delete { criteria: &criteria }, cancel).await
    }

    async fn run<O: Operation>(
        &self,
        zone: &str,
        op: O,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>> {
        let timer = Timer::start();
        let op = &op;

        let result = self
            .policy
            .run(O::NAME, cancel, move || self.attempt(zone, op, cancel))
            .await;

        match &result {
            Ok(records) => {
                metrics::record_operation(O::NAME, OperationResult::Success, timer.elapsed());
                metrics::record_affected(O::NAME, records.len());
            }
            Err(Error::Cancelled) => {
                metrics::record_operation(O::NAME, OperationResult::Cancelled, timer.elapsed());
            }
            Err(_) => {
                metrics::record_operation(O::NAME, OperationResult::Error, timer.elapsed());
            }
        }

        result
    }

    async fn attempt<O: Operation>(
        &self,
        zone: &str,
        op: &O,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>> {
        let guard = self.write_lock(cancel).await?;
        let client_guard = match self.client.locker() {
            Some(locker) => Some(lock::acquire(locker.lock(), cancel).await?),
            None => None,
        };

        let existing = self.fetch(zone, cancel).await?;
        let changes = op.plan(&existing);

        if !changes.has_changes() {
            debug!(zone, op = O::NAME, records = existing.len(), "nothing to change");
            metrics::record_short_circuit(O::NAME);
            return Ok(Vec::new());
        }

        debug!(
            zone,
            op = O::NAME,
            keep = changes.count(ChangeState::NoChange),
            create = changes.count(ChangeState::Create),
            delete = changes.count(ChangeState::Delete),
            "submitting change list"
        );

        let response = self
            .client
            .submit(zone, changes.apply_list(), cancel)
            .await?;

        drop(client_guard);
        drop(guard);

        let current = match response {
            Some(records) => normalize(records, self.parser.as_ref())?,
            None => {
                let _guard = self.read_lock(cancel).await?;
                self.fetch(zone, cancel).await?
            }
        };

        let affected = op.affected(&existing, &current);
        debug!(zone, op = O::NAME, affected = affected.len(), "zone updated");

        Ok(affected)
    }

    async fn fetch(&self, zone: &str, cancel: &CancellationToken) -> Result<Vec<Record>> {
        let records = self.client.fetch(zone, cancel).await?;
        Ok(normalize(records, self.parser.as_ref())?)
    }

    async fn write_lock(&self, cancel: &CancellationToken) -> Result<Option<LockGuard>> {
        match &self.lock {
            Some(lock) => lock.lock(cancel).await.map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn read_lock(&self, cancel: &CancellationToken) -> Result<Option<LockGuard>> {
        match &self.lock {
            Some(lock) => lock.read(cancel).await.map(Some),
            None => Ok(None),
        }
    }
}
