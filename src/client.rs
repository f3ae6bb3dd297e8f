//! Contract for the stores the reconciler talks to.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::lock::Locker;
use crate::record::Record;

/// A store that can only fetch and replace whole zones.
#[async_trait]
pub trait Client: Send + Sync {
    /// Return every record of `zone`.
    ///
    /// Records may be returned generic; the reconciler parses them.
    async fn fetch(&self, zone: &str, cancel: &CancellationToken) -> Result<Vec<Record>>;

    /// Replace every record of `zone` with `records`.
    ///
    /// Return the stored records when the API echoes them, or `None` to make
    /// the reconciler fetch the zone again. Return
    /// [`Error::Conflict`](crate::Error::Conflict) when the zone changed since
    /// the last fetch; the whole attempt is then retried.
    async fn submit(
        &self,
        zone: &str,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Record>>>;

    /// Lock held around the fetch and submit of every write attempt.
    fn locker(&self) -> Option<&dyn Locker> {
        None
    }
}

/// A client that can also enumerate the zones it manages.
#[async_trait]
pub trait ZoneAwareClient: Client {
    /// Names of the managed domains, with or without a trailing dot.
    async fn domains(&self, cancel: &CancellationToken) -> Result<Vec<String>>;
}
