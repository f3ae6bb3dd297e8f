//! Zone enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ZoneAwareClient;
use crate::error::Result;
use crate::reconcile::Reconciler;

/// A zone managed by the store, always fully qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name ending with the root label, e.g. `example.com.`.
    pub name: String,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Append the root label when `name` lacks it.
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

impl<C: ZoneAwareClient> Reconciler<C> {
    /// Every zone the client manages, with trailing dots.
    pub async fn list_zones(&self, cancel: &CancellationToken) -> Result<Vec<Zone>> {
        let _guard = self.read_lock(cancel).await?;
        let domains = self.client().domains(cancel).await?;
        debug!(zones = domains.len(), "listed zones");

        Ok(domains
            .iter()
            .map(|domain| Zone {
                name: fqdn(domain),
            })
            .collect())
    }
}
