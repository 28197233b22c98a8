//! # Core Traits (Ports)
//!
//! Any profile source must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::ProfileRecord;

/// Retrieves batches of randomly generated profiles.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Fetches `quantity` new records. Timeouts are the gateway's concern
    /// and surface as [`NetworkReason::TimedOut`](crate::error::NetworkReason).
    async fn fetch_profiles(&self, quantity: usize) -> Result<Vec<ProfileRecord>, FetchError>;
}
