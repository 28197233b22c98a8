//! # ul-gateway-http
//!
//! `reqwest` implementation of `ProfileGateway` for randomuser-style APIs.
//! Transport failures are classified into `NetworkReason`s; there is no retry.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use ul_core::error::{FetchError, NetworkReason};
use ul_core::models::{decode_envelope, ProfileRecord};
use ul_core::traits::ProfileGateway;

#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Scheme and host, e.g. `https://randomuser.me`. The `/api/` path is appended.
    pub base_url: String,
    pub timeout: Duration,
    /// Optional `nat` filter, e.g. `fr`.
    pub nationality: Option<String>,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://randomuser.me".to_string(),
            timeout: Duration::from_secs(30),
            nationality: None,
        }
    }
}

#[derive(Clone)]
pub struct HttpProfileGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpProfileGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/", self.config.base_url.trim_end_matches('/'))
    }

    fn query(&self, quantity: usize) -> Vec<(&'static str, String)> {
        let mut query = vec![("results", quantity.to_string())];
        if let Some(nat) = &self.config.nationality {
            query.push(("nat", nat.clone()));
        }
        query
    }
}

#[async_trait]
impl ProfileGateway for HttpProfileGateway {
    async fn fetch_profiles(&self, quantity: usize) -> Result<Vec<ProfileRecord>, FetchError> {
        let url = self.endpoint();
        tracing::debug!(%url, quantity, "requesting profiles");

        let response = self
            .client
            .get(&url)
            .query(&self.query(quantity))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "profile endpoint returned an error status");
            return Err(NetworkReason::Other(format!("server responded with status {status}")).into());
        }

        let body = response.bytes().await.map_err(classify)?;
        let records = decode_envelope(&body)?;
        tracing::debug!(count = records.len(), "decoded profile page");
        Ok(records)
    }
}

/// Maps a transport failure onto the fixed set of network reasons.
pub fn classify(err: reqwest::Error) -> FetchError {
    let reason = if err.is_timeout() {
        NetworkReason::TimedOut
    } else {
        match io_error_kind(&err) {
            Some(io::ErrorKind::NetworkUnreachable | io::ErrorKind::NetworkDown) => {
                NetworkReason::Offline
            }
            Some(io::ErrorKind::TimedOut) => NetworkReason::TimedOut,
            Some(
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof,
            ) => NetworkReason::ConnectionLost,
            _ if err.is_connect() => NetworkReason::HostUnreachable,
            _ => NetworkReason::Other(describe(&err)),
        }
    };
    FetchError::Network(reason)
}

fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = current.source();
    }
    None
}

/// The error plus its causes, `reqwest`'s own message being rather terse.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
