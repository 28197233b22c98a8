//! Shared fixtures for the cross-crate tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;
use ul_core::error::FetchError;
use ul_core::models::{Birth, Name, Picture, ProfileRecord};
use ul_core::traits::ProfileGateway;

pub type Reply = Result<Vec<ProfileRecord>, FetchError>;

pub fn record(first: &str, last: &str) -> ProfileRecord {
    ProfileRecord {
        name: Name {
            title: "Mr".into(),
            first: first.into(),
            last: last.into(),
        },
        dob: Birth::from_json(r#"{"date": "1988-11-30T22:15:00.500Z", "age": 35}"#)
            .expect("fixture date is valid"),
        picture: Picture {
            large: format!("https://randomuser.me/api/portraits/men/{first}.jpg"),
            medium: format!("https://randomuser.me/api/portraits/med/men/{first}.jpg"),
            thumbnail: format!("https://randomuser.me/api/portraits/thumb/men/{first}.jpg"),
        },
    }
}

/// A randomuser-style response body for the given first names.
pub fn envelope(firsts: &[&str]) -> serde_json::Value {
    let results: Vec<_> = firsts
        .iter()
        .map(|first| {
            serde_json::json!({
                "gender": "male",
                "name": { "title": "Mr", "first": first, "last": "Lefebvre" },
                "dob": { "date": "1975-03-08T04:05:06.007Z", "age": 49 },
                "picture": {
                    "large": format!("https://randomuser.me/api/portraits/men/{first}.jpg"),
                    "medium": format!("https://randomuser.me/api/portraits/med/men/{first}.jpg"),
                    "thumbnail": format!("https://randomuser.me/api/portraits/thumb/men/{first}.jpg")
                }
            })
        })
        .collect();
    serde_json::json!({ "results": results, "info": { "results": firsts.len() } })
}

/// Gateway whose calls wait until the test releases them, in call order.
#[derive(Default)]
pub struct GatedGateway {
    calls: AtomicUsize,
    gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
}

impl GatedGateway {
    /// Queues a gate for the next call and returns its release handle.
    pub fn arm(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("gates poisoned").push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileGateway for GatedGateway {
    async fn fetch_profiles(&self, _quantity: usize) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gates
            .lock()
            .expect("gates poisoned")
            .pop_front()
            .expect("no gate armed");
        match gate.await {
            Ok(reply) => reply,
            Err(_) => Err(FetchError::Unexpected("gate dropped".into())),
        }
    }
}
