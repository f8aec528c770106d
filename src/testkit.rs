//! Shared test doubles.

use crate::error::{XSiteError, XSiteResult};
use crate::topology::hash::ConsistentHash;
use crate::topology::types::{Address, SegmentId};
use crate::transport::protocol::{
    BackupResponse, ENDPOINT_XSITE_PUSH, XSiteTransferCommand, XSiteTransferKind,
};
use crate::transport::types::BackupTarget;
use crate::transport::BackupTransport;

use async_trait::async_trait;
use axum::{Json, Router, http::StatusCode, routing::post};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builds a key that `SegmentPrefixHash` places in `segment`.
pub fn segment_key(segment: SegmentId, n: usize) -> String {
    format!("s{}:{}", segment, n)
}

/// Consistent hash whose segment is encoded in the key prefix (`s<segment>:`).
pub struct SegmentPrefixHash {
    num_segments: u32,
    owners: HashMap<Address, BTreeSet<SegmentId>>,
}

impl SegmentPrefixHash {
    pub fn new(num_segments: u32) -> Self {
        Self {
            num_segments,
            owners: HashMap::new(),
        }
    }

    pub fn with_owner(mut self, owner: &Address, segments: &[SegmentId]) -> Self {
        self.owners
            .insert(owner.clone(), segments.iter().copied().collect());
        self
    }

    pub fn segment_of_key(&self, key: &str) -> SegmentId {
        key.strip_prefix('s')
            .and_then(|rest| rest.split(':').next())
            .and_then(|segment| segment.parse::<u32>().ok())
            .map(|segment| segment % self.num_segments)
            .unwrap_or(0)
    }
}

impl ConsistentHash for SegmentPrefixHash {
    fn num_segments(&self) -> u32 {
        self.num_segments
    }

    fn segment_of(&self, key: &str) -> SegmentId {
        self.segment_of_key(key)
    }

    fn segments_for_owner(&self, owner: &Address) -> BTreeSet<SegmentId> {
        self.owners.get(owner).cloned().unwrap_or_default()
    }
}

/// How the recording transport answers one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Ack,
    Fail(String),
    /// Sleeps before acknowledging, long enough to trip a timeout.
    Stall(Duration),
    Panic(String),
}

/// Transport that records every command and answers from a script.
///
/// Calls beyond the script are acknowledged.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, XSiteTransferCommand)>>,
    script: Mutex<Vec<Reply>>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(replies: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(replies),
            ..Self::default()
        }
    }

    /// Delays every acknowledged call, keeping transfers observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<(String, XSiteTransferCommand)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl BackupTransport for RecordingTransport {
    async fn backup_remotely(
        &self,
        target: &BackupTarget,
        command: XSiteTransferCommand,
    ) -> XSiteResult<BackupResponse> {
        let reply = {
            let mut script = self.script.lock();
            if script.is_empty() {
                Reply::Ack
            } else {
                script.remove(0)
            }
        };

        match reply {
            Reply::Ack => {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.sent.lock().push((target.site.clone(), command));
                Ok(BackupResponse::Acknowledged)
            }
            Reply::Fail(reason) => Err(XSiteError::Transport {
                site: target.site.clone(),
                reason,
            }),
            Reply::Panic(message) => panic!("{}", message),
            Reply::Stall(duration) => {
                tokio::time::sleep(duration).await;
                self.sent.lock().push((target.site.clone(), command));
                Ok(BackupResponse::Acknowledged)
            }
        }
    }
}

/// Push endpoint of a backup site, served on an ephemeral local port.
///
/// Records `tx` for a transaction batch and `chunk<index>` for an entry chunk
/// once the request has been handled.
pub struct BackupSite {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
}

impl BackupSite {
    pub async fn spawn(tx_delay: Duration, chunk_delay: Duration, status: StatusCode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let seen = received.clone();

        let app = Router::new().route(
            ENDPOINT_XSITE_PUSH,
            post(move |Json(command): Json<XSiteTransferCommand>| {
                let seen = seen.clone();
                async move {
                    let label = match command.kind {
                        XSiteTransferKind::TransactionsTransferred { .. } => {
                            tokio::time::sleep(tx_delay).await;
                            "tx".to_string()
                        }
                        XSiteTransferKind::StateChunk { chunk_index, .. } => {
                            tokio::time::sleep(chunk_delay).await;
                            format!("chunk{}", chunk_index)
                        }
                    };
                    seen.lock().push(label);
                    status
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind backup site");
        let addr = listener.local_addr().expect("backup site address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("backup site server");
        });

        Self { addr, received }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Polls until `count` pushes were handled or `deadline` elapses.
    pub async fn wait_for(&self, count: usize, deadline: Duration) -> Vec<String> {
        let started = Instant::now();
        while self.received.lock().len() < count && started.elapsed() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.received()
    }
}
