//! HTTP bridge between sites.
//!
//! Each remote site is reached through one bridge endpoint. Commands are
//! posted as JSON; nothing is retried, a failed send is reported to the
//! caller and ends the transfer.

use super::protocol::{
    BackupResponse, CommandEnvelope, CommandReply, XSiteTransferCommand, ENDPOINT_STATE_REQUEST,
    ENDPOINT_XSITE_PUSH,
};
use super::types::BackupTarget;
use super::BackupTransport;
use crate::error::{XSiteError, XSiteResult};
use crate::statetransfer::command::ReplicableCommand;

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub struct HttpBackupTransport {
    site_endpoints: DashMap<String, SocketAddr>,
    http_client: reqwest::Client,
}

impl HttpBackupTransport {
    pub fn new(site_endpoints: HashMap<String, SocketAddr>) -> Self {
        Self {
            site_endpoints: site_endpoints.into_iter().collect(),
            http_client: reqwest::Client::new(),
        }
    }

    fn push_url(&self, site: &str) -> XSiteResult<String> {
        let endpoint = self
            .site_endpoints
            .get(site)
            .map(|entry| *entry.value())
            .ok_or_else(|| XSiteError::Transport {
                site: site.to_string(),
                reason: "no bridge endpoint known for site".to_string(),
            })?;
        Ok(format!("http://{}{}", endpoint, ENDPOINT_XSITE_PUSH))
    }
}

#[async_trait]
impl BackupTransport for HttpBackupTransport {
    async fn backup_remotely(
        &self,
        target: &BackupTarget,
        command: XSiteTransferCommand,
    ) -> XSiteResult<BackupResponse> {
        let url = self.push_url(&target.site)?;

        if !target.sync {
            let client = self.http_client.clone();
            let site = target.site.clone();
            let timeout = target.timeout;
            tokio::spawn(async move {
                if let Err(e) = post_command(&client, &url, &command, &site, timeout).await {
                    tracing::warn!("Asynchronous push to site {} failed: {}", site, e);
                }
            });
            return Ok(BackupResponse::Queued);
        }

        post_command(&self.http_client, &url, &command, &target.site, target.timeout).await?;
        Ok(BackupResponse::Acknowledged)
    }
}

async fn post_command(
    client: &reqwest::Client,
    url: &str,
    command: &XSiteTransferCommand,
    site: &str,
    timeout: Duration,
) -> XSiteResult<()> {
    let response = client
        .post(url)
        .json(command)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify(e, site, timeout))?;

    if !response.status().is_success() {
        return Err(XSiteError::Transport {
            site: site.to_string(),
            reason: format!("push rejected with status {}", response.status()),
        });
    }

    Ok(())
}

/// Asks the node at `node` to run `command`, typically a state request.
///
/// Used when the coordinator for the cache lives on a different node than
/// the one that received the resync request.
pub async fn send_state_request(
    client: &reqwest::Client,
    node: SocketAddr,
    command: &ReplicableCommand,
    timeout: Duration,
) -> XSiteResult<CommandReply> {
    let envelope: CommandEnvelope = command.to_envelope()?;
    let url = format!("http://{}{}", node, ENDPOINT_STATE_REQUEST);
    let target = node.to_string();

    let response = client
        .post(url)
        .json(&envelope)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify(e, &target, timeout))?;

    let reply: CommandReply = response.json().await.map_err(|e| XSiteError::Transport {
        site: target.clone(),
        reason: e.to_string(),
    })?;

    Ok(reply)
}

fn classify(err: reqwest::Error, site: &str, timeout: Duration) -> XSiteError {
    if err.is_timeout() {
        XSiteError::Timeout {
            site: site.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        XSiteError::Transport {
            site: site.to_string(),
            reason: err.to_string(),
        }
    }
}
