use super::command::{CommandContext, CommandResponse, ReplicableCommand};
use crate::error::XSiteError;
use crate::transport::protocol::{
    CancelResponse, CommandEnvelope, CommandReply, PushResponse, TransferStatusResponse,
    XSiteTransferCommand, XSiteTransferKind,
};

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

/// Maps the error taxonomy onto HTTP status codes.
pub fn status_code(err: &XSiteError) -> StatusCode {
    match err {
        XSiteError::NoTopology(_) => StatusCode::SERVICE_UNAVAILABLE,
        XSiteError::TransferInProgress(_) => StatusCode::CONFLICT,
        XSiteError::BackupNotConfigured(_) | XSiteError::UnknownCache(_) => StatusCode::NOT_FOUND,
        XSiteError::UnknownCommandType(_)
        | XSiteError::InvalidArgument(_)
        | XSiteError::Codec(_) => StatusCode::BAD_REQUEST,
        XSiteError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        XSiteError::Transport { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Errors that reject a well-formed request rather than report a failure.
pub fn is_rejection(err: &XSiteError) -> bool {
    matches!(
        err,
        XSiteError::NoTopology(_)
            | XSiteError::TransferInProgress(_)
            | XSiteError::BackupNotConfigured(_)
            | XSiteError::UnknownCache(_)
            | XSiteError::InvalidArgument(_)
    )
}

pub async fn handle_state_request(
    Extension(ctx): Extension<Arc<CommandContext>>,
    Json(envelope): Json<CommandEnvelope>,
) -> (StatusCode, Json<CommandReply>) {
    let result = ReplicableCommand::from_envelope(&envelope).and_then(|command| {
        tracing::debug!("Performing {}", command);
        command.perform(&ctx)
    });

    match result {
        Ok(CommandResponse::Successful(transfer)) => (
            StatusCode::OK,
            Json(CommandReply {
                success: true,
                transfer,
                error: None,
            }),
        ),
        Err(e) => {
            if is_rejection(&e) {
                tracing::warn!("State request command {} rejected: {}", envelope.command_id, e);
            } else {
                tracing::error!("State request command {} failed: {}", envelope.command_id, e);
            }
            (
                status_code(&e),
                Json(CommandReply {
                    success: false,
                    transfer: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_transfer_status(
    Extension(ctx): Extension<Arc<CommandContext>>,
) -> (StatusCode, Json<TransferStatusResponse>) {
    let providers = ctx.providers();
    let in_progress = providers
        .iter()
        .any(|provider| provider.is_transfer_in_progress());
    let transfers = providers
        .iter()
        .flat_map(|provider| provider.transfers())
        .collect();

    (
        StatusCode::OK,
        Json(TransferStatusResponse {
            in_progress,
            transfers,
        }),
    )
}

pub async fn handle_cancel_transfer(
    Extension(ctx): Extension<Arc<CommandContext>>,
    Path(site): Path<String>,
) -> (StatusCode, Json<CancelResponse>) {
    let cancelled = ctx
        .providers()
        .iter()
        .fold(false, |any, provider| provider.cancel_transfer(&site) || any);

    if cancelled {
        tracing::info!("Cancellation requested for transfers to site {}", site);
        (StatusCode::OK, Json(CancelResponse { cancelled }))
    } else {
        (StatusCode::NOT_FOUND, Json(CancelResponse { cancelled }))
    }
}

/// Receives pushed state on a backup site.
///
/// Applying the state to the local container is left to the inbound side;
/// this only acknowledges and logs what arrived.
pub async fn handle_push(
    Json(command): Json<XSiteTransferCommand>,
) -> (StatusCode, Json<PushResponse>) {
    match &command.kind {
        XSiteTransferKind::TransactionsTransferred { transactions } => {
            tracing::info!(
                "Received {} transaction(s) for cache {} from {}",
                transactions.len(),
                command.cache_name,
                command.origin
            );
        }
        XSiteTransferKind::StateChunk { chunk_index, .. } => {
            tracing::debug!(
                "Received chunk {} ({} entries) for cache {} from {}",
                chunk_index,
                command.entry_count(),
                command.cache_name,
                command.origin
            );
        }
    }

    (StatusCode::OK, Json(PushResponse { accepted: true }))
}
