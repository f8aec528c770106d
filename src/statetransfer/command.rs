//! Replicable commands for cross-site state transfer.
//!
//! A command travels as a stable command id byte followed by its ordered
//! parameter tuple. Decoding dispatches on the id, so adding a command means
//! adding a variant to `ReplicableCommand`.
//!
//! `XSiteStateRequestCommand` parameters, in order:
//! `(type ordinal, origin, cache name, destination site, source site)`.
//! The source site comes last so the first four keep their historical
//! positions; a four-element tuple decodes with an empty source site.

use super::provider::XSiteStateProvider;
use super::types::TransferSummary;
use crate::error::{XSiteError, XSiteResult};
use crate::topology::types::Address;
use crate::transport::protocol::CommandEnvelope;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const XSITE_STATE_REQUEST_COMMAND_ID: u8 = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StateRequestType {
    StartXSiteStateTransfer,
}

impl StateRequestType {
    const VALUES: [StateRequestType; 1] = [StateRequestType::StartXSiteStateTransfer];

    pub fn ordinal(self) -> u8 {
        match self {
            StateRequestType::StartXSiteStateTransfer => 0,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> XSiteResult<Self> {
        Self::VALUES
            .get(ordinal as usize)
            .copied()
            .ok_or_else(|| XSiteError::UnknownCommandType(format!("type ordinal {}", ordinal)))
    }
}

/// One element of a command's parameter tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandParameter {
    Byte(u8),
    Address(Address),
    Str(String),
}

/// Result of performing a command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandResponse {
    Successful(Option<TransferSummary>),
}

/// Node-wide view the commands are performed against: one provider per cache.
#[derive(Default)]
pub struct CommandContext {
    providers: DashMap<String, Arc<XSiteStateProvider>>,
}

impl CommandContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, provider: Arc<XSiteStateProvider>) {
        tracing::info!("Registered cross-site provider for cache {}", provider.cache_name());
        self.providers
            .insert(provider.cache_name().to_string(), provider);
    }

    pub fn provider(&self, cache_name: &str) -> XSiteResult<Arc<XSiteStateProvider>> {
        self.providers
            .get(cache_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| XSiteError::UnknownCache(cache_name.to_string()))
    }

    pub fn providers(&self) -> Vec<Arc<XSiteStateProvider>> {
        self.providers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// Asks a node's provider to start pushing a cache to a remote site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XSiteStateRequestCommand {
    request_type: StateRequestType,
    destination_site_name: String,
    source_site_name: String,
    cache_name: String,
    origin: Address,
}

impl XSiteStateRequestCommand {
    pub fn new(
        destination_site_name: &str,
        source_site_name: &str,
        cache_name: &str,
        origin: Address,
        request_type: StateRequestType,
    ) -> Self {
        Self {
            request_type,
            destination_site_name: destination_site_name.to_string(),
            source_site_name: source_site_name.to_string(),
            cache_name: cache_name.to_string(),
            origin,
        }
    }

    pub fn request_type(&self) -> StateRequestType {
        self.request_type
    }

    pub fn destination_site_name(&self) -> &str {
        &self.destination_site_name
    }

    pub fn source_site_name(&self) -> &str {
        &self.source_site_name
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn origin(&self) -> &Address {
        &self.origin
    }

    pub fn set_origin(&mut self, origin: Address) {
        self.origin = origin;
    }

    pub fn parameters(&self) -> Vec<CommandParameter> {
        vec![
            CommandParameter::Byte(self.request_type.ordinal()),
            CommandParameter::Address(self.origin.clone()),
            CommandParameter::Str(self.cache_name.clone()),
            CommandParameter::Str(self.destination_site_name.clone()),
            CommandParameter::Str(self.source_site_name.clone()),
        ]
    }

    pub fn from_parameters(parameters: Vec<CommandParameter>) -> XSiteResult<Self> {
        let mut params = parameters.into_iter();

        let request_type = match params.next() {
            Some(CommandParameter::Byte(ordinal)) => StateRequestType::from_ordinal(ordinal)?,
            other => return Err(malformed("type ordinal", other)),
        };
        let origin = match params.next() {
            Some(CommandParameter::Address(origin)) => origin,
            other => return Err(malformed("origin", other)),
        };
        let cache_name = match params.next() {
            Some(CommandParameter::Str(name)) => name,
            other => return Err(malformed("cache name", other)),
        };
        let destination_site_name = match params.next() {
            Some(CommandParameter::Str(name)) => name,
            other => return Err(malformed("destination site", other)),
        };
        let source_site_name = match params.next() {
            Some(CommandParameter::Str(name)) => name,
            None => String::new(),
            other => return Err(malformed("source site", other)),
        };
        if let Some(extra) = params.next() {
            return Err(XSiteError::Codec(format!(
                "unexpected trailing parameter {:?}",
                extra
            )));
        }

        Ok(Self {
            request_type,
            destination_site_name,
            source_site_name,
            cache_name,
            origin,
        })
    }

    /// Dispatches the request to the provider of the command's cache.
    pub fn perform(&self, ctx: &CommandContext) -> XSiteResult<CommandResponse> {
        let span = tracing::debug_span!("xsite_state_request", cache = %self.cache_name);
        let _guard = span.enter();

        match self.request_type {
            StateRequestType::StartXSiteStateTransfer => {
                let provider = ctx.provider(&self.cache_name)?;
                let handle =
                    provider.start_transfer(&self.source_site_name, &self.cache_name, &self.origin)?;
                Ok(CommandResponse::Successful(Some(handle.summary())))
            }
        }
    }
}

impl fmt::Display for XSiteStateRequestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "XSiteStateRequestCommand {{ type: {:?}, cache: {}, destination_site: {}, origin: {}, source_site: {} }}",
            self.request_type,
            self.cache_name,
            self.destination_site_name,
            self.origin,
            self.source_site_name
        )
    }
}

fn malformed(field: &str, found: Option<CommandParameter>) -> XSiteError {
    XSiteError::Codec(format!("expected {} parameter, found {:?}", field, found))
}

/// Commands understood by the dispatcher, keyed by command id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicableCommand {
    XSiteStateRequest(XSiteStateRequestCommand),
}

impl ReplicableCommand {
    pub fn command_id(&self) -> u8 {
        match self {
            ReplicableCommand::XSiteStateRequest(_) => XSITE_STATE_REQUEST_COMMAND_ID,
        }
    }

    pub fn parameters(&self) -> Vec<CommandParameter> {
        match self {
            ReplicableCommand::XSiteStateRequest(command) => command.parameters(),
        }
    }

    pub fn from_parameters(command_id: u8, parameters: Vec<CommandParameter>) -> XSiteResult<Self> {
        match command_id {
            XSITE_STATE_REQUEST_COMMAND_ID => Ok(ReplicableCommand::XSiteStateRequest(
                XSiteStateRequestCommand::from_parameters(parameters)?,
            )),
            other => Err(XSiteError::UnknownCommandType(format!("command id {}", other))),
        }
    }

    /// Callers do not wait for a value; the response exists for uniformity.
    pub fn is_return_value_expected(&self) -> bool {
        false
    }

    pub fn perform(&self, ctx: &CommandContext) -> XSiteResult<CommandResponse> {
        match self {
            ReplicableCommand::XSiteStateRequest(command) => command.perform(ctx),
        }
    }

    /// Compact frame: `(command_id, parameters)`.
    pub fn encode(&self) -> XSiteResult<Vec<u8>> {
        Ok(bincode::serialize(&(self.command_id(), self.parameters()))?)
    }

    pub fn decode(bytes: &[u8]) -> XSiteResult<Self> {
        let (command_id, parameters): (u8, Vec<CommandParameter>) = bincode::deserialize(bytes)?;
        Self::from_parameters(command_id, parameters)
    }

    pub fn to_envelope(&self) -> XSiteResult<CommandEnvelope> {
        Ok(CommandEnvelope {
            command_id: self.command_id(),
            parameters: bincode::serialize(&self.parameters())?,
        })
    }

    pub fn from_envelope(envelope: &CommandEnvelope) -> XSiteResult<Self> {
        let parameters: Vec<CommandParameter> = bincode::deserialize(&envelope.parameters)?;
        Self::from_parameters(envelope.command_id, parameters)
    }
}

impl fmt::Display for ReplicableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicableCommand::XSiteStateRequest(command) => write!(f, "{}", command),
        }
    }
}
