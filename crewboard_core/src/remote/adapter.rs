use std::cell::RefCell;
use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

use super::envelope::Envelope;
use super::{Action, Payload};

/// Delivers one encoded request to the remote endpoint and returns the raw
/// response envelope. The endpoint itself is a black box; embedders supply
/// the transport.
pub trait Transport {
    async fn send(&self, request: &EncodedRequest) -> Result<Value, TransportFailure>;
}

/// The transport could not complete the load at all, as opposed to the
/// endpoint answering with a failure envelope.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failed: {0}")]
    Transport(#[from] TransportFailure),
    #[error("remote error: {0}")]
    Remote(String),
}

/// A request reduced to the endpoint's query-string contract: flat key/value
/// pairs, with object- and array-valued payload fields embedded as JSON text.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub endpoint: String,
    pub action: &'static str,
    /// One-time response slot name; unique among requests in flight.
    pub callback: String,
    pub query: Vec<(String, String)>,
}

impl EncodedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }
}

/// Single asynchronous, timeout-bounded call pattern against the remote
/// endpoint, with success/failure framing decoded from the response envelope.
pub struct RemoteAdapter<T: Transport> {
    transport: T,
    endpoint: String,
    timeout: Duration,
    /// Callback slots of requests currently in flight. A slot is claimed
    /// before the transport sees the request and released on every exit path,
    /// including timeout.
    in_flight: RefCell<HashSet<String>>,
}

impl<T: Transport> RemoteAdapter<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        RemoteAdapter {
            transport,
            endpoint: config.endpoint.clone(),
            timeout: config.call_timeout,
            in_flight: RefCell::new(HashSet::new()),
        }
    }

    /// Issues `action` with `payload` and resolves with the `data` field of
    /// the response envelope.
    pub async fn call(&self, action: Action, payload: Payload) -> Result<Value, AdapterError> {
        let callback = self.claim_callback();
        let request = self.encode(action, &callback, payload);
        debug!(action = action.wire_name(), callback = %callback, "remote call");

        let outcome = tokio::time::timeout(self.timeout, self.transport.send(&request)).await;
        self.release_callback(&callback);

        match outcome {
            Err(_elapsed) => Err(AdapterError::Timeout),
            Ok(Err(failure)) => Err(AdapterError::Transport(failure)),
            Ok(Ok(raw)) => Envelope::parse(raw).into_data(),
        }
    }

    fn claim_callback(&self) -> String {
        let mut in_flight = self.in_flight.borrow_mut();
        loop {
            let token = format!("cb_{:08x}{:08x}", rand::random::<u32>(), rand::random::<u32>());
            if in_flight.insert(token.clone()) {
                return token;
            }
        }
    }

    fn release_callback(&self, token: &str) {
        self.in_flight.borrow_mut().remove(token);
    }

    fn encode(&self, action: Action, callback: &str, payload: Payload) -> EncodedRequest {
        let mut query = vec![
            ("action".to_string(), action.wire_name().to_string()),
            ("callback".to_string(), callback.to_string()),
        ];
        for (key, value) in payload {
            let encoded = match value {
                Value::String(text) => text,
                compound @ (Value::Object(_) | Value::Array(_)) => compound.to_string(),
                scalar => scalar.to_string(),
            };
            query.push((key, encoded));
        }
        EncodedRequest {
            endpoint: self.endpoint.clone(),
            action: action.wire_name(),
            callback: callback.to_string(),
            query,
        }
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }
}
