//! HTTP bridge to the game client: `POST <base>/action` with a JSON body.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::analysis::MeldKind;
use crate::core::decision::MeldCall;
use crate::core::tile::Tile;
use crate::io::channel::{ActionChannel, DispatchError};

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire action codes.
pub mod codes {
    pub const MELD_SEQUENCE: u8 = 1;
    pub const MELD_TRIPLET: u8 = 2;
    pub const MELD_QUAD: u8 = 3;
    pub const RIICHI: u8 = 4;
    pub const AGARI: u8 = 5;
    /// Pass; discards are also sent through this code.
    pub const PASS: u8 = 6;
}

pub fn meld_code(kind: MeldKind) -> u8 {
    match kind {
        MeldKind::Sequence => codes::MELD_SEQUENCE,
        MeldKind::Triplet => codes::MELD_TRIPLET,
        MeldKind::Quad => codes::MELD_QUAD,
    }
}

/// Request body. `tile` and `combination` are omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRequest {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination: Option<String>,
    pub pass: bool,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl ActionRequest {
    fn bare(kind: u8, timestamp: i64) -> Self {
        Self {
            kind,
            tile: None,
            combination: None,
            pass: false,
            timestamp,
        }
    }

    pub fn discard(tile: Tile, timestamp: i64) -> Self {
        Self {
            tile: Some(tile.to_string()),
            ..Self::bare(codes::PASS, timestamp)
        }
    }

    pub fn meld(call: &MeldCall, timestamp: i64) -> Self {
        Self {
            tile: Some(call.tile.to_string()),
            combination: Some(format_combination(&call.combination)),
            ..Self::bare(meld_code(call.kind), timestamp)
        }
    }

    pub fn riichi(timestamp: i64) -> Self {
        Self::bare(codes::RIICHI, timestamp)
    }

    pub fn agari(timestamp: i64) -> Self {
        Self::bare(codes::AGARI, timestamp)
    }

    pub fn pass(timestamp: i64) -> Self {
        Self {
            pass: true,
            ..Self::bare(codes::PASS, timestamp)
        }
    }
}

/// `1m|2m|3m`
pub fn format_combination(tiles: &[Tile]) -> String {
    tiles
        .iter()
        .map(Tile::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Channel that posts each action to a game client bridge.
#[derive(Debug, Clone)]
pub struct HttpActionChannel {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl HttpActionChannel {
    /// `base_url` without the `/action` suffix, e.g. `http://127.0.0.1:12121`.
    ///
    /// The bridge runs next to the game client, so proxy settings from the
    /// environment are ignored.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(DispatchError::Transport)?;
        Ok(Self {
            endpoint: format!("{}/action", base_url.trim_end_matches('/')),
            timeout,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint, kind = request.kind))]
    fn send(&self, request: &ActionRequest) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(request).map_err(DispatchError::Serialization)?;
        debug!(bytes = body.len(), "posting action");
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    warn!(timeout = ?self.timeout, "action request timed out");
                    DispatchError::Timeout(self.timeout)
                } else {
                    warn!(err = %err, "action request failed");
                    DispatchError::Transport(err)
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "action rejected");
            return Err(DispatchError::Status {
                code: status.as_u16(),
            });
        }
        debug!(status = status.as_u16(), "action accepted");
        Ok(())
    }
}

impl ActionChannel for HttpActionChannel {
    fn discard(&self, tile: Tile) -> Result<(), DispatchError> {
        self.send(&ActionRequest::discard(tile, now_millis()))
    }

    fn meld(&self, call: &MeldCall) -> Result<(), DispatchError> {
        self.send(&ActionRequest::meld(call, now_millis()))
    }

    fn riichi(&self) -> Result<(), DispatchError> {
        self.send(&ActionRequest::riichi(now_millis()))
    }

    fn agari(&self) -> Result<(), DispatchError> {
        self.send(&ActionRequest::agari(now_millis()))
    }

    fn pass(&self) -> Result<(), DispatchError> {
        self.send(&ActionRequest::pass(now_millis()))
    }
}
