//! Messages exchanged between the two peers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::strategy::{FillPayload, FillStrategy, Produced};

/// One of the two relay endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Peer {
    Ping,
    Pong,
}

impl Peer {
    /// The peer this one forwards to
    pub fn opposite(&self) -> Self {
        match self {
            Peer::Ping => Peer::Pong,
            Peer::Pong => Peer::Ping,
        }
    }

    /// URL path segment of this peer's endpoint
    pub fn path(&self) -> &'static str {
        match self {
            Peer::Ping => "ping",
            Peer::Pong => "pong",
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Body of `POST /ping/` and `POST /pong/`
///
/// The initial kick carries only `m` and `n`; forwarded requests also carry
/// the run they belong to and the strategy-tagged fill payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRequest {
    pub m: u64,
    pub n: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillPayload>,
}

impl FillRequest {
    /// A request that starts a run from scratch
    pub fn kick_off(m: u64, n: u64, run_id: Uuid) -> Self {
        Self {
            m,
            n,
            run_id: Some(run_id),
            fill: None,
        }
    }
}

/// Outcome status of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    PixelAdded,
    BatchAdded,
    Done,
}

/// Immediate response to whoever started a round
///
/// Describes what this round produced; it never waits for the opposite
/// peer's round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub peer: Peer,
    pub status: RoundStatus,
    pub strategy: FillStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_to: Option<Peer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced: Option<Produced>,
}

impl RoundSummary {
    pub fn done(peer: Peer, strategy: FillStrategy) -> Self {
        Self {
            peer,
            status: RoundStatus::Done,
            strategy,
            forwarded_to: None,
            produced: None,
        }
    }

    pub fn advanced(peer: Peer, strategy: FillStrategy, produced: Produced) -> Self {
        let status = match produced {
            Produced::LargeBatchSequential { .. } => RoundStatus::BatchAdded,
            _ => RoundStatus::PixelAdded,
        };
        Self {
            peer,
            status,
            strategy,
            forwarded_to: Some(peer.opposite()),
            produced: Some(produced),
        }
    }
}

/// Acknowledgement returned by a peer endpoint before it runs its round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {
    pub status: String,
    pub peer: Peer,
}

impl Accepted {
    pub fn new(peer: Peer) -> Self {
        Self {
            status: "accepted".to_string(),
            peer,
        }
    }
}
