//! Ping/pong relay
//!
//! Both peers run the same [`RelayCoordinator`], differing only in which side
//! they forward to. The authority and the opposite peer are reached through
//! the [`ProgressAuthority`] and [`PeerLink`] traits so a round can run against
//! the in-process store, over HTTP, or against test doubles.

mod authority;
mod coordinator;
mod error;
mod messages;
mod peer;

pub use authority::{HttpAuthority, ProgressAuthority};
pub use coordinator::{DEFAULT_FORWARD_TIMEOUT, DEFAULT_REPORT_TIMEOUT, RelayCoordinator};
pub use error::RelayError;
pub use messages::{Accepted, FillRequest, Peer, RoundStatus, RoundSummary};
pub use peer::{HttpPeer, PeerLink};
