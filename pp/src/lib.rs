//! Pingpong - relay-driven pixel grid fill
//!
//! Two peers, "ping" and "pong", take turns advancing the fill of an M x N
//! grid. Each round selects a strategy from the grid size, reports the delta
//! to a single progress authority and hands the next request to the other
//! peer, until every cell is painted.
//!
//! # Modules
//!
//! - [`grid`] - Dimensions, positions, colors
//! - [`progress`] - The authoritative progress store (actor)
//! - [`strategy`] - Size-based strategy selection and the fill strategies
//! - [`relay`] - Round driver, peer links and the error taxonomy
//! - [`server`] - HTTP surface
//! - [`client`] - HTTP client for operator commands
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod grid;
pub mod progress;
pub mod relay;
pub mod server;
pub mod strategy;

// Re-export commonly used types
pub use client::PingPongClient;
pub use config::{Config, RelayConfig, ServerConfig};
pub use grid::{BatchCell, GridDimensions, InvalidDimensions, Pixel, Position, Rgb};
pub use progress::{
    ColorValidation, ExportedImage, ProgressError, ProgressEvent, ProgressStatus, ProgressStore, ReportOutcome, RunInfo,
    validate_unique_colors,
};
pub use relay::{
    FillRequest, HttpAuthority, HttpPeer, Peer, PeerLink, ProgressAuthority, RelayCoordinator, RelayError,
    RoundStatus, RoundSummary,
};
pub use server::{AppState, create_router, serve};
pub use strategy::{FillPayload, FillStrategy, NoStrategy, ProgressReport, Produced, select};
