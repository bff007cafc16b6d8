//! RelayCoordinator - drives one round for one peer
//!
//! A round reads the authority, applies the strategy, reports the delta
//! (best-effort) and forwards the next request to the opposite peer. The
//! coordinator keeps no state between rounds.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::grid::{GridDimensions, Pixel};
use crate::progress::{ProgressStatus, ReportOutcome};
use crate::strategy::{FillPayload, FillStrategy, ProgressReport, StepInput, StepOutcome, select};

use super::authority::ProgressAuthority;
use super::error::RelayError;
use super::messages::{FillRequest, Peer, RoundSummary};
use super::peer::PeerLink;

/// Default bound on a forward call
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a progress report
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Round driver for one peer endpoint
#[derive(Clone)]
pub struct RelayCoordinator {
    peer: Peer,
    authority: Arc<dyn ProgressAuthority>,
    link: Arc<dyn PeerLink>,
    report_timeout: Duration,
    forward_timeout: Duration,
}

impl RelayCoordinator {
    pub fn new(peer: Peer, authority: Arc<dyn ProgressAuthority>, link: Arc<dyn PeerLink>) -> Self {
        Self {
            peer,
            authority,
            link,
            report_timeout: DEFAULT_REPORT_TIMEOUT,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, report_timeout: Duration, forward_timeout: Duration) -> Self {
        self.report_timeout = report_timeout;
        self.forward_timeout = forward_timeout;
        self
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    /// Start a run: the first round on this peer for the authority's current grid
    pub async fn kick_off(&self) -> Result<RoundSummary, RelayError> {
        debug!(peer = %self.peer, "kick_off: called");
        let status = self.read_status().await?;
        let request = FillRequest::kick_off(u64::from(status.m), u64::from(status.n), status.run_id);
        info!(run_id = %status.run_id, m = status.m, n = status.n, "Starting fill run");
        self.run_round(request).await
    }

    /// Run one round for an inbound request
    pub async fn run_round(&self, request: FillRequest) -> Result<RoundSummary, RelayError> {
        debug!(peer = %self.peer, m = request.m, n = request.n, "run_round: called");

        let dims = GridDimensions::new(request.m, request.n).map_err(|e| RelayError::Configuration(e.to_string()))?;
        let total_pixels = dims.total_pixels();
        let selected = select(total_pixels)?;
        let strategy = match &request.fill {
            Some(payload) if payload.strategy() != selected => {
                return Err(RelayError::StrategyMismatch {
                    tagged: payload.strategy(),
                    selected,
                    total_pixels,
                });
            }
            Some(payload) => payload.strategy(),
            None => selected,
        };

        let status = self.read_status().await?;
        check_run(&request, &dims, &status)?;
        if status.done {
            info!(peer = %self.peer, run_id = %status.run_id, "Grid already complete");
            return Ok(RoundSummary::done(self.peer, strategy));
        }

        // A sparse kick-off resumes from whatever the authority already holds
        let seeded;
        let image: &[Pixel] = match &request.fill {
            Some(FillPayload::Small { image }) => image,
            None if strategy == FillStrategy::Small => {
                seeded = self.read_image().await?;
                &seeded
            }
            _ => &[],
        };
        let input = StepInput {
            dims,
            image,
            cursor: if strategy.reads_cursor() { status.cursor_index() } else { None },
        };
        // ThreadRng is not Send; keep it out of scope across awaits
        let outcome = {
            let mut rng = rand::rng();
            strategy.apply(input, &mut rng)
        };

        let step = match outcome {
            StepOutcome::Done => {
                info!(peer = %self.peer, run_id = %status.run_id, "Grid complete, ending chain");
                return Ok(RoundSummary::done(self.peer, strategy));
            }
            StepOutcome::Step(step) => step,
        };

        self.report(step.report).await;

        let next = FillRequest {
            m: request.m,
            n: request.n,
            run_id: Some(status.run_id),
            fill: Some(step.forward),
        };
        self.forward(&next).await?;

        Ok(RoundSummary::advanced(self.peer, strategy, step.produced))
    }

    async fn read_status(&self) -> Result<ProgressStatus, RelayError> {
        match timeout(self.report_timeout, self.authority.status()).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::Authority(format!(
                "status read timed out after {:?}",
                self.report_timeout
            ))),
        }
    }

    async fn read_image(&self) -> Result<Vec<Pixel>, RelayError> {
        match timeout(self.report_timeout, self.authority.export_image()).await {
            Ok(result) => result.map(|exported| exported.image),
            Err(_) => Err(RelayError::Authority(format!(
                "image read timed out after {:?}",
                self.report_timeout
            ))),
        }
    }

    /// Report a delta; failures are logged and dropped
    async fn report(&self, report: ProgressReport) {
        debug!(peer = %self.peer, ?report, "report: called");
        let result = match timeout(self.report_timeout, self.authority.report(report)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::ProgressReport(format!(
                "timed out after {:?}",
                self.report_timeout
            ))),
        };

        match result {
            Ok(ReportOutcome::OutOfBounds { position }) => {
                let err = RelayError::OutOfBounds {
                    x: position.x(),
                    y: position.y(),
                };
                warn!(peer = %self.peer, %err, "Report made no change");
            }
            Ok(outcome) if !outcome.is_mutation() => {
                debug!(peer = %self.peer, ?outcome, "report: no mutation");
            }
            Ok(_) => {}
            Err(err) => warn!(peer = %self.peer, %err, "Progress report dropped"),
        }
    }

    async fn forward(&self, request: &FillRequest) -> Result<(), RelayError> {
        let to = self.peer.opposite();
        debug!(from = %self.peer, %to, "forward: called");
        match timeout(self.forward_timeout, self.link.forward(to, request)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::RelayTimeout {
                peer: to,
                message: format!("timed out after {:?}", self.forward_timeout),
            }),
        }
    }
}

/// Reject requests produced for a different grid or an earlier run
fn check_run(request: &FillRequest, dims: &GridDimensions, status: &ProgressStatus) -> Result<(), RelayError> {
    if !status.matches(dims) {
        return Err(RelayError::DimensionMismatch {
            expected_m: status.m,
            expected_n: status.n,
            actual_m: dims.m(),
            actual_n: dims.n(),
        });
    }
    match request.run_id {
        Some(run_id) if run_id != status.run_id => Err(RelayError::StaleRun {
            request: run_id,
            current: status.run_id,
        }),
        _ => Ok(()),
    }
}
