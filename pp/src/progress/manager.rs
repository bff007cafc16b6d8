//! ProgressStore - actor that owns the authoritative grid progress
//!
//! Every read and write is a message to a single task, so concurrent reports
//! from both peers are applied one at a time.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use crate::grid::Rgb;

use super::messages::{ProgressCommand, ProgressError, ProgressResponse};
use super::state::ProgressState;
use super::types::{ExportedImage, ProgressStatus, ReportOutcome, RunInfo};

/// Event broadcast when the run changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A new run replaced whatever was in flight
    Configured { run_id: Uuid, m: u32, n: u32 },
    /// The last cell of the run was painted
    Completed { run_id: Uuid, total_pixels: u64 },
}

/// Handle to send commands to the ProgressStore
#[derive(Clone)]
pub struct ProgressStore {
    tx: mpsc::Sender<ProgressCommand>,
    event_tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressStore {
    /// Spawn a new ProgressStore actor with no run configured
    pub fn spawn() -> Self {
        debug!("spawn: called");
        let (tx, rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(64);

        tokio::spawn(actor_loop(ProgressState::new(), rx, event_tx.clone()));

        info!("ProgressStore spawned");
        Self { tx, event_tx }
    }

    /// Subscribe to run lifecycle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ProgressEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<ProgressResponse<T>>) -> ProgressCommand,
    ) -> ProgressResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ProgressError::ChannelError)?;
        reply_rx.await.map_err(|_| ProgressError::ChannelError)?
    }

    /// Reset progress for an `m` x `n` grid
    pub async fn configure(&self, m: u64, n: u64) -> ProgressResponse<RunInfo> {
        debug!(m, n, "configure: called");
        self.request(|reply| ProgressCommand::Configure { m, n, reply }).await
    }

    /// Record one painted pixel
    pub async fn report_pixel(&self, x: u32, y: u32, color: Option<Rgb>) -> ProgressResponse<ReportOutcome> {
        debug!(x, y, ?color, "report_pixel: called");
        self.request(|reply| ProgressCommand::ReportPixel { x, y, color, reply })
            .await
    }

    /// Record a contiguous painted range `[start_index, end_index)`
    pub async fn report_range(&self, start_index: u64, end_index: u64) -> ProgressResponse<ReportOutcome> {
        debug!(start_index, end_index, "report_range: called");
        self.request(|reply| ProgressCommand::ReportRange {
            start_index,
            end_index,
            reply,
        })
        .await
    }

    pub async fn status(&self) -> ProgressResponse<ProgressStatus> {
        debug!("status: called");
        self.request(|reply| ProgressCommand::Status { reply }).await
    }

    pub async fn export_image(&self) -> ProgressResponse<ExportedImage> {
        debug!("export_image: called");
        self.request(|reply| ProgressCommand::ExportImage { reply }).await
    }

    /// Stop the actor; later calls fail with [`ProgressError::ChannelError`]
    pub async fn shutdown(&self) -> Result<(), ProgressError> {
        debug!("shutdown: called");
        self.tx
            .send(ProgressCommand::Shutdown)
            .await
            .map_err(|_| ProgressError::ChannelError)
    }
}

/// Broadcast completion if this command painted the final cell
fn announce_completion(state: &ProgressState, was_done: bool, event_tx: &broadcast::Sender<ProgressEvent>) {
    if was_done {
        return;
    }
    let Ok(status) = state.status() else {
        return;
    };
    if status.done {
        info!(run_id = %status.run_id, total_pixels = status.total_pixels, "Grid complete");
        let _ = event_tx.send(ProgressEvent::Completed {
            run_id: status.run_id,
            total_pixels: status.total_pixels,
        });
    }
}

fn is_done(state: &ProgressState) -> bool {
    state.status().map(|s| s.done).unwrap_or(false)
}

/// The actor loop that owns the ProgressState and processes commands
async fn actor_loop(
    mut state: ProgressState,
    mut rx: mpsc::Receiver<ProgressCommand>,
    event_tx: broadcast::Sender<ProgressEvent>,
) {
    debug!("ProgressStore actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            ProgressCommand::Configure { m, n, reply } => {
                debug!(m, n, "actor_loop: Configure command");
                let result = state.configure(m, n);
                if let Ok(info) = &result {
                    info!(run_id = %info.run_id, m = info.m, n = info.n, "Grid configured");
                    let _ = event_tx.send(ProgressEvent::Configured {
                        run_id: info.run_id,
                        m: info.m,
                        n: info.n,
                    });
                }
                let _ = reply.send(result);
            }

            ProgressCommand::ReportPixel { x, y, color, reply } => {
                debug!(x, y, "actor_loop: ReportPixel command");
                let was_done = is_done(&state);
                let result = state.report_pixel(x, y, color);
                announce_completion(&state, was_done, &event_tx);
                let _ = reply.send(result);
            }

            ProgressCommand::ReportRange {
                start_index,
                end_index,
                reply,
            } => {
                debug!(start_index, end_index, "actor_loop: ReportRange command");
                let was_done = is_done(&state);
                let result = state.report_range(start_index, end_index);
                announce_completion(&state, was_done, &event_tx);
                let _ = reply.send(result);
            }

            ProgressCommand::Status { reply } => {
                debug!("actor_loop: Status command");
                let _ = reply.send(state.status());
            }

            ProgressCommand::ExportImage { reply } => {
                debug!("actor_loop: ExportImage command");
                let _ = reply.send(state.export_image());
            }

            ProgressCommand::Shutdown => {
                info!("ProgressStore shutting down");
                break;
            }
        }
    }

    debug!("ProgressStore actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    #[tokio::test]
    async fn test_progress_store_roundtrip() {
        let store = ProgressStore::spawn();

        let info = store.configure(100, 100).await.unwrap();
        assert_eq!((info.m, info.n), (100, 100));

        let outcome = store.report_pixel(0, 0, None).await.unwrap();
        assert!(outcome.is_mutation());

        let status = store.status().await.unwrap();
        assert_eq!(status.run_id, info.run_id);
        assert_eq!(status.colored_pixels, 1);
        assert_eq!(status.current_position, Some(Position(1, 0)));

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_before_configure() {
        let store = ProgressStore::spawn();
        assert!(matches!(store.status().await, Err(ProgressError::NotConfigured)));
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let store = ProgressStore::spawn();
        store.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        assert!(matches!(store.status().await, Err(ProgressError::ChannelError)));
    }

    #[tokio::test]
    async fn test_events_for_configure_and_completion() {
        let store = ProgressStore::spawn();
        let mut events = store.subscribe_events();

        let info = store.configure(1, 2).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            ProgressEvent::Configured {
                run_id: info.run_id,
                m: 1,
                n: 2
            }
        );

        store.report_pixel(0, 0, Some(Rgb::new(1, 0, 0))).await.unwrap();
        store.report_pixel(1, 0, Some(Rgb::new(2, 0, 0))).await.unwrap();
        // A report after completion must not announce again
        store.report_pixel(1, 0, Some(Rgb::new(3, 0, 0))).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            ProgressEvent::Completed {
                run_id: info.run_id,
                total_pixels: 2
            }
        );
        assert!(events.try_recv().is_err());

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_reports_are_serialized() {
        let store = ProgressStore::spawn();
        store.configure(100, 100).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.report_pixel(0, 0, None).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let status = store.status().await.unwrap();
        assert_eq!(status.colored_pixels, 50);
        assert_eq!(status.current_position, Some(Position(50, 0)));

        store.shutdown().await.unwrap();
    }
}
