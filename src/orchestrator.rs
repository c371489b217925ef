//! Drives a generation run: frame loop, pacing, and start/stop sequencing of
//! capture and audio.
//!
//! Scheduling is cooperative and single-threaded: the only suspension points
//! are the per-frame pacing tick and the final encoder flush, which is what
//! lets the encoder writer task and audio driver make progress while the loop
//! waits. State transitions: `Idle -> Running -> Finalizing -> Complete`, with
//! `Failed` as the terminal state for mid-run encoder errors.

use tokio::sync::watch;
use tokio::time::interval;

use crate::{
    audio::PlaybackSynchronizer,
    capture::{EncodedAsset, FrameSink, SinkConfig},
    config::ReelConfig,
    error::{ReelError, ReelResult},
    model::UserSummary,
    scene,
    surface::Surface,
    text::TextRenderer,
    timeline::compute_frame_state,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finalizing,
    Complete,
    Failed,
}

/// Cancels an in-flight run. Cheap to clone; firing is idempotent.
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
            _keep: None,
        }
    }
}

#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    // Keeps the sender alive for tokens that must never fire.
    _keep: Option<std::sync::Arc<watch::Sender<bool>>>,
}

impl CancelToken {
    /// A token that never cancels.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keep: Some(std::sync::Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation fires; pends forever if the source is gone
    /// without having fired.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn cancel_pair() -> (CancelSource, CancelToken) {
    let (tx, rx) = watch::channel(false);
    let token = CancelToken { rx, _keep: None };
    (CancelSource { tx }, token)
}

pub struct Orchestrator {
    config: ReelConfig,
    state: RunState,
    asset: Option<EncodedAsset>,
}

impl Orchestrator {
    pub fn new(config: ReelConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
            asset: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    /// The finished asset of the last completed run, if still held.
    pub fn asset(&self) -> Option<&EncodedAsset> {
        self.asset.as_ref()
    }

    /// Hand the asset to the caller; the orchestrator no longer holds it.
    pub fn take_asset(&mut self) -> Option<EncodedAsset> {
        self.asset.take()
    }

    /// Run one full generation.
    ///
    /// Acquisition order is surface, then encoder, then audio; a failure
    /// before the first frame leaves the state `Idle` with nothing held. A
    /// mid-run encoder failure releases audio, aborts capture, and parks the
    /// orchestrator in `Failed`. Cancellation stops the loop promptly and
    /// returns to `Idle` without an asset.
    pub async fn run<S: FrameSink>(
        &mut self,
        summary: &UserSummary,
        sink: &mut S,
        audio: &mut PlaybackSynchronizer,
        mut cancel: CancelToken,
    ) -> ReelResult<()> {
        if matches!(self.state, RunState::Running | RunState::Finalizing) {
            return Err(ReelError::validation("a generation run is already in progress"));
        }
        self.state = RunState::Idle;
        // Starting a new run revokes any previously published asset.
        self.asset = None;

        self.config.validate()?;
        summary.validate()?;

        let schedule = self.config.schedule();
        let total_frames = schedule.total_frames();
        let text = TextRenderer::load(self.config.font_source.as_deref());

        let mut surface = Surface::new(self.config.canvas_width, self.config.canvas_height)?;

        // Capture must be consuming before the first frame is painted.
        sink.begin(SinkConfig {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
            frames_per_second: self.config.frames_per_second,
            bitrate_bps: self.config.bitrate_bps,
        })?;
        audio.on_pipeline_start();

        self.state = RunState::Running;
        tracing::info!(
            frames = total_frames,
            fps = self.config.frames_per_second,
            "generation started"
        );

        let mut ticker = interval(schedule.frame_interval());
        // The first tick resolves immediately; consume it so every
        // inter-frame gap is a full period.
        ticker.tick().await;

        for frame_index in 0..total_frames {
            let frame_state = compute_frame_state(frame_index, &schedule);
            scene::render_frame(&mut surface, &text, &frame_state, summary);

            if let Err(e) = sink.push_frame(frame_index, &surface.frame()) {
                tracing::warn!(frame = frame_index, error = %e, "encoder failed mid-run");
                audio.on_pipeline_stop();
                sink.abort().await;
                self.state = RunState::Failed;
                return Err(e);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(frame = frame_index, "generation cancelled");
                    audio.on_pipeline_stop();
                    sink.abort().await;
                    self.state = RunState::Idle;
                    return Err(ReelError::Cancelled);
                }
                _ = ticker.tick() => {}
            }
        }

        self.state = RunState::Finalizing;
        let (asset, ()) = tokio::join!(sink.finish(), async {
            audio.on_pipeline_stop();
        });

        match asset {
            Ok(asset) => {
                tracing::info!(bytes = asset.data.len(), "generation complete");
                self.asset = Some(asset);
                self.state = RunState::Complete;
                Ok(())
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(e)
            }
        }
    }
}
