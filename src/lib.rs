#![forbid(unsafe_code)]

pub mod audio;
pub mod capture;
pub mod color;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod scene;
pub mod surface;
pub mod text;
pub mod timeline;

pub use audio::PlaybackSynchronizer;
pub use capture::{EncodeConfig, EncodedAsset, FfmpegSink, FrameSink, MemorySink, SinkConfig};
pub use config::ReelConfig;
pub use error::{ReelError, ReelResult};
pub use model::{EXPECTED_RECORD_COUNT, ProgressRecord, UserSummary};
pub use orchestrator::{CancelSource, CancelToken, Orchestrator, RunState, cancel_pair};
pub use surface::{FrameRgba, Surface};
pub use text::TextRenderer;
pub use timeline::{FrameState, RenderSchedule, Stage, compute_frame_state};
