use std::path::PathBuf;

use crate::{
    error::{ReelError, ReelResult},
    timeline::RenderSchedule,
};

/// All knobs recognized by a generation run. Defaults reproduce the reference
/// output: a 30 fps, 18 second, 720x1280 reel at ~2.5 Mbit/s.
///
/// The renderer expresses its layout as fractions of width/height and its
/// timing as fractions of the schedule, so every field here can be overridden
/// without touching any drawing formula.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub frames_per_second: u32,
    pub total_duration_seconds: f64,
    pub beats_per_second: f64,
    pub bitrate_bps: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Audio track started in lockstep with capture. `None` renders silently;
    /// a path that fails to load also degrades to silence (never fatal).
    pub audio_source: Option<PathBuf>,
    /// Font used for all text. `None` probes a fixed list of common system
    /// font locations.
    pub font_source: Option<PathBuf>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30,
            total_duration_seconds: 18.0,
            beats_per_second: 2.0,
            bitrate_bps: 2_500_000,
            canvas_width: 720,
            canvas_height: 1280,
            audio_source: None,
            font_source: None,
        }
    }
}

impl ReelConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.frames_per_second == 0 {
            return Err(ReelError::validation("frames_per_second must be > 0"));
        }
        if !(self.total_duration_seconds > 0.0) {
            return Err(ReelError::validation("total_duration_seconds must be > 0"));
        }
        if !(self.beats_per_second > 0.0) {
            return Err(ReelError::validation("beats_per_second must be > 0"));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ReelError::validation("canvas width/height must be > 0"));
        }
        if !self.canvas_width.is_multiple_of(2) || !self.canvas_height.is_multiple_of(2) {
            // yuv420p output subsamples chroma 2x2.
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p output)",
            ));
        }
        if self.bitrate_bps == 0 {
            return Err(ReelError::validation("bitrate_bps must be > 0"));
        }
        Ok(())
    }

    pub fn schedule(&self) -> RenderSchedule {
        RenderSchedule {
            frames_per_second: self.frames_per_second,
            total_duration_seconds: self.total_duration_seconds,
            beats_per_second: self.beats_per_second,
        }
    }
}
