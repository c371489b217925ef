//! Frame-index to animation-state mapping.
//!
//! Everything here is a pure, total function of `(frame_index, schedule)`.
//! The renderer never reads a real clock; `elapsed_seconds` is derived from
//! the frame index so replaying the same index sequence reproduces
//! pixel-identical frames.

/// Global-progress fraction where the intro ends and the stats stage begins.
pub const INTRO_END: f64 = 0.15;
/// Global-progress fraction where the stats stage ends and the outro begins.
pub const STATS_END: f64 = 0.85;

/// Reveal-speed multiplier for stats rows. Greater than 1 so the last record
/// finishes revealing slightly before the stage visually ends.
pub const REVEAL_SPEED: f64 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Intro,
    Stats,
    Outro,
}

/// Fixed timing parameters for one run.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderSchedule {
    pub frames_per_second: u32,
    pub total_duration_seconds: f64,
    pub beats_per_second: f64,
}

impl RenderSchedule {
    pub fn total_frames(&self) -> u64 {
        (f64::from(self.frames_per_second) * self.total_duration_seconds).round() as u64
    }

    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.frames_per_second))
    }
}

/// Ephemeral per-frame state, recomputed fresh each frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameState {
    pub frame_index: u64,
    pub elapsed_seconds: f64,
    /// Run completion fraction in [0,1].
    pub global_progress: f64,
    pub stage: Stage,
    /// Linear remap of `global_progress` into [0,1] within the active stage.
    pub stage_local_progress: f64,
    /// Repeating [0,1) cycle driving the bounce motion, independent of stage.
    pub beat_phase: f64,
}

/// Map a frame index onto the three-stage timeline.
///
/// Indices at or past `total_frames` clamp to the terminal outro state rather
/// than erroring, so an over-iterating caller never crashes.
pub fn compute_frame_state(frame_index: u64, schedule: &RenderSchedule) -> FrameState {
    let total_frames = schedule.total_frames().max(1);
    let clamped = frame_index.min(total_frames);

    let elapsed_seconds = clamped as f64 / f64::from(schedule.frames_per_second);
    let global_progress = (clamped as f64 / total_frames as f64).clamp(0.0, 1.0);

    let (stage, stage_local_progress) = if global_progress < INTRO_END {
        (Stage::Intro, global_progress / INTRO_END)
    } else if global_progress < STATS_END {
        (Stage::Stats, (global_progress - INTRO_END) / (STATS_END - INTRO_END))
    } else {
        (Stage::Outro, (global_progress - STATS_END) / (1.0 - STATS_END))
    };

    let beat_phase = (elapsed_seconds * schedule.beats_per_second).fract();

    FrameState {
        frame_index: clamped,
        elapsed_seconds,
        global_progress,
        stage,
        stage_local_progress: stage_local_progress.clamp(0.0, 1.0),
        beat_phase,
    }
}

/// Beat-synchronized vertical displacement: `|sin(phase * pi)| * amplitude`.
pub fn bounce_offset(beat_phase: f64, amplitude: f64) -> f64 {
    (beat_phase * std::f64::consts::PI).sin().abs() * amplitude
}
