//! Stateless per-frame drawing.
//!
//! `render_frame` fully overwrites the surface each call; nothing accumulates
//! between frames. Layout metrics are fractions of the canvas so the same
//! routines serve any even-dimension canvas; the reference look corresponds to
//! 720x1280.
//!
//! The easing and reveal formulas in this module are fixed policy, shared with
//! the tests through the pure helpers at the bottom.

use crate::{
    color::{Rgba8, hsl_to_rgba},
    model::{ProgressRecord, UserSummary},
    surface::Surface,
    text::{Align, TextRenderer},
    timeline::{FrameState, REVEAL_SPEED, Stage, bounce_offset},
};

const BASE: Rgba8 = Rgba8::rgb(0x1b, 0x1b, 0x2f);
const GOLD: Rgba8 = Rgba8::rgb(0xff, 0xd7, 0x00);
const DARK_GOLD: Rgba8 = Rgba8::rgb(0xd4, 0xaf, 0x37);
const ORANGE: Rgba8 = Rgba8::rgb(0xff, 0xa5, 0x00);
const BODY: Rgba8 = Rgba8::rgb(0xed, 0xed, 0xed);
const PANEL: Rgba8 = Rgba8::rgba(0x2b, 0x2b, 0x44, 204);

/// Beat bounce amplitude as a fraction of canvas height (20 units at 1280).
const BOUNCE_FRAC: f64 = 20.0 / 1280.0;
/// Per-row wobble amplitude as a fraction of canvas width (5 units at 720).
const WOBBLE_FRAC: f64 = 5.0 / 720.0;
/// Background hue rotation speed in degrees per second.
const HUE_DEG_PER_SEC: f64 = 50.0;

const INTRO_BADGE: &str = "🎓";
const INTRO_CAPTION: &str = "Progress Report";
const STATS_HEADING: &str = "Your Achievements";
const OUTRO_CAPTION: &str = "Gems Collected!";
const OUTRO_CLOSING: &str = "Keep Learning!";

/// Paint one complete frame for the given timeline state.
pub fn render_frame(
    surface: &mut Surface,
    text: &TextRenderer,
    state: &FrameState,
    summary: &UserSummary,
) {
    let h = f64::from(surface.height());

    surface.clear(BASE);
    draw_background(surface, state.elapsed_seconds);

    // Beat-driven bounce displaces every stage's content upward.
    let dy = -bounce_offset(state.beat_phase, h * BOUNCE_FRAC);

    match state.stage {
        Stage::Intro => draw_intro(surface, text, state.stage_local_progress, dy, summary),
        Stage::Stats => draw_stats(
            surface,
            text,
            state.stage_local_progress,
            state.elapsed_seconds,
            dy,
            &summary.records,
        ),
        Stage::Outro => draw_outro(surface, text, state.stage_local_progress, dy, &summary.records),
    }
}

fn draw_background(surface: &mut Surface, elapsed_seconds: f64) {
    let hue = (elapsed_seconds * HUE_DEG_PER_SEC) % 360.0;
    let start = hsl_to_rgba(hue, 0.30, 0.12);
    let end = hsl_to_rgba(hue + 60.0, 0.30, 0.18);
    surface.fill_diagonal_gradient(start, end);
}

fn draw_intro(
    surface: &mut Surface,
    text: &TextRenderer,
    local: f64,
    dy: f64,
    summary: &UserSummary,
) {
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let scale = (local * 1.5).min(1.0);
    let alpha = (local * 2.0).min(1.0);

    let cx = w / 2.0;
    let cy = h / 2.0 + dy;

    let badge_y = cy - h * (100.0 / 1280.0) * scale;
    let name_y = cy + h * (20.0 / 1280.0) * scale;
    let caption_y = cy + h * (80.0 / 1280.0) * scale;
    let gold = GOLD.with_alpha(alpha);
    centered(surface, text, INTRO_BADGE, cx, badge_y, scale_px(h, 72.0, scale), gold);
    centered(surface, text, &summary.display_name, cx, name_y, scale_px(h, 56.0, scale), gold);
    centered(
        surface,
        text,
        INTRO_CAPTION,
        cx,
        caption_y,
        scale_px(h, 36.0, scale),
        DARK_GOLD.with_alpha(alpha),
    );
}

fn draw_stats(
    surface: &mut Surface,
    text: &TextRenderer,
    local: f64,
    elapsed_seconds: f64,
    dy: f64,
    records: &[ProgressRecord],
) {
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());

    let heading_y = h * (100.0 / 1280.0) + dy;
    centered(surface, text, STATS_HEADING, w / 2.0, heading_y, scale_px(h, 48.0, 1.0), GOLD);

    let start_y = h * (200.0 / 1280.0);
    let row_height = h * (110.0 / 1280.0);
    let row_inner = h * (90.0 / 1280.0);
    let margin = w * (40.0 / 720.0);
    let bar_left = w * (130.0 / 720.0);
    let bar_max = bar_max_width(w);
    let bar_height = h * (25.0 / 1280.0);

    let visible = visible_record_count(local, records.len());
    for (i, record) in records.iter().take(visible).enumerate() {
        let progress = item_progress(local, records.len(), i);
        let y = start_y + i as f64 * row_height + dy;
        // Per-item phase offset so rows desynchronize visually.
        let wobble = (elapsed_seconds * 4.0 + i as f64).sin() * (w * WOBBLE_FRAC);

        let panel = PANEL.with_alpha(progress);
        surface.fill_rect(margin + wobble, y, w - 2.0 * margin, row_inner, panel);

        let body = BODY.with_alpha(progress);
        let glyph_x = w * (60.0 / 720.0) + wobble;
        text.draw(
            surface,
            &record.glyph,
            glyph_x,
            y + h * (55.0 / 1280.0),
            scale_px(h, 48.0, 1.0),
            body,
            Align::Left,
        );
        text.draw(
            surface,
            &record.activity,
            bar_left + wobble,
            y + h * (35.0 / 1280.0),
            scale_px(h, 28.0, 1.0),
            body,
            Align::Left,
        );

        let fill = bar_fill_width(bar_max, record.percent, progress);
        let bar_y = y + h * (50.0 / 1280.0);
        surface.fill_rect_h_gradient(
            bar_left + wobble,
            bar_y,
            fill,
            bar_height,
            GOLD.with_alpha(progress),
            ORANGE.with_alpha(progress),
        );
        surface.stroke_rect(
            bar_left + wobble,
            bar_y,
            bar_max,
            bar_height,
            2.0 * w / 720.0,
            DARK_GOLD.with_alpha(progress),
        );

        text.draw(
            surface,
            &format!("{}%", record.percent),
            w - w * (60.0 / 720.0) + wobble,
            y + h * (70.0 / 1280.0),
            scale_px(h, 24.0, 1.0),
            GOLD.with_alpha(progress),
            Align::Right,
        );
    }
}

fn draw_outro(
    surface: &mut Surface,
    text: &TextRenderer,
    local: f64,
    dy: f64,
    records: &[ProgressRecord],
) {
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let scale = 1.0 + local * 0.3;
    let alpha = 1.0 - local * 0.3;

    let cx = w / 2.0;
    let cy = h / 2.0 + dy;

    let trophy_y = cy - h * (150.0 / 1280.0) * scale;
    let tally_y = cy - h * (50.0 / 1280.0) * scale;
    let caption_y = cy + h * (20.0 / 1280.0) * scale;
    let closing_y = cy + h * (100.0 / 1280.0) * scale;
    let gold = GOLD.with_alpha(alpha);
    let dark = DARK_GOLD.with_alpha(alpha);
    centered(surface, text, "🏆", cx, trophy_y, scale_px(h, 64.0, scale), gold);
    centered(surface, text, &tally_text(records), cx, tally_y, scale_px(h, 56.0, scale), gold);
    centered(surface, text, OUTRO_CAPTION, cx, caption_y, scale_px(h, 40.0, scale), dark);
    centered(surface, text, OUTRO_CLOSING, cx, closing_y, scale_px(h, 32.0, scale), dark);
}

/// Draw text centered on `x` with `y` treated as the vertical midpoint.
fn centered(
    surface: &mut Surface,
    text: &TextRenderer,
    s: &str,
    x: f64,
    y: f64,
    px: f32,
    color: Rgba8,
) {
    // Baseline sits a bit below the optical middle.
    text.draw(surface, s, x, y + f64::from(px) * 0.35, px, color, Align::Center);
}

/// Reference font size (at 1280 height) scaled to the canvas and the stage's
/// scale factor.
fn scale_px(h: f64, reference_px: f64, scale: f64) -> f32 {
    (reference_px * (h / 1280.0) * scale).max(1.0) as f32
}

fn bar_max_width(w: f64) -> f64 {
    w - w * (180.0 / 720.0)
}

/// How many records are revealed at `local` stage progress. Monotonic in
/// `local`; reaches `record_count` before `local` reaches 1 (reveal runs at
/// [`REVEAL_SPEED`]).
pub fn visible_record_count(local: f64, record_count: usize) -> usize {
    ((local * record_count as f64 * REVEAL_SPEED).floor() as usize).min(record_count)
}

/// Entrance progress of record `i`, applied as row opacity and bar-fill
/// multiplier: `clamp((local * n - i) * 1.5, 0, 1)`.
pub fn item_progress(local: f64, record_count: usize, i: usize) -> f64 {
    ((local * record_count as f64 - i as f64) * 1.5).clamp(0.0, 1.0)
}

/// Bar fill in surface units: `max_width * percent% * item_progress`.
pub fn bar_fill_width(max_width: f64, percent: u8, item_progress: f64) -> f64 {
    max_width * (f64::from(percent) / 100.0) * item_progress.clamp(0.0, 1.0)
}

/// `(completed, total)` where completed counts records at exactly 100%.
pub fn completion_tally(records: &[ProgressRecord]) -> (usize, usize) {
    let completed = records.iter().filter(|r| r.percent == 100).count();
    (completed, records.len())
}

/// The outro's headline tally, e.g. `"7/9"`.
pub fn tally_text(records: &[ProgressRecord]) -> String {
    let (completed, total) = completion_tally(records);
    format!("{completed}/{total}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{RenderSchedule, compute_frame_state};

    fn records(percents: &[u8]) -> Vec<ProgressRecord> {
        percents
            .iter()
            .enumerate()
            .map(|(i, &p)| ProgressRecord {
                activity: format!("activity-{i}"),
                percent: p,
                glyph: "📘".to_string(),
            })
            .collect()
    }

    fn summary(percents: &[u8]) -> UserSummary {
        UserSummary {
            display_name: "AVA".to_string(),
            records: records(percents),
        }
    }

    #[test]
    fn visible_count_is_monotonic_and_completes_early() {
        let n = 9;
        let mut prev = 0;
        let mut full_at = None;
        for step in 0..=1000 {
            let local = step as f64 / 1000.0;
            let count = visible_record_count(local, n);
            assert!(count >= prev, "reveal count regressed at local={local}");
            assert!(count <= n);
            if count == n && full_at.is_none() {
                full_at = Some(local);
            }
            prev = count;
        }
        let full_at = full_at.expect("all records revealed");
        assert!(full_at < 1.0, "1.2 factor must finish reveal before stage end");
    }

    #[test]
    fn last_item_reaches_full_progress_before_stage_end() {
        let n = 9;
        // At the moment the reveal completes, keep advancing: the last item's
        // entrance must hit 1.0 while local is still < 1.
        let mut reached = None;
        for step in 0..=10_000 {
            let local = step as f64 / 10_000.0;
            if item_progress(local, n, n - 1) >= 1.0 {
                reached = Some(local);
                break;
            }
        }
        assert!(reached.expect("last item completes") < 1.0);
    }

    #[test]
    fn item_progress_is_clamped() {
        assert_eq!(item_progress(0.0, 9, 5), 0.0);
        assert_eq!(item_progress(1.0, 9, 0), 1.0);
        assert!((0.0..=1.0).contains(&item_progress(0.4, 9, 3)));
    }

    #[test]
    fn bar_fill_scales_with_percent_and_entrance() {
        assert_eq!(bar_fill_width(540.0, 100, 1.0), 540.0);
        assert_eq!(bar_fill_width(540.0, 50, 1.0), 270.0);
        assert_eq!(bar_fill_width(540.0, 100, 0.5), 270.0);
        assert_eq!(bar_fill_width(540.0, 0, 1.0), 0.0);
    }

    #[test]
    fn completion_tally_extremes() {
        assert_eq!(completion_tally(&records(&[0; 9])), (0, 9));
        assert_eq!(completion_tally(&records(&[100; 9])), (9, 9));
        assert_eq!(tally_text(&records(&[0; 9])), "0/9");
        assert_eq!(tally_text(&records(&[100; 9])), "9/9");
    }

    #[test]
    fn completion_tally_counts_only_exact_hundreds() {
        assert_eq!(
            completion_tally(&records(&[99, 100, 100, 0, 1, 100, 42, 7, 100])),
            (4, 9)
        );
    }

    #[test]
    fn render_is_deterministic_for_a_frame_index() {
        let sched = RenderSchedule {
            frames_per_second: 30,
            total_duration_seconds: 18.0,
            beats_per_second: 2.0,
        };
        let summary = summary(&[10, 20, 30, 40, 50, 60, 70, 80, 90]);
        let text = TextRenderer::disabled();

        for frame in [0u64, 81, 300, 459, 539] {
            let state = compute_frame_state(frame, &sched);
            let mut a = Surface::new(72, 128).unwrap();
            let mut b = Surface::new(72, 128).unwrap();
            render_frame(&mut a, &text, &state, &summary);
            render_frame(&mut b, &text, &state, &summary);
            assert_eq!(a.frame(), b.frame(), "frame {frame} not deterministic");
        }
    }

    #[test]
    fn render_overwrites_stale_pixels() {
        let sched = RenderSchedule {
            frames_per_second: 30,
            total_duration_seconds: 18.0,
            beats_per_second: 2.0,
        };
        let summary = summary(&[100; 9]);
        let text = TextRenderer::disabled();

        // Paint a late stats frame, then an intro frame, into the same
        // surface; result must equal a fresh intro frame.
        let mut reused = Surface::new(72, 128).unwrap();
        render_frame(&mut reused, &text, &compute_frame_state(300, &sched), &summary);
        render_frame(&mut reused, &text, &compute_frame_state(0, &sched), &summary);

        let mut fresh = Surface::new(72, 128).unwrap();
        render_frame(&mut fresh, &text, &compute_frame_state(0, &sched), &summary);

        assert_eq!(reused.frame(), fresh.frame());
    }

    #[test]
    fn stats_frames_differ_as_rows_reveal() {
        let sched = RenderSchedule {
            frames_per_second: 30,
            total_duration_seconds: 18.0,
            beats_per_second: 2.0,
        };
        let summary = summary(&[100; 9]);
        let text = TextRenderer::disabled();

        let mut early = Surface::new(72, 128).unwrap();
        let mut late = Surface::new(72, 128).unwrap();
        render_frame(&mut early, &text, &compute_frame_state(90, &sched), &summary);
        render_frame(&mut late, &text, &compute_frame_state(400, &sched), &summary);
        assert_ne!(early.frame(), late.frame());
    }
}
