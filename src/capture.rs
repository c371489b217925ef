//! Capture pipeline: turns the surface's per-frame pixel stream into one
//! encoded, downloadable asset.
//!
//! Frames are pushed in strictly increasing index order. `push_frame` never
//! blocks the frame loop: pixels go into an unbounded channel drained by a
//! writer task that feeds the encoder while the loop is suspended on its
//! pacing tick. The asset only exists once `finish` has observed the encoder
//! flush and exit.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::{
    io::AsyncWriteExt as _,
    process::Command,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    error::{ReelError, ReelResult},
    surface::FrameRgba,
};

/// Parameters handed to a sink at capture start.
#[derive(Clone, Copy, Debug)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub frames_per_second: u32,
    pub bitrate_bps: u32,
}

/// The finished binary video object, produced exactly once per completed run.
#[derive(Clone, Debug)]
pub struct EncodedAsset {
    pub data: Vec<u8>,
    pub mime: String,
    pub extension: String,
}

impl EncodedAsset {
    /// Default download name: `statreel-<display_name>.<extension>`.
    pub fn suggested_filename(&self, display_name: &str) -> String {
        format!("statreel-{display_name}.{}", self.extension)
    }
}

/// Sink contract for consuming painted frames.
///
/// `begin` must be called before the first frame is painted so no frames are
/// lost; `finish` resolves only after the underlying encoder has flushed.
/// `abort` is the cancellation path: stop promptly, no usable asset required.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    fn push_frame(&mut self, frame_index: u64, frame: &FrameRgba) -> ReelResult<()>;
    fn finish(&mut self) -> impl Future<Output = ReelResult<EncodedAsset>>;
    fn abort(&mut self) -> impl Future<Output = ()>;
}

/// Encoder settings. Defaults target VP9 in WebM; all fields are knobs, not
/// design constraints.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub codec: String,
    pub container: String,
    pub mime: String,
    pub extension: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            codec: "libvpx-vp9".to_string(),
            container: "webm".to_string(),
            mime: "video/webm".to_string(),
            extension: "webm".to_string(),
        }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Production sink: pipes raw RGBA frames into a spawned system `ffmpeg`.
pub struct FfmpegSink {
    encode: EncodeConfig,
    active: Option<ActiveEncoder>,
}

struct ActiveEncoder {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    kill_tx: Option<oneshot::Sender<()>>,
    writer: JoinHandle<ReelResult<()>>,
    out_tmp: TempFileGuard,
    frame_len: usize,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    pub fn new(encode: EncodeConfig) -> Self {
        Self {
            encode,
            active: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if self.active.is_some() {
            return Err(ReelError::encoder_init("capture already started"));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encoder_init(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let out_path = std::env::temp_dir().join(format!(
            "statreel_capture_{}_{}.{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            self.encode.extension
        ));

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
                "-r",
                &cfg.frames_per_second.to_string(),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                &self.encode.codec,
                "-b:v",
                &cfg.bitrate_bps.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-f",
                &self.encode.container,
            ])
            .arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encoder_init(format!("failed to spawn ffmpeg (is it on PATH?): {e}"))
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encoder_init("failed to open ffmpeg stdin"))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        let writer = tokio::spawn(async move {
            let mut killed = false;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut kill_rx, if !killed => {
                        killed = true;
                        let _ = child.start_kill();
                        break;
                    }
                    chunk = rx.recv() => match chunk {
                        Some(chunk) => {
                            stdin.write_all(&chunk).await.map_err(|e| {
                                ReelError::encoder_runtime(format!(
                                    "failed to write frame to ffmpeg stdin: {e}"
                                ))
                            })?;
                        }
                        None => break,
                    }
                }
            }

            // Closing stdin signals end-of-stream so ffmpeg can flush.
            drop(stdin);

            if killed {
                let _ = child.wait().await;
                return Ok(());
            }

            let output = child.wait_with_output().await.map_err(|e| {
                ReelError::encoder_runtime(format!("failed to wait for ffmpeg: {e}"))
            })?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ReelError::encoder_runtime(format!(
                    "ffmpeg exited with status {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }
            Ok(())
        });

        self.active = Some(ActiveEncoder {
            tx: Some(tx),
            kill_tx: Some(kill_tx),
            writer,
            out_tmp: TempFileGuard(Some(out_path)),
            frame_len: (cfg.width as usize) * (cfg.height as usize) * 4,
            width: cfg.width,
            height: cfg.height,
        });
        Ok(())
    }

    fn push_frame(&mut self, _frame_index: u64, frame: &FrameRgba) -> ReelResult<()> {
        let Some(active) = self.active.as_mut() else {
            return Err(ReelError::encoder_runtime("capture has not started"));
        };
        if frame.width != active.width || frame.height != active.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, active.width, active.height
            )));
        }
        if frame.data.len() != active.frame_len {
            return Err(ReelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        let Some(tx) = active.tx.as_ref() else {
            return Err(ReelError::encoder_runtime("encoder is already finalizing"));
        };
        tx.send(frame.data.clone())
            .map_err(|_| ReelError::encoder_runtime("encoder terminated before the last frame"))
    }

    async fn finish(&mut self) -> ReelResult<EncodedAsset> {
        let mut active = self
            .active
            .take()
            .ok_or_else(|| ReelError::encoder_runtime("capture has not started"))?;

        // Dropping the sender ends the stream; the writer drains buffered
        // chunks, closes stdin, and waits for the encoder to flush.
        drop(active.tx.take());
        active
            .writer
            .await
            .map_err(|e| ReelError::encoder_runtime(format!("encoder task panicked: {e}")))??;

        let path = active
            .out_tmp
            .0
            .as_deref()
            .ok_or_else(|| ReelError::encoder_runtime("encoder output path missing"))?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            ReelError::encoder_runtime(format!("failed to read encoded output: {e}"))
        })?;
        tracing::debug!(bytes = data.len(), "capture finalized");

        Ok(EncodedAsset {
            data,
            mime: self.encode.mime.clone(),
            extension: self.encode.extension.clone(),
        })
    }

    async fn abort(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        if let Some(kill) = active.kill_tx.take() {
            let _ = kill.send(());
        }
        drop(active.tx.take());
        let _ = active.writer.await;
        // out_tmp guard drops here and removes any partial output.
    }
}

/// In-memory sink for tests and debugging. Records frames in arrival order
/// and enforces the asset-readiness rule: no asset before `finish`.
#[derive(Debug, Default)]
pub struct MemorySink {
    cfg: Option<SinkConfig>,
    pub frames: Vec<(u64, FrameRgba)>,
    finished: bool,
    aborted: bool,
    /// When set, `push_frame` fails once this many frames have been accepted.
    /// Lets tests inject a mid-run encoder failure.
    pub fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose `push_frame` fails once `limit` frames were accepted.
    pub fn failing_after(limit: usize) -> Self {
        Self {
            fail_after: Some(limit),
            ..Self::default()
        }
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// True only once `finish` has resolved.
    pub fn asset_ready(&self) -> bool {
        self.finished
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for MemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, frame_index: u64, frame: &FrameRgba) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encoder_runtime("capture has not started"));
        }
        if let Some(limit) = self.fail_after
            && self.frames.len() >= limit
        {
            return Err(ReelError::encoder_runtime("injected encoder failure"));
        }
        self.frames.push((frame_index, frame.clone()));
        Ok(())
    }

    async fn finish(&mut self) -> ReelResult<EncodedAsset> {
        if self.cfg.is_none() {
            return Err(ReelError::encoder_runtime("capture has not started"));
        }
        self.finished = true;
        let mut data = Vec::new();
        for (_, frame) in &self.frames {
            data.extend_from_slice(&frame.data);
        }
        Ok(EncodedAsset {
            data,
            mime: "application/octet-stream".to_string(),
            extension: "raw".to_string(),
        })
    }

    async fn abort(&mut self) {
        self.aborted = true;
    }
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, fill: u8) -> FrameRgba {
        FrameRgba {
            width,
            height,
            data: vec![fill; (width * height * 4) as usize],
        }
    }

    #[tokio::test]
    async fn memory_sink_buffers_in_order_and_finalizes() {
        let mut sink = MemorySink::new();
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            frames_per_second: 30,
            bitrate_bps: 1,
        })
        .unwrap();

        assert!(!sink.asset_ready());
        for i in 0..3u64 {
            sink.push_frame(i, &frame(2, 2, i as u8)).unwrap();
        }
        assert!(!sink.asset_ready(), "asset must not exist before finish");

        let asset = sink.finish().await.unwrap();
        assert!(sink.asset_ready());
        assert_eq!(asset.data.len(), 3 * 16);
        assert_eq!(
            sink.frames.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn memory_sink_injected_failure_surfaces_as_encoder_runtime() {
        let mut sink = MemorySink::failing_after(1);
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            frames_per_second: 30,
            bitrate_bps: 1,
        })
        .unwrap();
        sink.push_frame(0, &frame(2, 2, 0)).unwrap();
        let err = sink.push_frame(1, &frame(2, 2, 1)).unwrap_err();
        assert!(matches!(err, ReelError::EncoderRuntime(_)));
    }

    #[test]
    fn push_before_begin_is_rejected() {
        let mut sink = MemorySink::new();
        let err = sink.push_frame(0, &frame(2, 2, 0)).unwrap_err();
        assert!(matches!(err, ReelError::EncoderRuntime(_)));
    }

    #[test]
    fn suggested_filename_pattern() {
        let asset = EncodedAsset {
            data: vec![],
            mime: "video/webm".to_string(),
            extension: "webm".to_string(),
        };
        assert_eq!(asset.suggested_filename("AVA"), "statreel-AVA.webm");
    }

    #[test]
    fn temp_guard_removes_file_on_drop() {
        let path = std::env::temp_dir().join(format!(
            "statreel_guard_test_{}",
            std::process::id()
        ));
        std::fs::write(&path, b"x").unwrap();
        drop(TempFileGuard(Some(path.clone())));
        assert!(!path.exists());
    }
}
