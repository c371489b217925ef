//! Audio playback kept in lockstep with the capture pipeline.
//!
//! Purely reactive: `on_pipeline_start` plays the configured track from time
//! zero, `on_pipeline_stop` stops it and resets the position. Every failure
//! mode (no output device, missing file, undecodable data) degrades to a
//! silent run — audio can never abort video generation.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use crate::error::{ReelError, ReelResult};

pub struct PlaybackSynchronizer {
    inner: Option<Inner>,
}

struct Inner {
    // The stream must outlive its sinks; dropping it silences everything.
    stream: OutputStream,
    source_path: PathBuf,
    sink: Option<Sink>,
}

impl PlaybackSynchronizer {
    /// Set up playback for `source`. `None`, or any load failure, yields a
    /// silent synchronizer (logged, never fatal).
    pub fn new(source: Option<&Path>) -> Self {
        let Some(path) = source else {
            tracing::debug!("no audio source configured, rendering silently");
            return Self::disabled();
        };

        match Self::try_open(path) {
            Ok(inner) => Self { inner: Some(inner) },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "audio unavailable, rendering silently"
                );
                Self::disabled()
            }
        }
    }

    /// A synchronizer that never plays anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    fn try_open(path: &Path) -> ReelResult<Inner> {
        // Decode once up front so a bad file is classified before the run
        // starts instead of at playback time.
        let file = File::open(path)
            .map_err(|e| ReelError::audio_load(format!("cannot open '{}': {e}", path.display())))?;
        Decoder::new(BufReader::new(file)).map_err(|e| {
            ReelError::audio_load(format!("cannot decode '{}': {e}", path.display()))
        })?;

        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| ReelError::audio_load(format!("no audio output device: {e}")))?;

        Ok(Inner {
            stream,
            source_path: path.to_path_buf(),
            sink: None,
        })
    }

    /// Begin playback from time zero. Called at capture start.
    pub fn on_pipeline_start(&mut self) {
        let Some(inner) = self.inner.as_mut() else {
            return;
        };
        // Stop any previous playback so a new run always starts at zero.
        if let Some(sink) = inner.sink.take() {
            sink.stop();
        }

        let decoded = File::open(&inner.source_path)
            .map_err(|e| e.to_string())
            .and_then(|f| Decoder::new(BufReader::new(f)).map_err(|e| e.to_string()));
        match decoded {
            Ok(source) => {
                let sink = Sink::connect_new(inner.stream.mixer());
                sink.append(source);
                sink.play();
                inner.sink = Some(sink);
                tracing::debug!("audio playback started");
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio playback failed to start, continuing silently");
            }
        }
    }

    /// Stop playback and reset position to zero. Called at capture stop and
    /// on cancellation.
    pub fn on_pipeline_stop(&mut self) {
        let Some(inner) = self.inner.as_mut() else {
            return;
        };
        if let Some(sink) = inner.sink.take() {
            sink.stop();
            tracing::debug!("audio playback stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_degrades_to_silent() {
        let sync = PlaybackSynchronizer::new(Some(Path::new("/nonexistent/track.mp3")));
        assert!(!sync.is_active());
    }

    #[test]
    fn none_source_is_silent() {
        let sync = PlaybackSynchronizer::new(None);
        assert!(!sync.is_active());
    }

    #[test]
    fn lifecycle_calls_are_noops_when_silent() {
        let mut sync = PlaybackSynchronizer::disabled();
        sync.on_pipeline_start();
        sync.on_pipeline_stop();
        sync.on_pipeline_start();
        assert!(!sync.is_active());
    }
}
