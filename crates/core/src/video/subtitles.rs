//! Subtitle timing and SRT output.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::collab::{TranscriptSegment, Transcriber};
use crate::metrics;
use crate::record::SubtitleSource;

/// One subtitle cue, timed in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// `HH:MM:SS,mmm`
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Render cues as an SRT document, numbered from 1.
pub fn render_srt(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_timestamp(entry.start_ms),
            format_timestamp(entry.end_ms)
        );
        let _ = writeln!(out, "{}", entry.text);
        out.push('\n');
    }
    out
}

/// Sentences split on `.`, `!` and `?`, trimmed, empties dropped. A text with
/// no sentence content yields itself as a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let sentences: Vec<String> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if sentences.is_empty() {
        vec![text.trim().to_string()]
    } else {
        sentences
    }
}

/// Equal time slices per sentence.
///
/// Boundaries are computed in integer milliseconds from the total, so cues are
/// contiguous and the last one ends exactly at the audio duration.
pub fn estimate_entries(text: &str, duration_secs: f64) -> Vec<SubtitleEntry> {
    let sentences = split_sentences(text);
    let total_ms = seconds_to_ms(duration_secs);
    let n = sentences.len() as u64;
    sentences
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let i = i as u64;
            SubtitleEntry {
                start_ms: total_ms * i / n,
                end_ms: total_ms * (i + 1) / n,
                text,
            }
        })
        .collect()
}

pub fn entries_from_segments(segments: &[TranscriptSegment]) -> Vec<SubtitleEntry> {
    segments
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| SubtitleEntry {
            start_ms: seconds_to_ms(s.start),
            end_ms: seconds_to_ms(s.end),
            text: s.text.trim().to_string(),
        })
        .collect()
}

pub struct SubtitleSynchronizer {
    transcriber: Arc<dyn Transcriber>,
}

impl SubtitleSynchronizer {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }

    /// Transcribe the narration for accurate cues; fall back to equal
    /// per-sentence slices when transcription fails or finds nothing.
    pub async fn synchronize(
        &self,
        audio_path: &Path,
        text: &str,
        duration_secs: f64,
    ) -> (Vec<SubtitleEntry>, SubtitleSource) {
        let (entries, source) = match self.transcriber.transcribe(audio_path).await {
            Ok(segments) => {
                let entries = entries_from_segments(&segments);
                if entries.is_empty() {
                    warn!("Transcription returned no segments, estimating subtitle timing");
                    (estimate_entries(text, duration_secs), SubtitleSource::Estimated)
                } else {
                    (entries, SubtitleSource::Transcribed)
                }
            }
            Err(e) => {
                warn!(error = %e, "Transcription failed, estimating subtitle timing");
                (estimate_entries(text, duration_secs), SubtitleSource::Estimated)
            }
        };

        metrics::SUBTITLE_SOURCE
            .with_label_values(&[source.as_str()])
            .inc();
        info!(cues = entries.len(), source = source.as_str(), "Synchronized subtitles");
        (entries, source)
    }
}
