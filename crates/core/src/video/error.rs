//! Video assembly failures.

use thiserror::Error;

use crate::media::ProcessError;
use crate::storage::StorageError;

/// A video assembly sub-stage failed. Each variant names where assembly
/// stopped so callers can report it.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Narration audio could not be fetched into scratch space.
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(String),

    /// No usable background footage was found or downloaded.
    #[error("No usable background clips (queries: {})", queries.join(", "))]
    NoClips { queries: Vec<String> },

    #[error("Background composition failed: {0}")]
    Composition(#[source] ProcessError),

    #[error("Subtitle generation failed: {0}")]
    Subtitles(String),

    #[error("Final mux failed: {0}")]
    Mux(#[source] ProcessError),

    #[error("Storing the video failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Scratch directory error: {0}")]
    Scratch(#[source] std::io::Error),
}

impl AssemblyError {
    /// Short stage name reported alongside the error.
    pub fn stage(&self) -> &'static str {
        match self {
            AssemblyError::AudioUnavailable(_) => "audio",
            AssemblyError::NoClips { .. } => "clips",
            AssemblyError::Composition(_) => "composition",
            AssemblyError::Subtitles(_) => "subtitles",
            AssemblyError::Mux(_) => "mux",
            AssemblyError::Upload(_) => "upload",
            AssemblyError::Scratch(_) => "scratch",
        }
    }
}
