//! Subtitle font discovery.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{FontCandidate, VideoConfig};

/// The font chosen for burned-in subtitles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChoice {
    pub path: PathBuf,
    pub family: String,
    /// True when the font comes from the fallback list and may lack Hangul.
    pub degraded: bool,
}

impl FontChoice {
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }
}

/// Font availability as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontStatus {
    pub korean_font_available: bool,
    pub font_path: Option<PathBuf>,
    pub degraded: bool,
}

fn first_existing(candidates: &[FontCandidate]) -> Option<&FontCandidate> {
    candidates.iter().find(|c| c.path.is_file())
}

/// Preferred fonts first, in order, then the fallback list.
pub fn locate_font(preferred: &[FontCandidate], fallback: &[FontCandidate]) -> Option<FontChoice> {
    if let Some(found) = first_existing(preferred) {
        return Some(FontChoice {
            path: found.path.clone(),
            family: found.family.clone(),
            degraded: false,
        });
    }
    first_existing(fallback).map(|found| FontChoice {
        path: found.path.clone(),
        family: found.family.clone(),
        degraded: true,
    })
}

pub fn font_status(config: &VideoConfig) -> FontStatus {
    match locate_font(&config.preferred_fonts, &config.fallback_fonts) {
        Some(choice) => FontStatus {
            korean_font_available: !choice.degraded,
            font_path: Some(choice.path),
            degraded: choice.degraded,
        },
        None => FontStatus {
            korean_font_available: false,
            font_path: None,
            degraded: true,
        },
    }
}
