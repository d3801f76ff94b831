//! Vertical video assembly: background footage, narration and burned-in
//! subtitles rendered with ffmpeg.
//!
//! [`VideoAssembler`] drives the sub-stages in order. Each sub-stage lives in
//! its own module so it can be exercised on its own:
//!
//! - [`keywords`]: visual search terms from the script
//! - [`clips`]: footage search, ranking and download
//! - [`compositor`]: ffmpeg invocations for the background and final mux
//! - [`subtitles`]: cue timing and SRT output
//! - [`fonts`]: subtitle font discovery

mod assembler;
pub mod clips;
pub mod compositor;
mod error;
pub mod fonts;
pub mod keywords;
pub mod subtitles;

pub use assembler::{AssemblyServices, VideoAssembler, VideoOutcome, DEFAULT_PER_PAGE};
pub use clips::{ClipSelection, ClipSelector, SelectedClip};
pub use compositor::Compositor;
pub use error::AssemblyError;
pub use fonts::{font_status, locate_font, FontChoice, FontStatus};
pub use keywords::{fallback_keywords, KeywordExtractor, KeywordSource};
pub use subtitles::{render_srt, SubtitleEntry, SubtitleSynchronizer};
