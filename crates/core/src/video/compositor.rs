//! ffmpeg command construction for background composition and the final mux.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::clips::SelectedClip;
use super::error::AssemblyError;
use super::fonts::FontChoice;
use crate::config::VideoConfig;
use crate::media::{MediaInvocation, MediaRunner};

/// Concat demuxer list, one `file '...'` line per clip in order.
pub fn concat_list(clips: &[SelectedClip]) -> String {
    clips
        .iter()
        .map(|c| {
            let path = c.path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

/// Scale to cover the frame, then center-crop to exactly the frame size.
pub fn cover_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = width,
        h = height
    )
}

/// Escape a value for use inside an ffmpeg filter option.
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace(',', "\\,")
}

/// ASS style override: white bold text, black outline, bottom center.
pub fn subtitle_style(font: Option<&FontChoice>, font_size: u32) -> String {
    let mut style = Vec::new();
    if let Some(font) = font {
        style.push(format!("FontName={}", font.family));
    }
    style.push(format!("Fontsize={}", font_size));
    style.extend(
        [
            "PrimaryColour=&HFFFFFF",
            "OutlineColour=&H000000",
            "Outline=2",
            "Shadow=1",
            "Bold=1",
            "Alignment=2",
        ]
        .map(str::to_string),
    );
    style.join(",")
}

/// The `subtitles` filter burning `srt` with the chosen font.
pub fn subtitle_filter(srt: &Path, font: Option<&FontChoice>, font_size: u32) -> String {
    let mut filter = format!(
        "subtitles=filename={}",
        escape_filter_value(&srt.to_string_lossy())
    );
    if let Some(dir) = font.and_then(FontChoice::dir) {
        filter.push_str(&format!(
            ":fontsdir={}",
            escape_filter_value(&dir.to_string_lossy())
        ));
    }
    filter.push_str(&format!(
        ":force_style='{}'",
        subtitle_style(font, font_size)
    ));
    filter
}

pub struct Compositor {
    runner: Arc<dyn MediaRunner>,
    config: VideoConfig,
}

impl Compositor {
    pub fn new(runner: Arc<dyn MediaRunner>, config: VideoConfig) -> Self {
        Self { runner, config }
    }

    /// Concat `list` into one silent, frame-filling clip trimmed to `duration`.
    pub fn background_invocation(
        &self,
        list: &Path,
        duration: f64,
        output: &Path,
    ) -> MediaInvocation {
        MediaInvocation::ffmpeg("composition")
            .args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .path_arg(list)
            .args(["-t".to_string(), format!("{:.3}", duration)])
            .args([
                "-vf".to_string(),
                cover_filter(self.config.width, self.config.height),
            ])
            .args(["-c:v", "libx264", "-preset"])
            .arg(self.config.preset.clone())
            .arg("-crf")
            .arg(self.config.crf.to_string())
            .arg("-an")
            .arg("-loglevel")
            .arg(self.config.ffmpeg_log_level.clone())
            .path_arg(output)
    }

    /// Background video + narration + burned subtitles, ending with the
    /// shorter input.
    pub fn mux_invocation(
        &self,
        background: &Path,
        audio: &Path,
        srt: &Path,
        font: Option<&FontChoice>,
        output: &Path,
    ) -> MediaInvocation {
        MediaInvocation::ffmpeg("mux")
            .args(["-y", "-i"])
            .path_arg(background)
            .arg("-i")
            .path_arg(audio)
            .arg("-vf")
            .arg(subtitle_filter(srt, font, self.config.font_size))
            .args(["-map", "0:v:0", "-map", "1:a:0"])
            .args(["-c:v", "libx264", "-preset"])
            .arg(self.config.preset.clone())
            .arg("-crf")
            .arg(self.config.crf.to_string())
            .args(["-c:a", "aac", "-b:a"])
            .arg(self.config.audio_bitrate.clone())
            .args(["-shortest", "-movflags", "+faststart", "-loglevel"])
            .arg(self.config.ffmpeg_log_level.clone())
            .path_arg(output)
    }

    /// Write the concat list into `scratch` and render the background.
    pub async fn compose_background(
        &self,
        clips: &[SelectedClip],
        duration: f64,
        scratch: &Path,
    ) -> Result<PathBuf, AssemblyError> {
        let list = scratch.join("concat.txt");
        tokio::fs::write(&list, concat_list(clips))
            .await
            .map_err(AssemblyError::Scratch)?;

        let output = scratch.join("background.mp4");
        let invocation = self.background_invocation(&list, duration, &output);
        debug!(clips = clips.len(), "Composing background");
        self.runner
            .run(&invocation)
            .await
            .map_err(AssemblyError::Composition)?;
        Ok(output)
    }

    pub async fn mux(
        &self,
        background: &Path,
        audio: &Path,
        srt: &Path,
        font: Option<&FontChoice>,
        output: &Path,
    ) -> Result<(), AssemblyError> {
        let invocation = self.mux_invocation(background, audio, srt, font, output);
        self.runner
            .run(&invocation)
            .await
            .map_err(AssemblyError::Mux)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockMediaRunner;

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(MockMediaRunner::new()), VideoConfig::default())
    }

    fn font() -> FontChoice {
        FontChoice {
            path: PathBuf::from("/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc"),
            family: "Noto Sans CJK KR".into(),
            degraded: false,
        }
    }

    #[test]
    fn test_concat_list_preserves_order_and_quotes() {
        let clips = vec![
            SelectedClip {
                id: 2,
                path: PathBuf::from("/tmp/s/clip_00_2.mp4"),
                duration: 12.0,
            },
            SelectedClip {
                id: 1,
                path: PathBuf::from("/tmp/it's/clip_01_1.mp4"),
                duration: 12.0,
            },
        ];
        assert_eq!(
            concat_list(&clips),
            "file '/tmp/s/clip_00_2.mp4'\nfile '/tmp/it'\\''s/clip_01_1.mp4'\n"
        );
    }

    #[test]
    fn test_cover_filter() {
        assert_eq!(
            cover_filter(1080, 1920),
            "scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"
        );
    }

    #[test]
    fn test_background_invocation() {
        let inv = compositor().background_invocation(
            Path::new("/tmp/s/concat.txt"),
            50.0,
            Path::new("/tmp/s/background.mp4"),
        );
        let args = inv.args.join(" ");
        assert!(args.contains("-f concat -safe 0 -i /tmp/s/concat.txt"));
        assert!(args.contains("-t 50.000"));
        assert!(args.contains("-preset medium -crf 23 -an"));
        assert_eq!(inv.output(), Some("/tmp/s/background.mp4"));
    }

    #[test]
    fn test_mux_invocation() {
        let font = font();
        let inv = compositor().mux_invocation(
            Path::new("/tmp/s/background.mp4"),
            Path::new("/tmp/s/narration.mp3"),
            Path::new("/tmp/s/subtitles.srt"),
            Some(&font),
            Path::new("/tmp/s/final.mp4"),
        );
        let args = inv.args.join(" ");
        assert!(args.contains("-c:a aac -b:a 192k"));
        assert!(args.contains("-shortest"));
        assert!(args.contains("fontsdir=/usr/share/fonts/opentype/noto"));
        assert_eq!(inv.output(), Some("/tmp/s/final.mp4"));
    }

    #[test]
    fn test_subtitle_style() {
        let font = font();
        assert_eq!(
            subtitle_style(Some(&font), 24),
            "FontName=Noto Sans CJK KR,Fontsize=24,PrimaryColour=&HFFFFFF,\
             OutlineColour=&H000000,Outline=2,Shadow=1,Bold=1,Alignment=2"
        );
        assert!(subtitle_style(None, 24).starts_with("Fontsize=24,"));
    }

    #[test]
    fn test_subtitle_filter_escapes_path() {
        let filter = subtitle_filter(Path::new("C:/tmp/sub.srt"), None, 24);
        assert!(filter.starts_with("subtitles=filename=C\\:/tmp/sub.srt:force_style='"));
        assert!(!filter.contains("fontsdir"));
    }
}
