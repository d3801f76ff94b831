//! External media tooling (ffmpeg, ffprobe).

mod process;

pub use process::{
    parse_probe_duration, probe_duration, probe_invocation, FfmpegRunner, MediaInvocation,
    MediaRunner, MediaTool, ProcessError, ProcessOutput,
};
