//! Prometheus metrics for pipeline stages.
//!
//! This module provides metrics for:
//! - Stage runs and durations (collect, script, audio, video, approval, publish)
//! - Video assembly internals (keyword source, clips, subtitle source, fonts)
//! - Platform uploads
//! - External services (LLM, TTS, footage, ...)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Stage Metrics
// =============================================================================

/// Stage invocations by stage and result.
pub static STAGE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_stage_runs_total", "Pipeline stage invocations"),
        &["stage", "result"], // result: "success", "error", "noop"
    )
    .unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shorts_stage_duration_seconds",
            "Duration of a pipeline stage invocation",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["stage"],
    )
    .unwrap()
});

/// Topics persisted by the collector.
pub static TOPICS_COLLECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("shorts_topics_collected_total", "Topics persisted").unwrap()
});

/// Feed source failures.
pub static SOURCE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_source_failures_total", "Feed sources that failed"),
        &["source"],
    )
    .unwrap()
});

/// Scripts generated by mode.
pub static SCRIPTS_GENERATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_scripts_generated_total", "Scripts generated"),
        &["mode"],
    )
    .unwrap()
});

// =============================================================================
// Video Assembly Metrics
// =============================================================================

/// Where keywords came from.
pub static KEYWORD_SOURCE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_keyword_source_total", "Keyword extraction path"),
        &["source"], // "llm", "table", "generic"
    )
    .unwrap()
});

/// Clips downloaded for backgrounds.
pub static CLIPS_DOWNLOADED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_clips_downloaded_total", "Background clip downloads"),
        &["result"],
    )
    .unwrap()
});

/// Where subtitle timings came from.
pub static SUBTITLE_SOURCE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_subtitle_source_total", "Subtitle timing source"),
        &["source"], // "transcribed", "estimated"
    )
    .unwrap()
});

/// Renders without a preferred CJK font.
pub static DEGRADED_FONT_RENDERS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shorts_degraded_font_renders_total",
        "Videos rendered without a preferred font",
    )
    .unwrap()
});

/// Media tool invocations.
pub static MEDIA_PROCESS_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_media_process_runs_total", "ffmpeg/ffprobe runs"),
        &["step", "result"],
    )
    .unwrap()
});

// =============================================================================
// Publishing Metrics
// =============================================================================

/// Upload attempts by platform and result.
pub static UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_uploads_total", "Platform upload attempts"),
        &["platform", "result"],
    )
    .unwrap()
});

/// Approval decisions.
pub static APPROVAL_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_approval_decisions_total", "Reviewer decisions"),
        &["decision"],
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shorts_external_service_duration_seconds",
            "External service request duration",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["service"],
    )
    .unwrap()
});

/// External service requests.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shorts_external_service_requests_total",
            "External service requests",
        ),
        &["service", "result"],
    )
    .unwrap()
});

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_llm_tokens_total", "LLM tokens used"),
        &["provider", "type"], // type: "input", "output"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Stages
        Box::new(STAGE_RUNS.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(TOPICS_COLLECTED.clone()),
        Box::new(SOURCE_FAILURES.clone()),
        Box::new(SCRIPTS_GENERATED.clone()),
        // Video assembly
        Box::new(KEYWORD_SOURCE.clone()),
        Box::new(CLIPS_DOWNLOADED.clone()),
        Box::new(SUBTITLE_SOURCE.clone()),
        Box::new(DEGRADED_FONT_RENDERS.clone()),
        Box::new(MEDIA_PROCESS_RUNS.clone()),
        // Publishing
        Box::new(UPLOADS.clone()),
        Box::new(APPROVAL_DECISIONS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(LLM_TOKENS.clone()),
    ]
}

/// Record the outcome and duration of a stage invocation.
pub fn observe_stage(stage: &str, result: &str, started: std::time::Instant) {
    STAGE_RUNS.with_label_values(&[stage, result]).inc();
    STAGE_DURATION
        .with_label_values(&[stage])
        .observe(started.elapsed().as_secs_f64());
}
