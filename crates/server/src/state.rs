use std::sync::Arc;

use tracing::{info, warn};

use shorts_core::collab::{
    create_text_generator, ApprovalNotifier, GoogleTtsClient, HttpPlatformPublisher, PexelsClient,
    PlatformPublisher, SpeechSynthesizer, StockFootageSearch, TextGenerator, Transcriber,
    Unconfigured, UnconfiguredPlatform, WebhookNotifier, WhisperClient,
};
use shorts_core::collector::{FeedSource, HackerNewsSource, RedditSource};
use shorts_core::media::{FfmpegRunner, MediaRunner};
use shorts_core::record::Platform;
use shorts_core::video::{font_status, FontStatus};
use shorts_core::{
    ApprovalGate, AssemblyServices, AssetStore, AudioSynthesizer, Config, Publisher, RecordStore,
    SanitizedConfig, ScriptGenerator, TopicCollector, VideoAssembler,
};

/// External services injected into the pipeline stages.
pub struct Collaborators {
    pub sources: Vec<Arc<dyn FeedSource>>,
    pub script_llm: Arc<dyn TextGenerator>,
    pub keyword_llm: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub footage: Arc<dyn StockFootageSearch>,
    pub runner: Arc<dyn MediaRunner>,
    pub notifier: Arc<dyn ApprovalNotifier>,
    pub publishers: Vec<Arc<dyn PlatformPublisher>>,
}

impl Collaborators {
    /// Build the real adapters. Services without configuration are replaced
    /// by [`Unconfigured`] so the server still starts.
    pub fn from_config(config: &Config) -> Self {
        let mut sources: Vec<Arc<dyn FeedSource>> = Vec::new();
        if config.collector.hackernews.enabled {
            sources.push(Arc::new(HackerNewsSource::new(
                config.collector.hackernews.clone(),
            )));
        }
        if config.collector.reddit.enabled {
            sources.push(Arc::new(RedditSource::new(config.collector.reddit.clone())));
        }
        info!(count = sources.len(), "Feed sources configured");

        let (script_llm, keyword_llm): (Arc<dyn TextGenerator>, Arc<dyn TextGenerator>) =
            match &config.llm {
                Some(llm) => {
                    info!(provider = ?llm.provider, model = %llm.model, "Initializing text generator");
                    let keyword_model = llm.keyword_model.as_deref().unwrap_or(&llm.model);
                    (
                        create_text_generator(llm, &llm.model),
                        create_text_generator(llm, keyword_model),
                    )
                }
                None => {
                    warn!("No LLM configured; script generation is unavailable");
                    (Arc::new(Unconfigured), Arc::new(Unconfigured))
                }
            };

        let speech: Arc<dyn SpeechSynthesizer> = match &config.tts.api_key {
            Some(key) if !key.is_empty() => Arc::new(GoogleTtsClient::new(
                key.clone(),
                config.tts.api_base.clone(),
                config.tts.timeout_secs,
            )),
            _ => {
                warn!("No TTS API key configured; narration is unavailable");
                Arc::new(Unconfigured)
            }
        };

        let transcriber: Arc<dyn Transcriber> = match &config.transcriber {
            Some(t) => Arc::new(WhisperClient::new(t.clone())),
            None => {
                info!("No transcriber configured; subtitles use estimated timing");
                Arc::new(Unconfigured)
            }
        };

        let footage: Arc<dyn StockFootageSearch> = match &config.footage {
            Some(f) => Arc::new(PexelsClient::new(f.clone())),
            None => {
                warn!("No footage search configured; video assembly is unavailable");
                Arc::new(Unconfigured)
            }
        };

        let notifier: Arc<dyn ApprovalNotifier> = match &config.approval.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(
                url.clone(),
                config.approval.webhook_token.clone(),
                config.approval.timeout_secs,
            )),
            None => {
                warn!("No approval webhook configured; approval requests cannot be sent");
                Arc::new(Unconfigured)
            }
        };

        let endpoints = [
            (Platform::Youtube, &config.publisher.youtube),
            (Platform::Tiktok, &config.publisher.tiktok),
            (Platform::Instagram, &config.publisher.instagram),
        ];
        let publishers = endpoints
            .into_iter()
            .map(|(platform, endpoint)| -> Arc<dyn PlatformPublisher> {
                match endpoint {
                    Some(endpoint) => Arc::new(HttpPlatformPublisher::new(platform, endpoint.clone())),
                    None => Arc::new(UnconfiguredPlatform(platform)),
                }
            })
            .collect();

        Self {
            sources,
            script_llm,
            keyword_llm,
            speech,
            transcriber,
            footage,
            runner: Arc::new(FfmpegRunner::new(&config.video)),
            notifier,
            publishers,
        }
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn RecordStore>,
    collector: TopicCollector,
    scripts: ScriptGenerator,
    audio: AudioSynthesizer,
    video: VideoAssembler,
    approval: ApprovalGate,
    publisher: Publisher,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        collaborators: Collaborators,
    ) -> Self {
        let per_page = config
            .footage
            .as_ref()
            .map(|f| f.per_page)
            .unwrap_or(shorts_core::video::DEFAULT_PER_PAGE);

        let collector = TopicCollector::new(
            Arc::clone(&store),
            collaborators.sources,
            config.collector.clone(),
        );
        let scripts = ScriptGenerator::new(
            Arc::clone(&store),
            collaborators.script_llm,
            config.script.clone(),
        );
        let audio = AudioSynthesizer::new(
            Arc::clone(&store),
            collaborators.speech,
            Arc::clone(&assets),
            config.tts.clone(),
        );
        let video = VideoAssembler::with_per_page(
            Arc::clone(&store),
            Arc::clone(&assets),
            AssemblyServices {
                llm: collaborators.keyword_llm,
                footage: collaborators.footage,
                transcriber: collaborators.transcriber,
                runner: collaborators.runner,
            },
            config.video.clone(),
            per_page,
        );
        let approval = ApprovalGate::new(
            Arc::clone(&store),
            collaborators.notifier,
            Arc::clone(&assets),
            config.approval.clone(),
        );
        let publisher = Publisher::new(
            Arc::clone(&store),
            assets,
            collaborators.publishers,
            config.video.temp_dir.clone(),
        );

        Self {
            config,
            store,
            collector,
            scripts,
            audio,
            video,
            approval,
            publisher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn font_status(&self) -> FontStatus {
        font_status(&self.config.video)
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn collector(&self) -> &TopicCollector {
        &self.collector
    }

    pub fn scripts(&self) -> &ScriptGenerator {
        &self.scripts
    }

    pub fn audio(&self) -> &AudioSynthesizer {
        &self.audio
    }

    pub fn video(&self) -> &VideoAssembler {
        &self.video
    }

    pub fn approval(&self) -> &ApprovalGate {
        &self.approval
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }
}
