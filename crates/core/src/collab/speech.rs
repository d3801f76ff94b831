//! Text-to-speech.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, CollaboratorError};
use crate::config::VoiceProfile;

/// Encoded narration returned by a synthesizer.
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    /// MP3 bytes.
    pub audio: Vec<u8>,
    /// Playback length, when the service reports it.
    pub duration_seconds: Option<f64>,
}

/// Converts text into spoken audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
    ) -> Result<SynthesizedSpeech, CollaboratorError>;
}

/// Google Cloud Text-to-Speech over its REST API.
pub struct GoogleTtsClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GoogleTtsClient {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
    sample_rate_hertz: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

fn build_request<'a>(text: &'a str, voice: &'a VoiceProfile) -> SynthesizeRequest<'a> {
    SynthesizeRequest {
        input: SynthesisInput { text },
        voice: VoiceSelection {
            language_code: &voice.language_code,
            name: &voice.name,
        },
        audio_config: AudioConfig {
            audio_encoding: "MP3",
            speaking_rate: voice.speaking_rate,
            pitch: voice.pitch,
            sample_rate_hertz: voice.sample_rate_hz,
        },
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
    ) -> Result<SynthesizedSpeech, CollaboratorError> {
        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.api_base))
            .query(&[("key", self.api_key.as_str())])
            .json(&build_request(text, voice))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: SynthesizeResponse = response.json().await?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| CollaboratorError::invalid_response(format!("audioContent: {}", e)))?;

        if audio.is_empty() {
            return Err(CollaboratorError::invalid_response("empty audio content"));
        }

        // The v1 API does not report playback length.
        Ok(SynthesizedSpeech {
            audio,
            duration_seconds: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let voice = VoiceProfile::default();
        let json = serde_json::to_value(build_request("안녕하세요", &voice)).unwrap();

        assert_eq!(json["input"]["text"], "안녕하세요");
        assert_eq!(json["voice"]["languageCode"], "ko-KR");
        assert_eq!(json["voice"]["name"], "ko-KR-Neural2-A");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
        assert_eq!(json["audioConfig"]["speakingRate"], 1.05);
        assert_eq!(json["audioConfig"]["sampleRateHertz"], 24000);
    }
}
