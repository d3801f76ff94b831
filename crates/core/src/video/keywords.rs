//! Visual search terms for background footage.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::collab::{CompletionRequest, TextGenerator};
use crate::metrics;

/// Keywords used per script.
pub const MAX_KEYWORDS: usize = 3;

/// Trigger substring and the footage terms it implies. Order matters: matches
/// are concatenated in table order before capping.
pub const KEYWORD_TABLE: &[(&str, [&str; 3])] = &[
    ("AI", ["artificial intelligence", "AI technology", "neural network"]),
    ("인공지능", ["artificial intelligence", "AI technology", "machine learning"]),
    ("로봇", ["robot", "robotics", "automation"]),
    ("코딩", ["coding", "programming", "developer"]),
    ("프로그래밍", ["programming", "coding", "software development"]),
    ("스마트폰", ["smartphone", "mobile", "technology"]),
    ("우주", ["space", "astronomy", "satellite"]),
    ("게임", ["gaming", "video game", "esports"]),
    ("블록체인", ["blockchain", "cryptocurrency", "bitcoin"]),
    ("암호화폐", ["cryptocurrency", "blockchain", "bitcoin"]),
    ("메타버스", ["metaverse", "virtual reality", "VR"]),
    ("5G", ["5G", "network", "connectivity"]),
    ("전기차", ["electric car", "EV", "Tesla"]),
    ("양자컴퓨터", ["quantum computing", "quantum", "supercomputer"]),
    ("반도체", ["semiconductor", "chip", "technology"]),
    ("엔비디아", ["Nvidia", "GPU", "graphics card"]),
    ("테슬라", ["Tesla", "electric vehicle", "innovation"]),
    ("애플", ["Apple", "iPhone", "technology"]),
    ("구글", ["Google", "tech company", "innovation"]),
    ("마이크로소프트", ["Microsoft", "tech company", "software"]),
];

/// Used when nothing in the table matches.
pub const GENERIC_KEYWORDS: &[&str] = &["technology", "innovation", "digital", "modern", "abstract"];

/// Where a keyword set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordSource {
    Llm,
    Table,
    Generic,
}

impl KeywordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordSource::Llm => "llm",
            KeywordSource::Table => "table",
            KeywordSource::Generic => "generic",
        }
    }
}

/// Case-insensitive trigger match. ASCII triggers must not touch other
/// ASCII letters or digits, so "AI" does not fire inside "said"; Hangul
/// particles may follow directly ("AI가").
fn mentions(haystack: &str, trigger: &str) -> bool {
    let needle = trigger.to_lowercase();
    if !needle.is_ascii() {
        return haystack.contains(&needle);
    }
    haystack.match_indices(&needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Table lookup: case-insensitive match, table order, capped.
pub fn fallback_keywords(text: &str) -> (Vec<String>, KeywordSource) {
    let haystack = text.to_lowercase();
    let matched: Vec<String> = KEYWORD_TABLE
        .iter()
        .filter(|(trigger, _)| mentions(&haystack, trigger))
        .flat_map(|(_, keywords)| keywords.iter().map(|k| k.to_string()))
        .take(MAX_KEYWORDS)
        .collect();

    if matched.is_empty() {
        let generic = GENERIC_KEYWORDS
            .iter()
            .take(MAX_KEYWORDS)
            .map(|k| k.to_string())
            .collect();
        (generic, KeywordSource::Generic)
    } else {
        (matched, KeywordSource::Table)
    }
}

/// Split a comma-separated model answer into at most three terms.
pub fn parse_keyword_list(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(|k| k.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

fn keyword_prompt(text: &str) -> String {
    format!(
        "Extract exactly 3 English keywords for searching stock video footage that \
         visually represents this Korean tech script. Answer with the keywords only, \
         separated by commas.\n\nScript:\n{}",
        text
    )
}

pub struct KeywordExtractor {
    llm: Arc<dyn TextGenerator>,
    temperature: f32,
    max_tokens: u32,
}

impl KeywordExtractor {
    pub fn new(llm: Arc<dyn TextGenerator>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens,
        }
    }

    /// Ask the model first; use the table when it fails or answers nothing.
    pub async fn extract(&self, text: &str) -> (Vec<String>, KeywordSource) {
        let request = CompletionRequest::new(keyword_prompt(text))
            .with_system("You are a video editor choosing B-roll footage.")
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let (keywords, source) = match self.llm.complete(request).await {
            Ok(completion) => {
                let keywords = parse_keyword_list(&completion.text);
                if keywords.is_empty() {
                    warn!("Keyword model returned no terms, using table");
                    fallback_keywords(text)
                } else {
                    (keywords, KeywordSource::Llm)
                }
            }
            Err(e) => {
                warn!(error = %e, "Keyword extraction failed, using table");
                fallback_keywords(text)
            }
        };

        metrics::KEYWORD_SOURCE
            .with_label_values(&[source.as_str()])
            .inc();
        debug!(keywords = ?keywords, source = source.as_str(), "Extracted keywords");
        (keywords, source)
    }
}
