//! Titles, descriptions and hashtags fitted to each platform's limits.

use crate::collab::PostMetadata;
use crate::record::Platform;

/// Tags every post carries.
pub const BASE_HASHTAGS: &[&str] = &["#Shorts", "#테크", "#IT", "#기술", "#혁신"];

/// Trigger substring and the tags it adds, checked in order.
pub const HASHTAG_TABLE: &[(&str, &[&str])] = &[
    ("AI", &["#AI", "#인공지능", "#머신러닝"]),
    ("로봇", &["#로봇", "#로보틱스", "#자동화"]),
    ("전기차", &["#전기차", "#EV", "#테슬라"]),
    ("메타버스", &["#메타버스", "#VR", "#AR"]),
    ("블록체인", &["#블록체인", "#암호화폐", "#비트코인"]),
    ("게임", &["#게임", "#게이밍", "#이스포츠"]),
    ("스마트폰", &["#스마트폰", "#모바일", "#갤럭시"]),
    ("우주", &["#우주", "#NASA", "#천문학"]),
];

pub const MAX_HASHTAGS: usize = 15;
pub const DEFAULT_TOPIC_TITLE: &str = "IT 테크 뉴스";
const SIGN_OFF: &str = "🔔 구독과 좋아요 부탁드립니다!";

const YOUTUBE_TITLE_LIMIT: usize = 100;
const TIKTOK_TITLE_LIMIT: usize = 150;
const TIKTOK_HASHTAG_LIMIT: usize = 10;
const INSTAGRAM_DESCRIPTION_LIMIT: usize = 500;

/// Platform-neutral caption for a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub title: String,
    pub description: String,
    pub hashtags: Vec<String>,
}

/// First `max` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Base tags plus table matches, de-duplicated in order and capped.
pub fn hashtags_for(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let matched = HASHTAG_TABLE
        .iter()
        .filter(|(trigger, _)| text.contains(trigger))
        .flat_map(|(_, tags)| tags.iter());
    for tag in BASE_HASHTAGS.iter().chain(matched) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags.truncate(MAX_HASHTAGS);
    tags
}

pub fn build_caption(topic_title: &str, text: &str) -> Caption {
    let topic = match topic_title.trim() {
        "" => DEFAULT_TOPIC_TITLE,
        t => t,
    };
    let hashtags = hashtags_for(text);
    Caption {
        title: format!("{} #Shorts", topic),
        description: format!("{}\n\n{}\n\n{}", text, hashtags.join(" "), SIGN_OFF),
        hashtags,
    }
}

/// Fit `caption` to the limits of `platform`.
pub fn fit_for(platform: Platform, caption: &Caption) -> PostMetadata {
    match platform {
        Platform::Youtube => PostMetadata {
            title: truncate_chars(&caption.title, YOUTUBE_TITLE_LIMIT).to_string(),
            description: caption.description.clone(),
            hashtags: caption.hashtags.clone(),
            extra: vec![
                ("category_id".into(), "28".into()),
                ("privacy_status".into(), "public".into()),
            ],
        },
        Platform::Tiktok => PostMetadata {
            title: truncate_chars(&caption.title, TIKTOK_TITLE_LIMIT).to_string(),
            description: String::new(),
            hashtags: caption
                .hashtags
                .iter()
                .take(TIKTOK_HASHTAG_LIMIT)
                .cloned()
                .collect(),
            extra: Vec::new(),
        },
        Platform::Instagram => PostMetadata {
            title: caption.title.clone(),
            description: format!(
                "{}\n\n{}",
                caption.title,
                truncate_chars(&caption.description, INSTAGRAM_DESCRIPTION_LIMIT)
            ),
            hashtags: caption.hashtags.clone(),
            extra: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("가나다라", 2), "가나");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_hashtags_base_only() {
        assert_eq!(hashtags_for("오늘의 뉴스"), BASE_HASHTAGS.to_vec());
    }

    #[test]
    fn test_hashtags_table_order_and_cap() {
        let tags = hashtags_for("우주로 가는 AI 로봇, 전기차와 게임까지");
        assert_eq!(tags.len(), MAX_HASHTAGS);
        assert_eq!(tags[5], "#AI");
        assert_eq!(tags[8], "#로봇");
        // 우주 is last in the table and falls past the cap
        assert!(!tags.contains(&"#NASA".to_string()));
    }

    #[test]
    fn test_hashtags_trigger_is_case_sensitive() {
        assert!(!hashtags_for("tail risk").contains(&"#AI".to_string()));
    }

    #[test]
    fn test_build_caption() {
        let caption = build_caption("", "로봇이 온다");
        assert_eq!(caption.title, "IT 테크 뉴스 #Shorts");
        assert!(caption.description.starts_with("로봇이 온다\n\n#Shorts #테크"));
        assert!(caption.description.ends_with("\n\n🔔 구독과 좋아요 부탁드립니다!"));
    }

    #[test]
    fn test_platform_limits() {
        let caption = build_caption(&"가".repeat(200), &"AI ".repeat(400));

        let yt = fit_for(Platform::Youtube, &caption);
        assert_eq!(yt.title.chars().count(), 100);

        let tt = fit_for(Platform::Tiktok, &caption);
        assert_eq!(tt.title.chars().count(), 150);
        assert!(tt.hashtags.len() <= 10);

        let ig = fit_for(Platform::Instagram, &caption);
        let expected_len = caption.title.chars().count() + 2 + 500;
        assert_eq!(ig.description.chars().count(), expected_len);
        assert!(ig.description.starts_with(&caption.title));
    }
}
