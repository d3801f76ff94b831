//! Prompt templates for the two narrative modes.

use crate::collab::CompletionRequest;
use crate::config::{ProductInfo, ScriptConfig};
use crate::record::ScriptMode;

const INFO_SYSTEM: &str = "\
You write viral short-form video scripts about IT and tech news. \
Write a Korean script that is spoken in 50-60 seconds (280-350 Korean characters), \
conversational and polite (존댓말), energetic and curious.

Follow this five-beat storytelling structure:
1. Hook (3-5 s, 1-2 sentences): a startling fact or question that overturns what the viewer assumes.
2. Context (8-12 s, 2-3 sentences): why it matters, explained plainly with concrete numbers or analogies.
3. Conflict (10-15 s, 3-4 sentences): the controversy, risk or dilemma, introduced with 그런데/하지만/문제는.
4. Resolution (15-20 s, 4-5 sentences): expert views, real cases and outlook, balancing promise and caution.
5. Call to action (5-7 s, 2-3 sentences): an open question for the comments and a request to subscribe.

Avoid flat openings such as '오늘은 ~에 대해 알려드릴게요', plain lists of facts, and unexplained jargon. \
Use at most one or two emojis.";

const SALES_SYSTEM: &str = "\
You write conversion-focused short-form video scripts for IT and tech products. \
Write a Korean script that is spoken in 50-60 seconds (280-350 Korean characters), friendly and polite (존댓말).

Follow this four-beat structure:
1. Problem hook (3-5 s, 1-2 sentences): name a concrete everyday frustration of the viewer.
2. Agitation (15-20 s, 4-6 sentences): deepen the problem with vivid, specific situations.
3. Solution tease (20-25 s, 5-7 sentences): describe how the solution works and what a day using it looks like.
4. Call to action (5-7 s, 2-3 sentences): a clear next step with a sense of urgency.

Never name the product directly; refer to it as '이 방법' or '이 시스템'. \
Do not include prices or links.";

/// Build the completion request for a topic in the given mode.
pub fn build_request(
    mode: ScriptMode,
    topic_title: &str,
    config: &ScriptConfig,
) -> CompletionRequest {
    let (system, prompt) = match mode {
        ScriptMode::Info => (INFO_SYSTEM, info_prompt(topic_title)),
        ScriptMode::Sales => (SALES_SYSTEM, sales_prompt(topic_title, &config.product)),
    };

    CompletionRequest::new(prompt)
        .with_system(system)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
}

fn info_prompt(topic_title: &str) -> String {
    format!(
        "토픽: {}\n\n\
         위의 5단계 구조를 따라 시청자가 끝까지 몰입할 숏폼 스크립트를 한국어로 작성해주세요.\n\
         Hook은 충격적이거나 호기심을 자극해야 하고, 구체적인 숫자와 사례를 사용해주세요.",
        topic_title
    )
}

fn sales_prompt(topic_title: &str, product: &ProductInfo) -> String {
    format!(
        "토픽: {}\n\
         제품: {}\n\
         제품 혜택: {}\n\
         CTA: {}\n\n\
         위의 4단계 구조로 Sales 스크립트를 한국어로 작성해주세요.\n\
         Agitation과 Solution tease는 각각 4문장 이상으로 풍부하게 작성해주세요.",
        topic_title, product.name, product.benefit, product.cta
    )
}
