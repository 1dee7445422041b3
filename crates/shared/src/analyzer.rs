use anyhow::Result;
use std::sync::Arc;

use crate::config::Category;
use crate::llm::ChatClient;
use crate::models::{Analysis, Engagement, Item, Sentiment};

/// Category label used when no categories are configured at all.
pub const DEFAULT_CATEGORY: &str = "AI 相关";

const SUMMARY_MAX_CHARS: usize = 50;
const MAX_KEY_POINTS: usize = 3;

/// Bilingual keyword tables for the deterministic sentiment pass.
const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "amazing", "awesome", "excellent", "好消息", "突破", "成功",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "problem", "issue", "bug", "坏消息", "失败", "问题",
];

/// Attaches an [`Analysis`] to each collected item.
///
/// Classification, sentiment and importance are always computed
/// deterministically. Summary and key points use the chat client when one
/// is configured, each with its own per-item fallback, so a single failed
/// call never aborts the batch.
pub struct Analyzer {
    client: Option<Arc<ChatClient>>,
    categories: Vec<Category>,
}

impl Analyzer {
    pub fn new(client: Option<Arc<ChatClient>>, categories: Vec<Category>) -> Self {
        Self { client, categories }
    }

    pub async fn analyze_batch(&self, items: Vec<Item>) -> Vec<Item> {
        let total = items.len();
        let mut analyzed = Vec::with_capacity(total);

        for (i, mut item) in items.into_iter().enumerate() {
            item.analysis = Some(self.analyze_item(&item).await);
            if (i + 1) % 10 == 0 {
                tracing::info!(done = i + 1, total, "analysis progress");
            }
            analyzed.push(item);
        }

        analyzed
    }

    async fn analyze_item(&self, item: &Item) -> Analysis {
        let category = self.classify(&item.raw_text);
        let sentiment = classify_sentiment(&item.raw_text);
        let importance = importance_score(&item.engagement, sentiment);

        let (summary, key_points) = match &self.client {
            Some(client) => {
                let summary = match self.request_summary(client, item).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        tracing::warn!(
                            title = %item.title,
                            error = %e,
                            "summary generation failed, falling back to title"
                        );
                        truncate_with_ellipsis(&item.title, SUMMARY_MAX_CHARS)
                    }
                };
                let key_points = match self.request_key_points(client, item).await {
                    Ok(points) => points,
                    Err(e) => {
                        tracing::warn!(
                            title = %item.title,
                            error = %e,
                            "key point extraction failed"
                        );
                        Vec::new()
                    }
                };
                (summary, key_points)
            }
            None => (
                truncate_with_ellipsis(&item.title, SUMMARY_MAX_CHARS),
                Vec::new(),
            ),
        };

        Analysis {
            category,
            summary,
            key_points,
            sentiment,
            importance,
        }
    }

    /// First configured category with a case-insensitive keyword match wins.
    fn classify(&self, text: &str) -> String {
        let lower = text.to_lowercase();

        for category in &self.categories {
            if category
                .keywords
                .iter()
                .any(|keyword| lower.contains(&keyword.to_lowercase()))
            {
                return category.name.clone();
            }
        }

        self.categories
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }

    async fn request_summary(&self, client: &ChatClient, item: &Item) -> Result<String> {
        let prompt = format!(
            "请用中文总结以下内容，一句话概括（20字以内）：\n\n\
             标题: {}\n\
             内容: {}\n\n\
             只返回摘要，不要其他内容。",
            item.title,
            truncate_chars(&item.raw_text, 500)
        );

        let response = client.complete(&prompt, 100, None).await?;
        let summary = response.replace("摘要:", "").replace("总结:", "");
        Ok(truncate_with_ellipsis(summary.trim(), SUMMARY_MAX_CHARS))
    }

    async fn request_key_points(&self, client: &ChatClient, item: &Item) -> Result<Vec<String>> {
        let prompt = format!(
            "请从以下内容中提取3个关键要点：\n\n\
             标题: {}\n\
             内容: {}\n\n\
             请以列表形式返回，每行一个要点，格式如下：\n\
             - 要点1\n\
             - 要点2\n\
             - 要点3\n\n\
             每个要点不超过15个字。",
            item.title,
            truncate_chars(&item.raw_text, 800)
        );

        let response = client.complete(&prompt, 150, None).await?;
        Ok(parse_bullet_lines(&response))
    }
}

/// Count bilingual keyword hits; strictly more positive than negative wins,
/// ties (including zero/zero) are neutral. Never calls out, never fails.
pub fn classify_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Importance from engagement threshold bands plus a positive-sentiment
/// bonus, clamped to 1..=5. A zero result is coerced to 1.
pub fn importance_score(engagement: &Engagement, sentiment: Sentiment) -> u8 {
    let mut score: u8 = 0;

    if engagement.score > 1000 || engagement.comments > 500 {
        score += 3;
    } else if engagement.score > 500 || engagement.comments > 200 {
        score += 2;
    } else if engagement.score > 100 || engagement.comments > 50 {
        score += 1;
    }

    if sentiment == Sentiment::Positive {
        score += 1;
    }

    score.clamp(1, 5)
}

/// Keep only lines starting with a recognized bullet marker, at most three.
fn parse_bullet_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let point = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("• "))?;
            let point = point.trim();
            (!point.is_empty()).then(|| point.to_string())
        })
        .take(MAX_KEY_POINTS)
        .collect()
}

/// Truncate to `max_chars` characters, appending "..." only when truncated.
/// Char-based, so multi-byte text is safe.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(name: &str, keywords: &[&str]) -> Category {
        Category {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn item_with(score: u32, comments: u32, title: &str, body: &str) -> Item {
        Item::new(
            "t3_x",
            "LocalLLaMA",
            title,
            body,
            "unknown",
            "https://example.com",
            Utc::now(),
            Engagement::new(score, comments),
        )
    }

    #[test]
    fn classify_first_matching_category_wins() {
        let analyzer = Analyzer::new(
            None,
            vec![
                category("大模型", &["llm", "gpt"]),
                category("AI 工具", &["agent", "llm"]),
            ],
        );
        // Matches both keyword sets; configured order decides.
        assert_eq!(analyzer.classify("a new LLM agent framework"), "大模型");
    }

    #[test]
    fn classify_is_case_insensitive() {
        let analyzer = Analyzer::new(None, vec![category("大模型", &["GPT"])]);
        assert_eq!(analyzer.classify("gpt-5 is out"), "大模型");
    }

    #[test]
    fn classify_falls_back_to_first_category() {
        let analyzer = Analyzer::new(
            None,
            vec![category("大模型", &["llm"]), category("其他", &["misc"])],
        );
        assert_eq!(analyzer.classify("nothing relevant"), "大模型");
    }

    #[test]
    fn classify_without_categories_uses_default_label() {
        let analyzer = Analyzer::new(None, Vec::new());
        assert_eq!(analyzer.classify("anything"), DEFAULT_CATEGORY);
    }

    #[test]
    fn sentiment_is_deterministic_and_symmetric() {
        assert_eq!(classify_sentiment(""), Sentiment::Neutral);
        assert_eq!(classify_sentiment("nothing notable"), Sentiment::Neutral);
        // One positive and one negative keyword tie back to neutral.
        assert_eq!(classify_sentiment("good but a problem"), Sentiment::Neutral);
        assert_eq!(classify_sentiment("a great success"), Sentiment::Positive);
        assert_eq!(classify_sentiment("terrible bug report"), Sentiment::Negative);
    }

    #[test]
    fn sentiment_matches_chinese_keywords() {
        assert_eq!(classify_sentiment("重大突破"), Sentiment::Positive);
        assert_eq!(classify_sentiment("项目失败了"), Sentiment::Negative);
    }

    #[test]
    fn importance_engagement_bands() {
        let neutral = Sentiment::Neutral;
        assert_eq!(importance_score(&Engagement::new(0, 0), neutral), 1);
        assert_eq!(importance_score(&Engagement::new(101, 0), neutral), 1);
        assert_eq!(importance_score(&Engagement::new(0, 51), neutral), 1);
        assert_eq!(importance_score(&Engagement::new(501, 0), neutral), 2);
        assert_eq!(importance_score(&Engagement::new(0, 201), neutral), 2);
        assert_eq!(importance_score(&Engagement::new(1001, 0), neutral), 3);
        assert_eq!(importance_score(&Engagement::new(1200, 600), neutral), 3);
    }

    #[test]
    fn importance_positive_sentiment_adds_one() {
        assert_eq!(
            importance_score(&Engagement::new(1200, 600), Sentiment::Positive),
            4
        );
        assert_eq!(
            importance_score(&Engagement::new(0, 0), Sentiment::Positive),
            1
        );
    }

    #[test]
    fn importance_never_zero_and_never_above_five() {
        assert_eq!(
            importance_score(&Engagement::new(0, 0), Sentiment::Negative),
            1
        );
        let high = importance_score(&Engagement::new(100_000, 100_000), Sentiment::Positive);
        assert!(high >= 1 && high <= 5);
    }

    #[test]
    fn parse_bullet_lines_recognizes_markers_only() {
        let text = "intro line\n- 第一点\n• 第二点\n1. numbered is ignored\n- 第三点\n- 第四点";
        assert_eq!(parse_bullet_lines(text), vec!["第一点", "第二点", "第三点"]);
    }

    #[test]
    fn parse_bullet_lines_skips_empty_points() {
        assert_eq!(parse_bullet_lines("- \n-  \n- real"), vec!["real"]);
    }

    #[test]
    fn truncate_with_ellipsis_only_when_needed() {
        assert_eq!(truncate_with_ellipsis("short", 50), "short");

        let exactly_50: String = "a".repeat(50);
        assert_eq!(truncate_with_ellipsis(&exactly_50, 50), exactly_50);

        let over = "a".repeat(51);
        let truncated = truncate_with_ellipsis(&over, 50);
        assert_eq!(truncated.chars().count(), 53);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncate_with_ellipsis_counts_chars_not_bytes() {
        let chinese = "中".repeat(60);
        let truncated = truncate_with_ellipsis(&chinese, 50);
        assert!(truncated.starts_with(&"中".repeat(50)));
        assert!(truncated.ends_with("..."));
    }

    #[tokio::test]
    async fn no_client_yields_deterministic_analysis_for_every_item() {
        let analyzer = Analyzer::new(None, vec![category("大模型", &["llm"])]);
        let long_title = "x".repeat(60);
        let items = vec![
            item_with(1200, 600, "llm release", ""),
            item_with(10, 2, &long_title, ""),
        ];

        let analyzed = analyzer.analyze_batch(items).await;
        assert_eq!(analyzed.len(), 2);

        let first = analyzed[0].analysis.as_ref().unwrap();
        assert_eq!(first.category, "大模型");
        assert_eq!(first.summary, "llm release");
        assert!(first.key_points.is_empty());
        assert_eq!(first.sentiment, Sentiment::Neutral);
        assert_eq!(first.importance, 3);

        let second = analyzed[1].analysis.as_ref().unwrap();
        assert_eq!(second.importance, 1);
        assert!(second.summary.ends_with("..."));
        assert_eq!(second.summary.chars().count(), 53);
    }

    #[test]
    fn parse_bullet_lines_empty_response_gives_empty_list() {
        assert!(parse_bullet_lines("no bullets at all").is_empty());
    }
}
