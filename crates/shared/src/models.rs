use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement numbers extracted from a feed entry.
///
/// Reddit's Atom feeds do not carry a real upvote ratio or award count, so
/// those fields keep their collector defaults (0.9 and 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub score: u32,
    pub comments: u32,
    pub upvote_ratio: f32,
    pub awards: u32,
}

impl Engagement {
    pub fn new(score: u32, comments: u32) -> Self {
        Self {
            score,
            comments,
            upvote_ratio: 0.9,
            awards: 0,
        }
    }
}

/// One normalized collected post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub source: String,
    pub subreddit: String,
    pub title: String,
    pub selftext: String,
    /// Always `title + " " + selftext`. Derived at construction, never
    /// mutated independently.
    pub raw_text: String,
    pub author: String,
    pub url: String,
    pub created_utc: DateTime<Utc>,
    pub engagement: Engagement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl Item {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        subreddit: impl Into<String>,
        title: impl Into<String>,
        selftext: impl Into<String>,
        author: impl Into<String>,
        url: impl Into<String>,
        created_utc: DateTime<Utc>,
        engagement: Engagement,
    ) -> Self {
        let title = title.into();
        let selftext = selftext.into();
        let raw_text = format!("{} {}", title, selftext);

        Self {
            id: id.into(),
            source: "reddit".to_string(),
            subreddit: subreddit.into(),
            title,
            selftext,
            raw_text,
            author: author.into(),
            url: url.into(),
            created_utc,
            engagement,
            analysis: None,
        }
    }
}

/// Sentiment label attached to an item during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Sentiment::Positive => "😊",
            Sentiment::Negative => "😟",
            Sentiment::Neutral => "😐",
        }
    }
}

/// Derived analysis attached to an [`Item`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub category: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
    /// Importance score, always in 1..=5.
    pub importance: u8,
}

/// A generated product concept for one top-ranked item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub name: String,
    pub description: String,
    pub target_users: String,
    pub features: Vec<String>,
    pub score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn raw_text_is_title_plus_selftext() {
        let item = Item::new(
            "t3_abc",
            "LocalLLaMA",
            "New model released",
            "It benchmarks well",
            "someone",
            "https://example.com",
            Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap(),
            Engagement::new(10, 2),
        );
        assert_eq!(item.raw_text, "New model released It benchmarks well");
        assert_eq!(item.source, "reddit");
        assert!(item.analysis.is_none());
    }

    #[test]
    fn sentiment_labels_and_emoji() {
        assert_eq!(Sentiment::Positive.label(), "positive");
        assert_eq!(Sentiment::Negative.label(), "negative");
        assert_eq!(Sentiment::Neutral.label(), "neutral");
        assert_eq!(Sentiment::Neutral.emoji(), "😐");
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
    }
}
