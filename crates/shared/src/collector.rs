use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration as StdDuration;

use crate::config::RedditSource;
use crate::models::{Engagement, Item};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Pause between subreddit fetches to stay under Reddit's rate limits.
const FETCH_PAUSE: StdDuration = StdDuration::from_secs(1);

fn points_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s+points?").expect("hardcoded regex is valid"))
}

fn comments_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s+comments?").expect("hardcoded regex is valid"))
}

/// Collects recent posts from configured subreddits via their Atom feeds.
pub struct RedditCollector {
    client: Client,
    config: RedditSource,
    base_url: String,
}

/// One raw `<entry>` pulled out of an Atom feed, before normalization.
#[derive(Debug, Clone, Default)]
struct FeedEntry {
    id: String,
    title: String,
    author: String,
    link: String,
    published: String,
    summary: String,
}

impl RedditCollector {
    pub fn new(config: RedditSource) -> Result<Self> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; HotspotDigest/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the collector at a different feed host. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch every configured subreddit and return all entries newer than
    /// `now - lookback_hours`.
    ///
    /// Per-subreddit failures are logged and skipped; an empty result is a
    /// legitimate outcome, not an error.
    pub async fn collect(&self, lookback_hours: i64) -> Vec<Item> {
        let cutoff = Utc::now() - Duration::hours(lookback_hours);
        let mut all_items = Vec::new();

        for (i, subreddit) in self.config.subreddits.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(FETCH_PAUSE).await;
            }

            match self.collect_subreddit(subreddit, cutoff).await {
                Ok(items) => {
                    tracing::info!(
                        subreddit = %subreddit,
                        count = items.len(),
                        "collected subreddit feed"
                    );
                    all_items.extend(items);
                }
                Err(e) => {
                    tracing::warn!(
                        subreddit = %subreddit,
                        error = %e,
                        "subreddit collection failed, skipping"
                    );
                }
            }
        }

        tracing::info!(total = all_items.len(), "reddit collection finished");
        all_items
    }

    async fn collect_subreddit(
        &self,
        subreddit: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Item>> {
        let url = format!("{}/r/{}/.rss", self.base_url, subreddit);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch subreddit feed")?;

        if !response.status().is_success() {
            anyhow::bail!("feed request returned {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("Failed to read feed body")?;

        let entries = parse_feed(&body)?;
        let min_score = self.config.min_score;

        Ok(entries
            .iter()
            .filter_map(|entry| entry_to_item(entry, subreddit, cutoff))
            .filter(|item| item.engagement.score >= min_score)
            .collect())
    }
}

/// Parse a Reddit Atom feed into raw entries.
fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current = FeedEntry::default();
    let mut in_entry = false;
    let mut in_author = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("").to_string();
                match name.as_str() {
                    "entry" => {
                        in_entry = true;
                        in_author = false;
                        current = FeedEntry::default();
                    }
                    "author" if in_entry => in_author = true,
                    _ => {}
                }
                current_tag = name;
            }
            Ok(Event::Empty(e)) => {
                // Atom links are empty elements carrying an href attribute.
                if in_entry && e.name().as_ref() == b"link" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"href" {
                            current.link = String::from_utf8_lossy(&attr.value).into_owned();
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                match name {
                    "author" => in_author = false,
                    "entry" if in_entry => {
                        in_entry = false;
                        if !current.title.is_empty() {
                            entries.push(current.clone());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_entry {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    if in_author {
                        if current_tag == "name" {
                            current.author = text;
                        }
                    } else {
                        match current_tag.as_str() {
                            "id" => current.id = text,
                            "title" => current.title = text,
                            "published" => current.published = text,
                            "content" | "summary" => current.summary = strip_html(&text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_entry && !in_author {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    match current_tag.as_str() {
                        "title" => current.title = text,
                        "content" | "summary" => current.summary = strip_html(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => anyhow::bail!("feed XML parse error: {e}"),
            _ => {}
        }
    }

    Ok(entries)
}

/// Normalize one feed entry into an [`Item`].
///
/// Returns `None` for entries without a parseable publication timestamp or
/// older than the cutoff. Missing optional fields get defaults instead of
/// failing the record.
fn entry_to_item(entry: &FeedEntry, subreddit: &str, cutoff: DateTime<Utc>) -> Option<Item> {
    let published = entry.published.parse::<DateTime<Utc>>().ok()?;

    if published < cutoff {
        return None;
    }

    let score = capture_count(points_re(), &entry.summary);
    let comments = capture_count(comments_re(), &entry.summary);

    let author = if entry.author.is_empty() {
        "unknown".to_string()
    } else {
        entry.author.clone()
    };

    let id = entry.id.rsplit('/').next().unwrap_or("").to_string();

    Some(Item::new(
        id,
        subreddit,
        &entry.title,
        &entry.summary,
        author,
        &entry.link,
        published,
        Engagement::new(score, comments),
    ))
}

fn capture_count(re: &Regex, text: &str) -> u32 {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Strip HTML tags from a string and normalize whitespace.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
