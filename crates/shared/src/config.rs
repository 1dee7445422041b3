use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level YAML configuration for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: Sources,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_ideas")]
    pub max_ideas: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sources {
    pub reddit: RedditSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditSource {
    #[serde(default)]
    pub subreddits: Vec<String>,
    /// Minimum feed score required to keep an entry. Entries below this
    /// threshold are dropped at collection time.
    #[serde(default)]
    pub min_score: u32,
}

/// One category rule: the first category whose keyword matches wins.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_top_n() -> usize {
    10
}

fn default_max_ideas() -> usize {
    1
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
