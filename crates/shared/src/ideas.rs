use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::analyzer::DEFAULT_CATEGORY;
use crate::llm::{extract_json, ChatClient};
use crate::models::{Idea, Item};

const MAX_FEATURES: usize = 4;
const DEFAULT_IDEA_NAME: &str = "未命名";
const DEFAULT_IDEA_SCORE: u8 = 80;

/// Generates product ideas for top-ranked items.
///
/// One chat call per item, one attempt per call. Any failure — network,
/// malformed JSON, missing fields — resolves to the deterministic fallback
/// pair; there is no retry and no caching.
pub struct IdeaGenerator {
    client: Option<Arc<ChatClient>>,
    max_ideas: usize,
}

#[derive(Deserialize)]
struct IdeasPayload {
    #[serde(default)]
    ideas: Vec<RawIdea>,
}

/// Idea shape as returned by the model, before field-level defaults.
#[derive(Deserialize)]
struct RawIdea {
    name: Option<String>,
    description: Option<String>,
    features: Option<Vec<String>>,
    target_users: Option<String>,
    score: Option<u8>,
}

impl IdeaGenerator {
    pub fn new(client: Option<Arc<ChatClient>>, max_ideas: usize) -> Self {
        Self { client, max_ideas }
    }

    pub async fn generate_for_item(&self, item: &Item) -> Vec<Idea> {
        let category = item
            .analysis
            .as_ref()
            .map(|a| a.category.as_str())
            .unwrap_or(DEFAULT_CATEGORY);

        let Some(client) = &self.client else {
            return fallback_ideas(category);
        };

        match self.request_ideas(client, item, category).await {
            Ok(ideas) => {
                tracing::info!(title = %item.title, count = ideas.len(), "generated ideas");
                ideas
            }
            Err(e) => {
                tracing::warn!(
                    title = %item.title,
                    error = %e,
                    "idea generation failed, using fallback ideas"
                );
                fallback_ideas(category)
            }
        }
    }

    /// Generate ideas for every top-ranked item, keyed by item title.
    ///
    /// Items sharing an identical title overwrite earlier entries in the
    /// map; an accepted limitation of title keying.
    pub async fn generate_batch(&self, top_items: &[Item]) -> HashMap<String, Vec<Idea>> {
        let mut results = HashMap::new();

        for (i, item) in top_items.iter().enumerate() {
            tracing::info!(
                rank = i + 1,
                total = top_items.len(),
                title = %item.title,
                "generating ideas for top item"
            );
            let ideas = self.generate_for_item(item).await;
            results.insert(item.title.clone(), ideas);
        }

        results
    }

    async fn request_ideas(
        &self,
        client: &ChatClient,
        item: &Item,
        category: &str,
    ) -> Result<Vec<Idea>> {
        let summary = item
            .analysis
            .as_ref()
            .map(|a| a.summary.as_str())
            .unwrap_or("");

        let prompt = format!(
            "基于以下 AI 热点，生成 {} 个创新的产品创意：\n\n\
             热点标题: {}\n\
             热点分类: {}\n\
             热点摘要: {}\n\n\
             要求：\n\
             1. 每个创意独特且有差异化\n\
             2. 包含具体的产品名称（中英文结合，有创意）\n\
             3. 明确目标用户群体\n\
             4. 列出3-4个核心功能特性\n\
             5. 用一句话描述核心价值\n\n\
             输出 JSON 格式：\n\
             {{\n\
               \"ideas\": [\n\
                 {{\n\
                   \"name\": \"产品名称（中英文）\",\n\
                   \"description\": \"一句话核心价值\",\n\
                   \"features\": [\"功能1\", \"功能2\", \"功能3\"],\n\
                   \"target_users\": \"目标用户描述\",\n\
                   \"score\": 85\n\
                 }}\n\
               ]\n\
             }}\n\n\
             只返回 JSON，不要有其他内容。",
            self.max_ideas, item.title, category, summary
        );

        let response = client.complete(&prompt, 800, Some(0.8)).await?;

        let payload: IdeasPayload = serde_json::from_str(extract_json(&response))
            .context("Failed to parse ideas JSON response")?;

        Ok(payload
            .ideas
            .into_iter()
            .take(self.max_ideas)
            .map(normalize_idea)
            .collect())
    }
}

fn normalize_idea(raw: RawIdea) -> Idea {
    let mut features = raw.features.unwrap_or_default();
    features.truncate(MAX_FEATURES);

    Idea {
        name: raw.name.unwrap_or_else(|| DEFAULT_IDEA_NAME.to_string()),
        description: raw.description.unwrap_or_default(),
        target_users: raw.target_users.unwrap_or_default(),
        features,
        score: raw.score.unwrap_or(DEFAULT_IDEA_SCORE),
    }
}

/// Deterministic idea pair derived from the item's category, used whenever
/// the chat service is unavailable or fails.
pub fn fallback_ideas(category: &str) -> Vec<Idea> {
    vec![
        Idea {
            name: format!("{category}分析工具"),
            description: "基于该热点的数据分析平台".to_string(),
            target_users: "AI 研究人员、产品经理".to_string(),
            features: ["数据监控", "趋势分析", "报告生成", "API 接口"]
                .map(String::from)
                .to_vec(),
            score: 75,
        },
        Idea {
            name: format!("{category}通知服务"),
            description: "实时推送相关动态".to_string(),
            target_users: "关注该领域的专业人士".to_string(),
            features: ["实时推送", "个性化订阅", "多平台支持", "智能过滤"]
                .map(String::from)
                .to_vec(),
            score: 70,
        },
    ]
}
