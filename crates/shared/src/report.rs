use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Idea, Item, Sentiment};

/// Stylesheet for the daily digest, inlined so the document is fully
/// self-contained.
const STYLESHEET: &str = "\
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #333; line-height: 1.6; padding: 20px; min-height: 100vh; }
.container { max-width: 1200px; margin: 0 auto; }
.header { background: white; padding: 40px; border-radius: 16px; margin-bottom: 24px; box-shadow: 0 4px 16px rgba(0,0,0,0.1); }
.header h1 { font-size: 32px; color: #667eea; margin-bottom: 16px; }
.header .meta { color: #666; font-size: 14px; }
.stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 16px; margin-bottom: 24px; }
.stat-card { background: white; padding: 20px; border-radius: 12px; text-align: center; box-shadow: 0 2px 8px rgba(0,0,0,0.1); }
.stat-card .number { font-size: 36px; font-weight: bold; color: #667eea; }
.stat-card .label { color: #666; font-size: 14px; margin-top: 8px; }
.section { background: white; padding: 24px; border-radius: 12px; margin-bottom: 20px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); }
.section h2 { color: #667eea; margin-bottom: 20px; padding-bottom: 12px; border-bottom: 2px solid #f0f0f0; }
.top-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(350px, 1fr)); gap: 20px; }
.hotspot-card { background: #f8f9fa; padding: 20px; border-radius: 12px; border-left: 4px solid #667eea; position: relative; }
.rank-badge { position: absolute; top: 16px; right: 16px; width: 36px; height: 36px; background: linear-gradient(135deg, #667eea, #764ba2); color: white; border-radius: 50%; display: flex; align-items: center; justify-content: center; font-weight: bold; font-size: 16px; }
.card-title { font-size: 16px; font-weight: 600; margin-bottom: 8px; padding-right: 40px; }
.card-meta { font-size: 12px; color: #666; margin-bottom: 8px; }
.card-summary { font-size: 14px; color: #444; margin-bottom: 12px; }
.product-ideas { margin-top: 16px; padding-top: 16px; border-top: 1px dashed #ddd; }
.idea-card { background: white; padding: 16px; border-radius: 8px; margin-bottom: 12px; border-left: 3px solid #764ba2; }
.idea-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 10px; }
.idea-name { font-weight: 600; color: #667eea; font-size: 15px; }
.idea-score { background: #667eea; color: white; padding: 4px 12px; border-radius: 12px; font-size: 12px; }
.idea-body { font-size: 13px; color: #555; }
.idea-body p { margin-bottom: 8px; }
.idea-body ul { margin-left: 20px; margin-bottom: 8px; }
.item { padding: 20px; border-left: 4px solid #667eea; margin-bottom: 16px; background: #f8f9fa; border-radius: 8px; }
.item h3 { font-size: 18px; margin-bottom: 12px; color: #333; }
.item .meta { font-size: 13px; color: #666; margin-bottom: 12px; }
.item .summary { color: #444; margin-bottom: 12px; }
.item .keypoints { list-style: none; padding-left: 0; }
.item .keypoints li { padding: 4px 0 4px 16px; position: relative; }
.item .keypoints li::before { content: '•'; color: #667eea; position: absolute; left: 0; }
.item .link { display: inline-block; margin-top: 12px; padding: 8px 16px; background: #667eea; color: white; text-decoration: none; border-radius: 6px; font-size: 13px; }
.sentiment { display: inline-block; padding: 2px 8px; border-radius: 4px; font-size: 12px; margin-left: 8px; }
.sentiment.positive { background: #d4edda; color: #155724; }
.sentiment.negative { background: #f8d7da; color: #721c24; }
.sentiment.neutral { background: #e2e3e5; color: #383d41; }
.footer { text-align: center; padding: 40px; color: white; opacity: 0.8; }
";

pub struct ReportGenerator;

impl ReportGenerator {
    /// Render the daily digest. Pure function of its arguments: the only
    /// wall-clock value in the output is the `generated_at` footer line,
    /// which the caller supplies.
    pub fn generate(
        items: &[Item],
        top_items: &[Item],
        ideas: &HashMap<String, Vec<Idea>>,
        date_label: &str,
        generated_at: DateTime<Utc>,
    ) -> String {
        let categorized = Self::categorize(items);
        let total = items.len();
        let reddit_count = items.iter().filter(|i| i.source == "reddit").count();

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        html.push_str(&format!(
            "  <title>AI 热点日报 - {}</title>\n",
            Self::escape_html(date_label)
        ));
        html.push_str("  <style>\n");
        html.push_str(STYLESHEET);
        html.push_str("  </style>\n</head>\n<body>\n<div class=\"container\">\n");

        // Header and summary statistics.
        html.push_str("  <div class=\"header\">\n    <h1>🔥 AI 热点日报</h1>\n");
        html.push_str(&format!(
            "    <div class=\"meta\">📅 {} | 🤖 AI 分析 + 创意生成 | 📊 {} 条热点</div>\n  </div>\n",
            Self::escape_html(date_label),
            total
        ));

        html.push_str("  <div class=\"stats\">\n");
        for (number, label) in [
            (total, "总条目"),
            (reddit_count, "Reddit 讨论"),
            (categorized.len(), "分类数"),
            (top_items.len(), "精选热点"),
        ] {
            html.push_str(&format!(
                "    <div class=\"stat-card\"><div class=\"number\">{}</div><div class=\"label\">{}</div></div>\n",
                number, label
            ));
        }
        html.push_str("  </div>\n");

        // Top-N cards with generated product ideas.
        if !top_items.is_empty() {
            html.push_str("  <div class=\"section\">\n");
            html.push_str(&format!(
                "    <h2>🏆 Top {} 精选热点 + AI 产品创意</h2>\n    <div class=\"top-grid\">\n",
                top_items.len()
            ));
            for (i, item) in top_items.iter().enumerate() {
                let item_ideas = ideas.get(&item.title).map(Vec::as_slice).unwrap_or(&[]);
                html.push_str(&Self::render_top_card(item, i + 1, item_ideas));
            }
            html.push_str("    </div>\n  </div>\n");
        }

        // All items grouped by category, first-seen order.
        for (category, cat_items) in &categorized {
            html.push_str("  <div class=\"section\">\n");
            html.push_str(&format!("    <h2>{}</h2>\n", Self::escape_html(category)));
            for item in cat_items {
                html.push_str(&Self::render_item(item));
            }
            html.push_str("  </div>\n");
        }

        html.push_str("  <div class=\"footer\">\n");
        html.push_str(&format!(
            "    <p>🤖 AI 热点收集系统 | Generated on {}</p>\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        html.push_str("    <p>数据来源: Reddit | 创意由 AI 生成</p>\n");
        html.push_str("  </div>\n</div>\n</body>\n</html>\n");

        html
    }

    /// Write the digest to `{output_dir}/{date_label}.html`, overwriting
    /// any previous document for the same date.
    pub fn save(html: &str, output_dir: &Path, date_label: &str) -> Result<PathBuf> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        let filepath = output_dir.join(format!("{date_label}.html"));
        fs::write(&filepath, html)
            .with_context(|| format!("Failed to write digest file: {}", filepath.display()))?;

        Ok(filepath)
    }

    /// Group items by analysis category, preserving first-seen order.
    fn categorize(items: &[Item]) -> Vec<(String, Vec<&Item>)> {
        let mut groups: Vec<(String, Vec<&Item>)> = Vec::new();

        for item in items {
            let category = item
                .analysis
                .as_ref()
                .map(|a| a.category.as_str())
                .unwrap_or(crate::analyzer::DEFAULT_CATEGORY);

            match groups.iter_mut().find(|(name, _)| name == category) {
                Some((_, group)) => group.push(item),
                None => groups.push((category.to_string(), vec![item])),
            }
        }

        groups
    }

    fn render_top_card(item: &Item, rank: usize, ideas: &[Idea]) -> String {
        let (summary, sentiment) = match &item.analysis {
            Some(a) => (a.summary.as_str(), a.sentiment),
            None => ("", Sentiment::Neutral),
        };

        let mut html = String::new();
        html.push_str("      <div class=\"hotspot-card\">\n");
        html.push_str(&format!("        <div class=\"rank-badge\">{rank}</div>\n"));
        html.push_str(&format!(
            "        <div class=\"card-title\">{}</div>\n",
            Self::escape_html(&item.title)
        ));
        html.push_str(&format!(
            "        <div class=\"card-meta\">📌 {} | 👍 {} | 💬 {}<span class=\"sentiment {}\">{}</span></div>\n",
            Self::escape_html(&item.source),
            item.engagement.score,
            item.engagement.comments,
            sentiment.label(),
            sentiment.emoji()
        ));
        html.push_str(&format!(
            "        <div class=\"card-summary\">{}</div>\n",
            Self::escape_html(summary)
        ));

        if !ideas.is_empty() {
            html.push_str("        <div class=\"product-ideas\">\n");
            for idea in ideas {
                html.push_str("          <div class=\"idea-card\">\n");
                html.push_str(&format!(
                    "            <div class=\"idea-header\"><span class=\"idea-name\">{}</span><span class=\"idea-score\">{}分</span></div>\n",
                    Self::escape_html(&idea.name),
                    idea.score
                ));
                html.push_str("            <div class=\"idea-body\">\n");
                html.push_str(&format!(
                    "              <p><strong>💡 核心价值：</strong>{}</p>\n",
                    Self::escape_html(&idea.description)
                ));
                html.push_str(&format!(
                    "              <p><strong>🎯 目标用户：</strong>{}</p>\n",
                    Self::escape_html(&idea.target_users)
                ));
                html.push_str("              <p><strong>✨ 核心功能：</strong></p>\n              <ul>\n");
                for feature in &idea.features {
                    html.push_str(&format!(
                        "                <li>{}</li>\n",
                        Self::escape_html(feature)
                    ));
                }
                html.push_str("              </ul>\n            </div>\n          </div>\n");
            }
            html.push_str("        </div>\n");
        }

        html.push_str(&format!(
            "        <a href=\"{}\" class=\"link\" target=\"_blank\">查看原文 →</a>\n",
            Self::escape_html(&item.url)
        ));
        html.push_str("      </div>\n");
        html
    }

    fn render_item(item: &Item) -> String {
        let (summary, key_points, sentiment) = match &item.analysis {
            Some(a) => (a.summary.as_str(), a.key_points.as_slice(), a.sentiment),
            None => ("", &[] as &[String], Sentiment::Neutral),
        };

        let mut html = String::new();
        html.push_str("    <div class=\"item\">\n");
        html.push_str(&format!(
            "      <h3>{}</h3>\n",
            Self::escape_html(&item.title)
        ));
        html.push_str(&format!(
            "      <div class=\"meta\">📌 {} | 👍 {} | 💬 {}<span class=\"sentiment {}\">{} {}</span></div>\n",
            Self::escape_html(&item.source),
            item.engagement.score,
            item.engagement.comments,
            sentiment.label(),
            sentiment.emoji(),
            sentiment.label()
        ));
        html.push_str(&format!(
            "      <div class=\"summary\">{}</div>\n",
            Self::escape_html(summary)
        ));

        if !key_points.is_empty() {
            html.push_str("      <ul class=\"keypoints\">\n");
            for point in key_points {
                html.push_str(&format!(
                    "        <li>{}</li>\n",
                    Self::escape_html(point)
                ));
            }
            html.push_str("      </ul>\n");
        }

        html.push_str(&format!(
            "      <a href=\"{}\" class=\"link\" target=\"_blank\">查看原文 →</a>\n",
            Self::escape_html(&item.url)
        ));
        html.push_str("    </div>\n");
        html
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }
}
