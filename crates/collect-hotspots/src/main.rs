use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use shared::{
    Analyzer, ChatClient, Config, IdeaGenerator, RedditCollector, ReportGenerator, select_top_n,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "collect-hotspots")]
#[command(about = "Collect Reddit AI hotspots, analyze them, and render a daily HTML digest")]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Lookback window in hours for feed entries
    #[arg(long, default_value = "24")]
    hours: i64,

    /// Output directory for the HTML digest
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    println!("🔥 AI Hotspots Daily");

    // One chat client per process, shared by analyzer and idea generator.
    let client = ChatClient::from_env().map(Arc::new);
    match &client {
        Some(client) => println!("✓ AI 客户端: {}", client.provider()),
        None => println!("⚠ 未配置 AI API，使用降级模式"),
    }

    println!("\n[1/4] 数据收集...");
    let collector = RedditCollector::new(config.sources.reddit.clone())?;
    let items = collector.collect(args.hours).await;

    if items.is_empty() {
        tracing::warn!("no items collected, skipping analysis and render");
        println!("⚠ 未收集到任何数据");
        return Ok(());
    }
    println!("✓ 收集到 {} 条数据", items.len());

    println!("\n[2/4] AI 分析...");
    let analyzer = Analyzer::new(client.clone(), config.categories.clone());
    let items = analyzer.analyze_batch(items).await;
    println!("✓ 分析完成: {} 条", items.len());

    println!("\n[3/4] Top {} 精选 + 创意生成...", config.top_n);
    let top_items = select_top_n(&items, config.top_n);
    let generator = IdeaGenerator::new(client, config.max_ideas);
    let ideas = generator.generate_batch(&top_items).await;
    println!(
        "✓ 创意生成完成: {} 个",
        ideas.values().map(Vec::len).sum::<usize>()
    );

    println!("\n[4/4] 生成 HTML 报告...");
    let date_label = Local::now().format("%Y-%m-%d").to_string();
    let html = ReportGenerator::generate(&items, &top_items, &ideas, &date_label, Utc::now());
    let path = ReportGenerator::save(&html, &args.output, &date_label)
        .context("Failed to write digest")?;
    println!("✓ HTML 报告: {}", path.display());

    println!(
        "\n✅ 完成! 数据 {} 条, Top {} 精选, 创意 {} 个",
        items.len(),
        top_items.len(),
        ideas.values().map(Vec::len).sum::<usize>()
    );

    Ok(())
}
