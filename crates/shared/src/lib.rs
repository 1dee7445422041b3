// Public modules
pub mod analyzer;
pub mod collector;
pub mod config;
pub mod ideas;
pub mod llm;
pub mod models;
pub mod report;
pub mod selector;

// Re-export commonly used types
pub use analyzer::Analyzer;
pub use collector::RedditCollector;
pub use config::Config;
pub use ideas::IdeaGenerator;
pub use llm::ChatClient;
pub use models::{Analysis, Engagement, Idea, Item, Sentiment};
pub use report::ReportGenerator;
pub use selector::select_top_n;
