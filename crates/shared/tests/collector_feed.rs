use chrono::{Duration, Utc};
use shared::config::RedditSource;
use shared::RedditCollector;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn atom_feed(subreddit: &str, entries: &[(&str, &str)]) -> String {
    let published = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let mut feed = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n  <title>posts from r/{subreddit}</title>\n"
    );
    for (i, (title, summary)) in entries.iter().enumerate() {
        feed.push_str(&format!(
            "  <entry>\n    <author><name>/u/poster{i}</name></author>\n    <content type=\"html\">{summary}</content>\n    <id>t3_{i}</id>\n    <link href=\"https://www.reddit.com/r/{subreddit}/comments/{i}/\"/>\n    <published>{published}</published>\n    <title>{title}</title>\n  </entry>\n"
        ));
    }
    feed.push_str("</feed>\n");
    feed
}

fn source(subreddits: &[&str], min_score: u32) -> RedditSource {
    RedditSource {
        subreddits: subreddits.iter().map(|s| s.to_string()).collect(),
        min_score,
    }
}

#[tokio::test]
async fn collects_and_normalizes_feed_entries() {
    let server = MockServer::start().await;
    let feed = atom_feed(
        "LocalLLaMA",
        &[
            ("Big release", "Details here. 1200 points, 600 comments"),
            ("Small question", "just asking"),
        ],
    );
    Mock::given(method("GET"))
        .and(path("/r/LocalLLaMA/.rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;

    let collector = RedditCollector::new(source(&["LocalLLaMA"], 0))
        .unwrap()
        .with_base_url(server.uri());

    let items = collector.collect(24).await;
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].title, "Big release");
    assert_eq!(items[0].engagement.score, 1200);
    assert_eq!(items[0].engagement.comments, 600);
    assert_eq!(items[0].author, "/u/poster0");
    assert_eq!(items[0].subreddit, "LocalLLaMA");

    // Entry without engagement markers defaults to zero.
    assert_eq!(items[1].engagement.score, 0);
    assert_eq!(items[1].engagement.comments, 0);
}

#[tokio::test]
async fn min_score_threshold_filters_entries() {
    let server = MockServer::start().await;
    let feed = atom_feed(
        "MachineLearning",
        &[
            ("Popular", "100 points, 3 comments"),
            ("Quiet", "2 points, 0 comments"),
        ],
    );
    Mock::given(method("GET"))
        .and(path("/r/MachineLearning/.rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;

    let collector = RedditCollector::new(source(&["MachineLearning"], 50))
        .unwrap()
        .with_base_url(server.uri());

    let items = collector.collect(24).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Popular");
}

#[tokio::test]
async fn failed_subreddit_is_skipped_and_run_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/broken/.rss"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let feed = atom_feed("working", &[("Still here", "5 points, 1 comment")]);
    Mock::given(method("GET"))
        .and(path("/r/working/.rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;

    let collector = RedditCollector::new(source(&["broken", "working"], 0))
        .unwrap()
        .with_base_url(server.uri());

    let items = collector.collect(24).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Still here");
}

#[tokio::test]
async fn empty_feed_yields_empty_result_not_error() {
    let server = MockServer::start().await;
    let feed = atom_feed("quiet", &[]);
    Mock::given(method("GET"))
        .and(path("/r/quiet/.rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;

    let collector = RedditCollector::new(source(&["quiet"], 0))
        .unwrap()
        .with_base_url(server.uri());

    assert!(collector.collect(24).await.is_empty());
}
