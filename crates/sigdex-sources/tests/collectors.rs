//! Collector tests against mock upstream services.

use serde_json::json;
use sigdex_core::SignalType;
use sigdex_sources::{
    Collector, GoogleNewsCollector, HackerNewsCollector, LinkedInCollector, SourceSettings,
    TechCrunchCollector,
};
use wiremock::matchers::{method, path, path_regex, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(token: Option<&str>) -> SourceSettings {
    SourceSettings {
        user_agent: "sigdex-test/0.1".to_string(),
        request_timeout_secs: 5,
        source_delay_ms: 0,
        bright_data_api_token: token.map(str::to_string),
        poll_max_attempts: 3,
        poll_interval_secs: 0,
    }
}

const TC_FEED: &str = r#"<rss><channel>
  <item>
    <title>Stripe raises $100M Series C</title>
    <link>https://techcrunch.com/stripe</link>
    <description>Stripe announced a big round.</description>
  </item>
</channel></rss>"#;

#[tokio::test]
async fn techcrunch_parses_feed_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TC_FEED))
        .mount(&server)
        .await;

    let collector = TechCrunchCollector::with_feeds(
        &settings(None),
        vec![format!("{}/feed", server.uri())],
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].company_name, "Stripe");
    assert_eq!(signals[0].signal_type, SignalType::Funding);
}

#[tokio::test]
async fn techcrunch_tolerates_a_down_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let collector = TechCrunchCollector::with_feeds(
        &settings(None),
        vec![format!("{}/feed", server.uri())],
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();
    assert!(signals.is_empty());
}

#[tokio::test]
async fn google_news_queries_each_company() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .and(query_param_contains("q", "Stripe"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<rss><channel><item>
              <title>Stripe raised new funding</title>
              <link>https://example.com/a</link>
              <source url="https://reuters.com">Reuters</source>
            </item></channel></rss>"#,
        ))
        .mount(&server)
        .await;

    let collector = GoogleNewsCollector::with_base_url(
        &settings(None),
        vec!["Stripe".to_string()],
        &server.uri(),
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();

    // One item per query template, five templates.
    assert_eq!(signals.len(), 5);
    assert_eq!(signals[0].company_name, "Stripe");
    assert_eq!(signals[0].source_name, "Google News (Reuters)");
}

#[tokio::test]
async fn hackernews_merges_top_and_new_stories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/newstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([2, 3])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "title": "Stripe launches billing product",
            "url": "https://stripe.com/blog", "score": 120, "descendants": 40
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2, "title": "My favorite text editors", "score": 10
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/3.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "title": "We raised a Series B for our SaaS", "score": 80
        })))
        .mount(&server)
        .await;

    let collector = HackerNewsCollector::with_base_url(
        &settings(None),
        vec!["Stripe".to_string()],
        Vec::new(),
        &server.uri(),
    )
    .unwrap();
    let mut signals = collector.scrape().await.unwrap();
    signals.sort_by_key(|s| s.metadata["hn_id"].as_i64());

    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].company_name, "Stripe");
    assert_eq!(signals[1].company_name, "Tech Industry");
}

#[tokio::test]
async fn linkedin_without_token_returns_nothing() {
    let collector =
        LinkedInCollector::new(&settings(None), vec!["Stripe".to_string()]).unwrap();
    let signals = collector.scrape().await.unwrap();
    assert!(signals.is_empty());
}

fn linkedin_job() -> serde_json::Value {
    json!([{
        "title": "VP of Sales",
        "company_name": "Stripe",
        "url": "https://linkedin.com/jobs/1",
        "description": "Own the enterprise segment.",
        "location": "Remote"
    }])
}

#[tokio::test]
async fn linkedin_polls_until_snapshot_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-1"})),
        )
        .mount(&server)
        .await;
    // Not ready on the first poll, ready on the second.
    Mock::given(method("GET"))
        .and(path("/datasets/v3/progress/snap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/v3/progress/snap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ready"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(linkedin_job()))
        .mount(&server)
        .await;

    let collector = LinkedInCollector::with_base_url(
        &settings(Some("token")),
        vec!["Stripe".to_string()],
        &server.uri(),
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].signal_type, SignalType::Hiring);
    assert_eq!(signals[0].title, "Stripe is hiring: VP of Sales");
}

#[tokio::test]
async fn linkedin_failed_snapshot_yields_no_signals() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-2"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/datasets/v3/progress/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "failed"})))
        .mount(&server)
        .await;

    let collector = LinkedInCollector::with_base_url(
        &settings(Some("token")),
        vec!["Stripe".to_string()],
        &server.uri(),
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();
    assert!(signals.is_empty());
}

#[tokio::test]
async fn linkedin_poll_attempts_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-3"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/datasets/v3/progress/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .expect(3)
        .mount(&server)
        .await;

    let collector = LinkedInCollector::with_base_url(
        &settings(Some("token")),
        vec!["Stripe".to_string()],
        &server.uri(),
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();
    assert!(signals.is_empty());
}

#[tokio::test]
async fn linkedin_skips_on_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let collector = LinkedInCollector::with_base_url(
        &settings(Some("bad-token")),
        vec!["Stripe".to_string()],
        &server.uri(),
    )
    .unwrap();
    let signals = collector.scrape().await.unwrap();
    assert!(signals.is_empty());
}
