use framescan::config::Settings;
use framescan::output::{LineFormat, OutputSink};
use framescan::shutdown::ShutdownSignal;
use framescan::SearchRunner;
use mockito::{Matcher, Mock, Server};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

fn settings(server: &Server, frameworks: &[&str], indicators: &[&str]) -> Settings {
    let mut settings = Settings::default();
    settings.github.token = Some("test-token".to_string());
    settings.github.api_base_url = server.url();
    settings.github.rate_limit_padding_secs = 0;
    settings.github.max_rate_limit_retries = 1;
    settings.search.frameworks = frameworks.iter().map(|s| s.to_string()).collect();
    settings.search.indicators = indicators.iter().map(|s| s.to_string()).collect();
    settings.search.page_delay_secs = 0;
    settings
}

fn repo_json(name: &str, stars: u32) -> serde_json::Value {
    json!({
        "name": name,
        "full_name": format!("octo/{name}"),
        "owner": { "login": "octo" },
        "html_url": format!("https://github.com/octo/{name}"),
        "description": "a repository",
        "stargazers_count": stars,
        "forks_count": 3,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-06-01T00:00:00Z"
    })
}

fn page_body(repos: &[(&str, u32)]) -> String {
    let items: Vec<_> = repos
        .iter()
        .map(|(name, stars)| repo_json(name, *stars))
        .collect();
    json!({ "total_count": 1000, "incomplete_results": false, "items": items }).to_string()
}

async fn mock_page(server: &mut Server, q: &str, page: u32, repos: &[(&str, u32)]) -> Mock {
    server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), q.into()),
            Matcher::UrlEncoded("page".into(), page.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page_body(repos))
        .expect(1)
        .create_async()
        .await
}

async fn mock_contributors(server: &mut Server, repo: &str, count: usize) -> Mock {
    let contributors: Vec<_> = (0..count)
        .map(|i| json!({ "login": format!("dev{i}"), "contributions": 1 }))
        .collect();

    server
        .mock("GET", format!("/repos/octo/{repo}/contributors").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!(contributors).to_string())
        .expect(1)
        .create_async()
        .await
}

fn repository_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn comment_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_star_filter_writes_qualifying_items_before_next_page() {
    let mut server = Server::new_async().await;
    let page1 = mock_page(
        &mut server,
        "react stars:>10",
        1,
        &[("fifty", 50), ("five", 5), ("twenty", 20)],
    )
    .await;
    let page2 = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;

    let mut settings = settings(&server, &["react"], &[]);
    settings.search.page_size = 3;
    settings.filters.stars_above = Some(10);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("react_repositories.txt");

    let runner = SearchRunner::new(&settings).unwrap();
    let report = runner
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    page1.assert_async().await;
    page2.assert_async().await;

    // Page 2 failed, so both lines were on disk before it was read
    assert_eq!(
        repository_lines(&path),
        vec![
            "https://github.com/octo/fifty",
            "https://github.com/octo/twenty"
        ]
    );

    let interruption = report.interruption.expect("run should be interrupted");
    assert_eq!(interruption.last_page, 1);
    assert_eq!(interruption.query.as_deref(), Some("react stars:>10"));
    assert_eq!(report.repositories_written, 2);

    let comments = comment_lines(&path);
    assert!(comments.iter().any(|c| c.starts_with("# Run interrupted:")));
    assert!(comments.contains(&"# Last processed page: 1".to_string()));
    assert!(comments.contains(&"# Repositories written: 2".to_string()));
}

#[tokio::test]
async fn test_short_page_ends_pagination() {
    let mut server = Server::new_async().await;
    let page1 = mock_page(&mut server, "vue", 1, &[("a", 1), ("b", 2)]).await;
    let page2 = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .expect(0)
        .create_async()
        .await;

    let mut settings = settings(&server, &["vue"], &[]);
    settings.search.page_size = 5;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    assert!(report.interruption.is_none());
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.queries_completed, 1);
    assert_eq!(repository_lines(&path).len(), 2);
    let comments = comment_lines(&path);
    assert!(comments.contains(&"# Repositories written: 2".to_string()));
}

#[tokio::test]
async fn test_empty_page_ends_pagination() {
    let mut server = Server::new_async().await;
    let page1 = mock_page(&mut server, "svelte", 1, &[("a", 1), ("b", 2)]).await;
    let page2 = mock_page(&mut server, "svelte", 2, &[]).await;

    let mut settings = settings(&server, &["svelte"], &[]);
    settings.search.page_size = 2;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    assert!(report.interruption.is_none());
    assert_eq!(report.pages_fetched, 2);
}

#[tokio::test]
async fn test_page_cap_and_cursor_reset_per_query() {
    let mut server = Server::new_async().await;
    let indicator_q = |file: &str| format!("nuxt in:readme,description filename:{file}");

    let mut mocks = Vec::new();
    for file in ["package.json", "nuxt.config.ts"] {
        let q = indicator_q(file);
        let first = format!("{}-1", file.replace('.', "-"));
        let second = format!("{}-2", file.replace('.', "-"));
        mocks.push(mock_page(&mut server, &q, 1, &[(first.as_str(), 1)]).await);
        mocks.push(mock_page(&mut server, &q, 2, &[(second.as_str(), 1)]).await);
    }
    let page3 = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
        .expect(0)
        .create_async()
        .await;

    let mut settings = settings(&server, &["nuxt"], &["package.json", "nuxt.config.ts"]);
    settings.search.page_size = 1;
    settings.search.max_pages = 2;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    for mock in &mocks {
        mock.assert_async().await;
    }
    page3.assert_async().await;
    assert_eq!(report.pages_fetched, 4);
    assert_eq!(report.queries_completed, 2);
    assert_eq!(repository_lines(&path).len(), 4);
}

#[tokio::test]
async fn test_urls_are_unique_across_queries() {
    let mut server = Server::new_async().await;
    mock_page(
        &mut server,
        "react in:readme,description filename:package.json",
        1,
        &[("shared", 100), ("only-package", 50)],
    )
    .await;
    mock_page(
        &mut server,
        "react in:readme,description filename:vite.config.js",
        1,
        &[("shared", 100), ("only-vite", 40)],
    )
    .await;

    let settings = settings(&server, &["react"], &["package.json", "vite.config.js"]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    assert_eq!(
        repository_lines(&path),
        vec![
            "https://github.com/octo/shared",
            "https://github.com/octo/only-package",
            "https://github.com/octo/only-vite",
        ]
    );
    assert_eq!(report.repositories_written, 3);
}

#[tokio::test]
async fn test_min_contributors_excludes_small_repositories() {
    let mut server = Server::new_async().await;
    mock_page(&mut server, "angular", 1, &[("x", 30), ("y", 25)]).await;
    let x = mock_contributors(&mut server, "x", 2).await;
    let y = mock_contributors(&mut server, "y", 1).await;

    let mut settings = settings(&server, &["angular"], &[]);
    settings.filters.min_contributors = Some(2);
    settings.output.format = LineFormat::Annotated;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    x.assert_async().await;
    y.assert_async().await;
    assert_eq!(
        repository_lines(&path),
        vec!["https://github.com/octo/x (Stars: 30, Contributors: 2)"]
    );
}

#[tokio::test]
async fn test_failed_contributor_lookup_skips_repository() {
    let mut server = Server::new_async().await;
    mock_page(&mut server, "express", 1, &[("gone", 30), ("ok", 25)]).await;
    server
        .mock("GET", "/repos/octo/gone/contributors")
        .match_query(Matcher::Any)
        .with_status(451)
        .with_body(r#"{"message": "Repository access blocked"}"#)
        .create_async()
        .await;
    mock_contributors(&mut server, "ok", 3).await;

    let mut settings = settings(&server, &["express"], &[]);
    settings.filters.min_contributors = Some(2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    assert!(report.interruption.is_none());
    assert_eq!(repository_lines(&path), vec!["https://github.com/octo/ok"]);
}

#[tokio::test]
async fn test_exhausted_rate_limit_interrupts_run() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-reset", "0")
        .expect(2)
        .create_async()
        .await;

    let settings = settings(&server, &["react", "vue"], &[]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    mock.assert_async().await;
    let interruption = report.interruption.unwrap();
    assert_eq!(interruption.last_page, 0);
    assert!(interruption.reason.contains("rate limit"));
    assert_eq!(report.queries_completed, 0);
    assert!(repository_lines(&path).is_empty());
}

#[tokio::test]
async fn test_failure_mid_page_leaves_only_completed_pages() {
    let mut server = Server::new_async().await;
    mock_page(&mut server, "react", 1, &[("p1a", 10), ("p1b", 9)]).await;
    mock_page(&mut server, "react", 2, &[("p2a", 8), ("p2b", 7)]).await;
    for repo in ["p1a", "p1b", "p2a"] {
        mock_contributors(&mut server, repo, 2).await;
    }
    let throttled = server
        .mock("GET", "/repos/octo/p2b/contributors")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-reset", "0")
        .expect(1)
        .create_async()
        .await;

    let mut settings = settings(&server, &["react"], &[]);
    settings.github.max_rate_limit_retries = 0;
    settings.search.page_size = 2;
    settings.filters.min_contributors = Some(2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    throttled.assert_async().await;

    // p2a qualified, but page 2 never finished
    assert_eq!(
        repository_lines(&path),
        vec!["https://github.com/octo/p1a", "https://github.com/octo/p1b"]
    );
    let interruption = report.interruption.unwrap();
    assert_eq!(interruption.last_page, 1);
    assert_eq!(report.repositories_written, 2);

    let comments = comment_lines(&path);
    assert!(comments.contains(&"# Last processed page: 1".to_string()));
    assert!(comments.contains(&"# Repositories written: 2".to_string()));
}

#[tokio::test]
async fn test_shutdown_interrupts_page_delay() {
    let mut server = Server::new_async().await;
    mock_page(&mut server, "vue", 1, &[("a", 2), ("b", 1)]).await;
    let page2 = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .expect(0)
        .create_async()
        .await;

    let mut settings = settings(&server, &["vue"], &[]);
    settings.search.page_size = 2;
    settings.search.page_delay_secs = 3600;

    let shutdown = ShutdownSignal::new();
    let runner = SearchRunner::new(&settings)
        .unwrap()
        .with_shutdown(shutdown.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.request();
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let sink = OutputSink::create(&path).unwrap().quiet();
    let report = tokio::time::timeout(Duration::from_secs(10), runner.run(sink))
        .await
        .expect("page delay should end on shutdown")
        .unwrap();

    page2.assert_async().await;
    let interruption = report.interruption.unwrap();
    assert!(interruption.reason.contains("shutdown requested"));
    assert_eq!(interruption.last_page, 1);
    assert_eq!(repository_lines(&path).len(), 2);
}

#[tokio::test]
async fn test_shutdown_request_stops_before_any_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let settings = settings(&server, &["react"], &[]);
    let shutdown = ShutdownSignal::new();
    shutdown.request();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let report = SearchRunner::new(&settings)
        .unwrap()
        .with_shutdown(shutdown)
        .run(OutputSink::create(&path).unwrap().quiet())
        .await
        .unwrap();

    mock.assert_async().await;
    let interruption = report.interruption.unwrap();
    assert!(interruption.reason.contains("shutdown requested"));
    assert!(comment_lines(&path)
        .iter()
        .any(|c| c.starts_with("# Run interrupted:")));
}

#[tokio::test]
async fn test_plan_covers_every_framework_and_indicator() {
    let server_url = "http://127.0.0.1:1";
    let mut settings = Settings::default();
    settings.github.api_base_url = server_url.to_string();
    settings.search.frameworks = vec!["react".to_string(), "vue".to_string()];
    settings.search.indicators = vec!["package.json".to_string(), "yarn.lock".to_string()];
    settings.filters.stars_above = Some(5);

    let plan: Vec<String> = SearchRunner::new(&settings)
        .unwrap()
        .plan()
        .iter()
        .map(|q| q.to_string())
        .collect();

    assert_eq!(
        plan,
        vec![
            "react in:readme,description filename:package.json stars:>5",
            "react in:readme,description filename:yarn.lock stars:>5",
            "vue in:readme,description filename:package.json stars:>5",
            "vue in:readme,description filename:yarn.lock stars:>5",
        ]
    );
}
