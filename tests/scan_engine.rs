use std::time::Duration;

use pentoscan::config::ScanConfig;
use pentoscan::exploits::ExploitDispatcher;
use pentoscan::scanner::Scanner;
use pentoscan::templates::{parse_template, MatcherKind, Template};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scanner() -> Scanner {
    let mut config = ScanConfig::default();
    config.http.timeout = Duration::from_secs(1);
    Scanner::new(config)
}

fn template(yaml: &str) -> Template {
    parse_template(yaml).unwrap()
}

#[tokio::test]
async fn test_lfi_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("file", "../../etc/passwd"))
        .respond_with(ResponseTemplate::new(200).set_body_string("root:x:0:0:root:/root:/bin/bash\n"))
        .expect(1)
        .mount(&server)
        .await;

    let template = template(
        r#"
id: lfi-test
http:
  - method: GET
    path: ["/?file=../../etc/passwd"]
    matchers:
      - type: word
        words: ["root:"]
"#,
    );

    let result = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(result.vulnerable);
    assert_eq!(result.template_id, "lfi-test");
    assert_eq!(result.matched_matcher_type(), Some(MatcherKind::Word));
    assert_eq!(result.status_code, Some(200));
    assert_eq!(result.method, "GET");
    assert_eq!(result.requests_sent, 1);
    assert!(result.matched_url.unwrap().ends_with("/?file=../../etc/passwd"));
}

#[tokio::test]
async fn test_first_match_wins_stops_requests() {
    let server = MockServer::start().await;
    Mock::given(path("/one"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nothing here"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_string("admin panel"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/three"))
        .respond_with(ResponseTemplate::new(200).set_body_string("admin panel"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(path("/later-step"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let template = template(
        r#"
id: first-match
http:
  - method: GET
    path: ["/one", "/two", "/three"]
    matchers:
      - type: word
        words: ["admin"]
  - method: GET
    path: ["/later-step"]
    matchers:
      - type: status
        status: 200
"#,
    );

    let result = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(result.vulnerable);
    let matched = result.matched.unwrap();
    assert_eq!(matched.step, 0);
    assert_eq!(matched.path, "/two");
    assert_eq!(result.requests_sent, 2);
    server.verify().await;
}

#[tokio::test]
async fn test_transport_failure_does_not_stop_later_paths() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_string("root:").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    Mock::given(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("root:x:0:0"))
        .mount(&server)
        .await;

    let template = template(
        r#"
id: timeout-then-match
http:
  - method: GET
    path: ["/slow", "/fast"]
    matchers:
      - type: word
        words: ["root:"]
"#,
    );

    let result = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(result.vulnerable);
    assert_eq!(result.matched.unwrap().path, "/fast");
    assert_eq!(result.requests_sent, 2);
    assert_eq!(result.failed_requests, 1);
}

#[tokio::test]
async fn test_step_matchers_are_or_combined() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("fatal error"))
        .mount(&server)
        .await;

    let template = template(
        r#"
id: or-trigger
http:
  - method: GET
    path: ["/"]
    matchers:
      - type: status
        status: [200]
      - type: word
        words: ["nope"]
      - type: regex
        regex: ["fatal\\s+error"]
"#,
    );

    let result = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(result.vulnerable);
    let matched = result.matched.unwrap();
    assert_eq!(matched.index, 2);
    assert_eq!(matched.matcher_type, MatcherKind::Regex);
    assert_eq!(result.status_code, Some(500));
}

#[tokio::test]
async fn test_not_vulnerable_reports_last_response() {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;
    Mock::given(path("/b"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let template = template(
        r#"
id: clean
http:
  - method: GET
    path: ["/a", "/b"]
    matchers:
      - type: word
        words: ["root:"]
"#,
    );

    let result = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(!result.vulnerable);
    assert!(result.matched.is_none());
    assert!(result.matched_url.is_none());
    assert_eq!(result.status_code, Some(403));
    assert_eq!(result.response_length, Some("forbidden".len()));
    assert_eq!(result.requests_sent, 2);
}

#[tokio::test]
async fn test_script_extraction_collects_findings() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "PHPSESSID=abc; Path=/")
                .append_header("Set-Cookie", "token=1; Secure; HttpOnly")
                .set_body_string("<html></html>"),
        )
        .mount(&server)
        .await;

    let template = template(include_str!("../templates/cookies-without-secure.yaml"));
    let result = scanner().scan(&server.uri(), &template).await.unwrap();

    assert!(result.vulnerable);
    assert_eq!(result.extracted.len(), 1);
    assert_eq!(result.extracted[0].value, "PHPSESSID");
    assert_eq!(result.extracted[0].template_id, "cookies-without-secure");
}

#[tokio::test]
async fn test_failing_script_does_not_change_verdict() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let template = template(
        r#"
id: broken-script
http:
  - method: GET
    path: ["/"]
    matchers:
      - type: status
        status: 200
javascript: "throw new Error('boom');"
extractors:
  - type: regex
    regex: [".*"]
"#,
    );

    let result = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(result.vulnerable);
    assert!(result.extracted.is_empty());
}

#[tokio::test]
async fn test_exploit_dispatch_follows_verdict() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .and(query_param("file", "../../etc/passwd"))
        .respond_with(ResponseTemplate::new(200).set_body_string("root:x:0:0"))
        .mount(&server)
        .await;
    Mock::given(path("/"))
        .and(query_param("file", "../../../../etc/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("127.0.0.1 localhost"))
        .mount(&server)
        .await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let template = template(
        r#"
id: lfi-exploit
http:
  - method: GET
    path: ["/?file=../../etc/passwd"]
    matchers:
      - type: word
        words: ["root:"]
exploit: modules/lfi.py
"#,
    );
    let scan = scanner().scan(&server.uri(), &template).await.unwrap();
    assert!(scan.vulnerable);

    let dispatcher = ExploitDispatcher::default();
    let reference = template.exploit.as_deref().unwrap();
    let exploit = dispatcher.dispatch(reference, &server.uri(), &scan).await.unwrap();
    assert!(exploit.success);

    let results = exploit.details["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    let hosts = results.iter().find(|r| r["file"] == "/etc/hosts").unwrap();
    assert_eq!(hosts["status"], "success");
    assert_eq!(hosts["content_length"], "127.0.0.1 localhost".len());
    let shadow = results.iter().find(|r| r["file"] == "/etc/shadow").unwrap();
    assert_eq!(shadow["status"], "failed");
    assert_eq!(shadow["status_code"], 404);

    let mut clean = scan.clone();
    clean.vulnerable = false;
    assert!(dispatcher.dispatch(reference, &server.uri(), &clean).await.is_none());
}
