mod support;

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use support::TodoFixture;
use taskboard::config::UpstreamConfig;
use taskboard::paging::{Coordinator, PageFetcher, PageRequest};
use taskboard::upstream::{Credentials, UpstreamClient};
use taskboard::Error;

fn upstream(server: &MockServer) -> UpstreamConfig {
    UpstreamConfig {
        endpoint: server.url("/graphql"),
        company: "acme".to_string(),
        company_ids: vec!["c1".to_string()],
        page_size: 2,
        timeout_secs: 5,
    }
}

fn credentials() -> Credentials {
    Credentials {
        token_id: Some("token-id".to_string()),
        token_secret: Some("token-secret".to_string()),
    }
}

fn todos_body(items: Vec<serde_json::Value>, has_next_page: bool) -> serde_json::Value {
    json!({
        "data": {
            "todoQueries": {
                "todos": {
                    "items": items,
                    "pageInfo": {
                        "totalPages": 2,
                        "totalItems": 3,
                        "perPage": 2,
                        "page": 1,
                        "hasNextPage": has_next_page
                    }
                }
            }
        }
    })
}

#[test]
fn sends_credentials_and_paging_variables() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("x-bloo-token-id", "token-id")
            .header("x-bloo-token-secret", "token-secret")
            .header("x-bloo-company-id", "acme")
            .json_body_partial(r#"{ "variables": { "companyIds": ["c1"], "skip": 4, "limit": 2 } }"#)
            .body_contains("todoQueries");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(todos_body(
                vec![TodoFixture::new("1", "One").build()],
                false,
            ));
    });

    let client = UpstreamClient::new(&upstream(&server), credentials()).expect("client");
    let page = client
        .fetch_page(&PageRequest { skip: 4, limit: 2 })
        .expect("page");

    mock.assert();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.info.per_page, Some(2));
    assert_eq!(page.info.has_next_page, Some(false));
}

#[test]
fn non_success_status_is_a_retryable_upstream_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(503).body("maintenance");
    });

    let client = UpstreamClient::new(&upstream(&server), credentials()).expect("client");
    let err = client
        .fetch_page(&PageRequest { skip: 0, limit: 2 })
        .expect_err("503");

    match &err {
        Error::UpstreamStatus { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn slow_upstream_times_out_as_retryable_http_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_secs(3))
            .json_body(todos_body(Vec::new(), false));
    });

    let mut config = upstream(&server);
    config.timeout_secs = 1;
    let client = UpstreamClient::new(&config, credentials()).expect("client");
    let err = client
        .fetch_page(&PageRequest { skip: 0, limit: 2 })
        .expect_err("timeout");

    match &err {
        Error::Http(inner) => assert!(inner.is_timeout(), "unexpected http error: {inner}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn graphql_errors_are_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "data": null, "errors": [{ "message": "Invalid token" }] }));
    });

    let client = UpstreamClient::new(&upstream(&server), Credentials::default()).expect("client");
    let err = client
        .fetch_page(&PageRequest { skip: 0, limit: 2 })
        .expect_err("graphql error");
    assert!(err.to_string().contains("Invalid token"));
}

#[test]
fn coordinator_pages_through_the_client() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .json_body_partial(r#"{ "variables": { "skip": 0 } }"#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(todos_body(
                vec![
                    TodoFixture::new("1", "X")
                        .priority("High")
                        .assignee("U1", "Ada", "Nobles")
                        .build(),
                    TodoFixture::new("2", "Y")
                        .priority("Low")
                        .assignee("U1", "Ada", "Nobles")
                        .build(),
                ],
                true,
            ));
    });
    let second = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .json_body_partial(r#"{ "variables": { "skip": 2 } }"#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(todos_body(
                vec![TodoFixture::new("3", "Z")
                    .priority("Medium")
                    .assignee("U1", "Ada", "Nobles")
                    .build()],
                false,
            ));
    });

    let mut config = support::config(&["Nobles"], 2);
    config.upstream = upstream(&server);
    let client = UpstreamClient::new(&config.upstream, credentials()).expect("client");
    let mut coordinator = Coordinator::from_config(&config);

    coordinator.load_next(&client).expect("page 1");
    coordinator.load_next(&client).expect("page 2");

    first.assert();
    second.assert();
    assert!(!coordinator.has_more());
    let titles: Vec<&str> = coordinator
        .board()
        .bucket("U1")
        .expect("bucket")
        .tasks
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(titles, vec!["X", "Z", "Y"]);
}
