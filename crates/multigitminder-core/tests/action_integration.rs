//! Integration tests for a full run, against the recording fake and a mock Beeminder.

use multigitminder_core::fakes::{ClientCall, RecordingGoalClient};
use multigitminder_core::{
    run, ActionInputs, BeeminderClient, BeeminderConfig, ClientError, ConfigError, MinderError,
    MissingInput, Outcome,
};
use serde_json::json;
use std::cell::Cell;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ci_inputs() -> ActionInputs {
    ActionInputs {
        sha: Some("9fceb02d0ae598e95dc970b74767f19372d61af8".to_string()),
        git_ref: Some("refs/heads/main".to_string()),
        username: Some("alice".to_string()),
        auth_token: Some("tok".to_string()),
        goal: Some("commits".to_string()),
        value: Some("1".to_string()),
        comment: None,
        target_langs: Some(r#"["Python","Go"]"#.to_string()),
        repo_langs: Some(r#"{"Python": 1000, "JavaScript": 500}"#.to_string()),
        dry_run: false,
    }
}

/// Test: fetch, stage and commit happen exactly once, in order
#[tokio::test]
async fn test_end_to_end_with_recording_client() {
    let client = Arc::new(RecordingGoalClient::new());

    let outcome = run(&ci_inputs(), |_| Ok(client.clone()))
        .await
        .expect("run failed");

    let receipt = match outcome {
        Outcome::Committed(receipt) => receipt,
        other => panic!("expected Committed, got {:?}", other),
    };
    assert_eq!(receipt.branch, "main");
    assert_eq!(receipt.short_sha, "9fceb02");
    assert_eq!(receipt.matched_languages, vec!["python".to_string()]);
    assert_eq!(
        receipt.to_string(),
        "main@9fceb02: Data point of 1 added to commits with comment: \
         'main@9fceb02 via multigitminder API call'"
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 2, "Should have fetch + commit");
    assert_eq!(calls[0], ClientCall::FetchGoal("commits".to_string()));
    match &calls[1] {
        ClientCall::Commit { goal, points } => {
            assert_eq!(goal, "commits");
            assert_eq!(points.len(), 1, "Exactly one data point staged");
            assert_eq!(points[0].value, "1");
            assert_eq!(points[0].comment, "main@9fceb02 via multigitminder API call");
        }
        other => panic!("expected Commit, got {:?}", other),
    }
    assert_eq!(client.committed().len(), 1);
}

/// Test: each missing required input halts before a client is constructed
#[tokio::test]
async fn test_missing_inputs_halt_before_client() {
    let cases: [(fn(&mut ActionInputs), MissingInput); 4] = [
        (|i| i.username = None, MissingInput::Username),
        (|i| i.auth_token = Some(String::new()), MissingInput::AuthToken),
        (|i| i.goal = None, MissingInput::Goal),
        (|i| i.value = Some(String::new()), MissingInput::Value),
    ];

    for (clear, expected) in cases {
        let mut inputs = ci_inputs();
        clear(&mut inputs);
        let connects = Cell::new(0);

        let outcome = run(&inputs, |_| {
            connects.set(connects.get() + 1);
            Ok(RecordingGoalClient::new())
        })
        .await
        .expect("soft failure should not be an error");

        assert_eq!(outcome, Outcome::Skipped(expected));
        assert_eq!(connects.get(), 0, "no client for {:?}", expected);
    }
}

/// Test: language gate failures are hard errors and nothing is sent
#[tokio::test]
async fn test_gate_failures_are_config_errors() {
    let client = Arc::new(RecordingGoalClient::new());

    let mut inputs = ci_inputs();
    inputs.target_langs = Some(r#"["Ruby"]"#.to_string());
    inputs.repo_langs = Some(r#"{"Python":1}"#.to_string());
    let err = run(&inputs, |_| Ok(client.clone())).await.unwrap_err();
    assert!(matches!(err, MinderError::Config(ConfigError::NoLanguageMatch)));

    let mut inputs = ci_inputs();
    inputs.repo_langs = Some("{}".to_string());
    let err = run(&inputs, |_| Ok(client.clone())).await.unwrap_err();
    assert!(matches!(err, MinderError::Config(ConfigError::RepoLanguagesEmpty)));

    let mut inputs = ci_inputs();
    inputs.target_langs = Some(String::new());
    inputs.repo_langs = None;
    let err = run(&inputs, |_| Ok(client.clone())).await.unwrap_err();
    assert!(matches!(err, MinderError::Config(ConfigError::RepoLanguagesAbsent)));

    assert!(client.calls().is_empty(), "No client calls on config errors");
}

/// Test: an empty target list skips the gate
#[tokio::test]
async fn test_gate_skipped_without_targets() {
    let client = Arc::new(RecordingGoalClient::new());
    let mut inputs = ci_inputs();
    inputs.target_langs = Some(String::new());
    inputs.repo_langs = Some(r#"{"Python":1}"#.to_string());
    inputs.comment = Some("custom note".to_string());

    let outcome = run(&inputs, |_| Ok(client.clone())).await.unwrap();
    match outcome {
        Outcome::Committed(receipt) => {
            assert!(receipt.matched_languages.is_empty());
            assert_eq!(receipt.comment, "custom note");
        }
        other => panic!("expected Committed, got {:?}", other),
    }
    assert_eq!(client.committed().len(), 1);
}

/// Test: commit failure propagates unchanged and nothing is recorded as sent
#[tokio::test]
async fn test_commit_failure_propagates() {
    let client = Arc::new(
        RecordingGoalClient::new().failing_commit(ClientError::Authentication("bad token".to_string())),
    );

    let err = run(&ci_inputs(), |_| Ok(client.clone())).await.unwrap_err();
    assert!(matches!(
        err,
        MinderError::Client(ClientError::Authentication(ref m)) if m == "bad token"
    ));
    assert_eq!(client.calls().len(), 2);
    assert!(client.committed().is_empty());
}

/// Test: a full run against a mock Beeminder API
#[tokio::test]
async fn test_end_to_end_with_beeminder_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/goals/commits.json"))
        .and(query_param("auth_token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "slug": "commits",
            "title": "Commit daily",
            "gunits": "commits"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/alice/goals/commits/datapoints/create_all.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "1" }])))
        .expect(1)
        .mount(&server)
        .await;

    let config = BeeminderConfig::default().with_base_url(&server.uri());
    let outcome = run(&ci_inputs(), |creds| {
        BeeminderClient::new(config, creds.clone())
    })
    .await
    .expect("run failed");
    assert!(matches!(outcome, Outcome::Committed(_)));

    let requests = server.received_requests().await.expect("recording enabled");
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("commit request");
    let body: serde_json::Value = post.body_json().expect("json body");
    assert_eq!(body["datapoints"][0]["value"], "1");
    assert_eq!(
        body["datapoints"][0]["comment"],
        "main@9fceb02 via multigitminder API call"
    );
}

/// Test: an unknown goal surfaces as NotFound and nothing is posted
#[tokio::test]
async fn test_unknown_goal_with_beeminder_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "errors": "not found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = BeeminderConfig::default().with_base_url(&server.uri());
    let err = run(&ci_inputs(), |creds| BeeminderClient::new(config, creds.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, MinderError::Client(ClientError::NotFound(_))));
}
