//! End-to-end pipeline tests against a mock chat-completion server.

use diffscribe::data::Language;
use diffscribe::llm::ai::openai::{OpenAiClient, OUTPUT_TOOL_NAME};
use diffscribe::llm::client::GenerationClient;
use diffscribe::llm::context_limit::{ContextLimitCache, ContextLimitResolver, ProbePolicy};
use diffscribe::llm::token_budget::{estimate_tokens, TokenBudget};
use diffscribe::pipeline::{GenerationPipeline, PipelineError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_file_diff(path: &str, lines: usize, width: usize) -> String {
    let body: String = (0..lines)
        .map(|_| format!("+{}\n", "a".repeat(width)))
        .collect();
    format!(
        "diff --git a/{path} b/{path}\n\
         index abc1234..def5678 100644\n\
         --- a/{path}\n\
         +++ b/{path}\n\
         @@ -0,0 +1,{lines} @@\n{body}"
    )
}

fn completion(commit: &str, branch: &str) -> Value {
    let arguments = json!({
        "commit": commit,
        "branch": branch,
        "description": "## What changed\\n- modules\n\n## Why\n- tests\n\n## How to test\n- run",
        "title": "Add modules"
    });
    json!({
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "type": "function",
                    "function": {"name": OUTPUT_TOOL_NAME, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 1000, "completion_tokens": 100, "total_tokens": 1100}
    })
}

fn pipeline(server: &MockServer, model: &str) -> GenerationPipeline {
    let client = OpenAiClient::new(
        model.to_string(),
        "sk-test".to_string(),
        format!("{}/v1", server.uri()),
        0.3,
        true,
    )
    .expect("Failed to build client");
    let resolver = ContextLimitResolver::new(ContextLimitCache::new(), ProbePolicy::Disabled)
        .expect("Failed to build resolver");
    GenerationPipeline::new(GenerationClient::new(Box::new(client)), resolver)
}

#[tokio::test]
async fn small_diff_makes_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("feat(core): add greeting", "feat/add greeting")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let diff = make_file_diff("src/lib.rs", 10, 40);
    let result = pipeline(&server, "gpt-4o-mini")
        .run(&diff, Language::English)
        .await
        .unwrap();

    assert_eq!(result.commit, "feat(core): add greeting");
    assert_eq!(result.branch, "feat/add-greeting");
    assert!(!result.branch.contains(' '));
    assert!(result.description.starts_with("## What changed\n- modules"));
    assert!(!result.title.is_empty());
}

#[tokio::test]
async fn fifty_file_diff_is_batched_and_merged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("feat: add modules", "feat/add-modules")),
        )
        .mount(&server)
        .await;

    let diff: String = (0..50)
        .map(|i| make_file_diff(&format!("src/module_{i}.rs"), 20, 52))
        .collect();
    let available = TokenBudget::new(8_192).available_tokens();
    assert!(estimate_tokens(&diff) >= available * 3);

    let result = pipeline(&server, "gpt-4")
        .run(&diff, Language::English)
        .await
        .unwrap();
    assert_eq!(result.commit, "feat: add modules");
    assert!(!result.branch.contains(' '));

    let requests = server.received_requests().await.unwrap();
    // At least two batches plus the merge request.
    assert!(requests.len() >= 3, "got {} requests", requests.len());

    let bodies: Vec<Value> = requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    let first_system = bodies[0]["messages"][0]["content"].as_str().unwrap();
    assert!(first_system.contains("batch 1 of"));
    let merge_user = bodies.last().unwrap()["messages"][1]["content"]
        .as_str()
        .unwrap();
    assert!(merge_user.contains(&format!("{} batch results", requests.len() - 1)));

    // Every file is sent in some batch.
    let all_user: String = bodies[..bodies.len() - 1]
        .iter()
        .map(|b| b["messages"][1]["content"].as_str().unwrap().to_string())
        .collect();
    for i in 0..50 {
        assert!(all_user.contains(&format!("diff --git a/src/module_{i}.rs")));
    }
}

#[tokio::test]
async fn every_batch_failing_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let diff: String = (0..50)
        .map(|i| make_file_diff(&format!("src/module_{i}.rs"), 20, 52))
        .collect();
    let err = pipeline(&server, "gpt-4")
        .run(&diff, Language::English)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::AllBatchesFailed { .. })
    ));
}

#[tokio::test]
async fn invalid_input_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server, "gpt-4");
    assert!(pipeline.run("", Language::English).await.is_err());
    assert!(pipeline
        .run("release notes, not a diff", Language::English)
        .await
        .is_err());
}
