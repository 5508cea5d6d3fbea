/*!
 * Tests for job submission, retry and wait-for-completion
 *
 * Time is paused, so every backoff and poll interval elapses instantly.
 */

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use promobot::errors::{JobError, ProviderError};
use promobot::job_client::{JobClient, PollSchedule, VideoRenderer};
use promobot::providers::RenderRequest;
use promobot::providers::mock::{MockOutcome, MockRenderProvider};
use promobot::retry::RetryPolicy;
use promobot::session::AspectRatio;

fn request() -> RenderRequest {
    RenderRequest::new("script", "fun", AspectRatio::Portrait, 20)
        .with_assets(["https://cdn.example/logo.png"])
}

fn client_for(provider: &MockRenderProvider) -> JobClient {
    JobClient::new(Arc::new(provider.clone()))
}

#[tokio::test(start_paused = true)]
async fn test_render_withCompletingProvider_shouldReturnOutputUrl() {
    let provider = MockRenderProvider::completing("https://cdn.example/v.mp4");
    let client = client_for(&provider);

    let url = client.render(&request()).await.unwrap();

    assert_eq!(url, "https://cdn.example/v.mp4");
    assert_eq!(provider.create_calls(), 1);
    assert_eq!(provider.last_request(), Some(request()));
}

#[tokio::test(start_paused = true)]
async fn test_submit_withTwoTransientFailures_shouldSucceedOnThirdAttempt() {
    let provider = MockRenderProvider::new().with_create_outcomes(vec![
        MockOutcome::ConnectionError,
        MockOutcome::ApiError {
            status_code: 503,
            message: "busy".to_string(),
        },
        MockOutcome::Ok("job-9".to_string()),
    ]);
    let client = client_for(&provider);
    let started = Instant::now();

    let job_id = client.submit(&request()).await.unwrap();

    assert_eq!(job_id, "job-9");
    assert_eq!(provider.create_calls(), 3);
    // 1s after the first failure, 2s after the second
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_submit_withPersistentFailure_shouldGiveUpAfterThreeAttempts() {
    let provider = MockRenderProvider::new().with_create_outcomes(vec![MockOutcome::ConnectionError]);
    let client = client_for(&provider);

    let result = client.submit(&request()).await;

    assert!(matches!(
        result,
        Err(JobError::Submission(ProviderError::ConnectionError(_)))
    ));
    assert_eq!(provider.create_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_submit_withClientErrorAndDefaultPolicy_shouldStillRetry() {
    let provider = MockRenderProvider::new().with_create_outcomes(vec![MockOutcome::ApiError {
        status_code: 400,
        message: "bad prompt".to_string(),
    }]);
    let client = client_for(&provider);

    let result = client.submit(&request()).await;

    assert!(matches!(
        result,
        Err(JobError::Submission(ProviderError::ApiError { status_code: 400, .. }))
    ));
    assert_eq!(provider.create_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_submit_withClientErrorAndStrictPolicy_shouldFailImmediately() {
    let provider = MockRenderProvider::new().with_create_outcomes(vec![MockOutcome::ApiError {
        status_code: 422,
        message: "bad prompt".to_string(),
    }]);
    let client = client_for(&provider).with_submit_policy(RetryPolicy {
        retry_client_errors: false,
        ..RetryPolicy::submission()
    });

    assert!(client.submit(&request()).await.is_err());
    assert_eq!(provider.create_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_withQueuedProcessingCompleted_shouldFollowBackoffSchedule() {
    let provider = MockRenderProvider::new().with_status_outcomes(vec![
        MockOutcome::Ok(json!({ "status": "queued" })),
        MockOutcome::Ok(json!({ "status": "processing" })),
        MockOutcome::Ok(json!({ "status": "processing" })),
        MockOutcome::Ok(json!({ "status": "completed", "output_url": "https://cdn.example/done.mp4" })),
    ]);
    let client = client_for(&provider);
    let started = Instant::now();

    let url = client
        .wait_for_completion("job-1", Duration::from_secs(900))
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.example/done.mp4");
    assert_eq!(provider.status_calls(), 4);
    // 5s + 7.5s + 11.25s between the four checks
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(23_750));
    assert!(elapsed < Duration::from_millis(23_800));
}

#[tokio::test(start_paused = true)]
async fn test_wait_withVideoUrlOnly_shouldFallBackToIt() {
    let provider = MockRenderProvider::new().with_status_outcomes(vec![MockOutcome::Ok(
        json!({ "status": "COMPLETED", "video_url": "https://cdn.example/alt.mp4" }),
    )]);
    let client = client_for(&provider);

    let url = client
        .wait_for_completion("job-1", Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.example/alt.mp4");
}

#[tokio::test(start_paused = true)]
async fn test_wait_withFailedStatus_shouldReturnPayload() {
    let provider = MockRenderProvider::new().with_status_outcomes(vec![
        MockOutcome::Ok(json!({ "status": "queued" })),
        MockOutcome::Ok(json!({ "status": "failed", "reason": "content policy" })),
    ]);
    let client = client_for(&provider);

    let result = client.wait_for_completion("job-1", Duration::from_secs(900)).await;

    match result {
        Err(JobError::Failed(payload)) => assert_eq!(payload["reason"], "content policy"),
        other => panic!("Expected failed job, got {:?}", other),
    }
    assert_eq!(provider.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_withErrorAndCanceledStatus_shouldBeTerminal() {
    for terminal in ["error", "canceled"] {
        let provider = MockRenderProvider::new().with_statuses(&[terminal]);
        let client = client_for(&provider);

        let result = client.wait_for_completion("job-1", Duration::from_secs(900)).await;

        assert!(matches!(result, Err(JobError::Failed(_))), "status {}", terminal);
        assert_eq!(provider.status_calls(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_wait_withCompletedWithoutUrl_shouldReturnResultError() {
    let provider = MockRenderProvider::new().with_statuses(&["completed"]);
    let client = client_for(&provider);

    let result = client.wait_for_completion("job-1", Duration::from_secs(900)).await;

    assert!(matches!(result, Err(JobError::Result(_))));
}

#[tokio::test(start_paused = true)]
async fn test_wait_withEndlessProcessing_shouldTimeOut() {
    let provider = MockRenderProvider::new().with_statuses(&["processing"]);
    let client = client_for(&provider);
    let started = Instant::now();

    let result = client.wait_for_completion("job-1", Duration::from_secs(60)).await;

    assert!(matches!(result, Err(JobError::Timeout(d)) if d == Duration::from_secs(60)));
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert!(provider.status_calls() > 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_withUnreachableStatusEndpoint_shouldStopAfterStatusRetries() {
    let provider = MockRenderProvider::new().with_status_outcomes(vec![MockOutcome::ConnectionError]);
    let client = client_for(&provider);

    let result = client.wait_for_completion("job-1", Duration::from_secs(900)).await;

    assert!(matches!(result, Err(JobError::Submission(_))));
    assert_eq!(provider.status_calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_check_status_withTransientBlip_shouldRecover() {
    let provider = MockRenderProvider::new().with_status_outcomes(vec![
        MockOutcome::ApiError {
            status_code: 502,
            message: "bad gateway".to_string(),
        },
        MockOutcome::Ok(json!({ "status": "processing" })),
    ]);
    let client = client_for(&provider);

    let status = client.check_status("job-1").await.unwrap();

    assert_eq!(status.status(), "processing");
    assert_eq!(provider.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_render_withCustomSchedule_shouldUseItsHardTimeout() {
    let provider = MockRenderProvider::new()
        .with_create_outcomes(vec![MockOutcome::Ok("job-1".to_string())])
        .with_statuses(&["queued"]);
    let client = client_for(&provider).with_schedule(PollSchedule {
        initial_interval_ms: 1_000,
        multiplier: 1.0,
        max_interval_ms: 1_000,
        hard_timeout_secs: 5,
    });

    let result = client.render(&request()).await;

    assert!(matches!(result, Err(JobError::Timeout(d)) if d == Duration::from_secs(5)));
    assert_eq!(provider.status_calls(), 5);
}
