/*!
 * Tests for job payload interpretation
 */

use serde_json::json;

use promobot::providers::{JobStatus, RenderRequest, extract_job_id};
use promobot::session::AspectRatio;

#[test]
fn test_extractJobId_shouldPreferJobIdOverId() {
    assert_eq!(
        extract_job_id(&json!({ "job_id": "a", "id": "b" })),
        Some("a".to_string())
    );
    assert_eq!(extract_job_id(&json!({ "id": "b" })), Some("b".to_string()));
}

#[test]
fn test_extractJobId_withNumericId_shouldRenderDecimal() {
    assert_eq!(extract_job_id(&json!({ "id": 1234 })), Some("1234".to_string()));
}

#[test]
fn test_extractJobId_withNoUsableId_shouldReturnNone() {
    assert_eq!(extract_job_id(&json!({ "status": "queued" })), None);
    assert_eq!(extract_job_id(&json!({ "job_id": "" })), None);
    assert_eq!(extract_job_id(&json!({ "job_id": null })), None);
}

#[test]
fn test_jobStatus_shouldCompareCaseInsensitively() {
    assert!(JobStatus::new(json!({ "status": "Completed" })).is_completed());
    assert!(JobStatus::new(json!({ "status": "CANCELED" })).is_failed());
    assert!(!JobStatus::new(json!({ "status": "processing" })).is_failed());
    assert_eq!(JobStatus::new(json!({})).status(), "");
}

#[test]
fn test_jobStatus_outputUrl_shouldPreferOutputUrl() {
    let both = JobStatus::new(json!({ "output_url": "https://a", "video_url": "https://b" }));
    let video_only = JobStatus::new(json!({ "output_url": "", "video_url": "https://b" }));

    assert_eq!(both.output_url(), Some("https://a".to_string()));
    assert_eq!(video_only.output_url(), Some("https://b".to_string()));
    assert_eq!(JobStatus::new(json!({ "status": "completed" })).output_url(), None);
}

#[test]
fn test_renderRequest_shouldSerializeToWireShape() {
    let request = RenderRequest::new("script", "забавен", AspectRatio::Square, 15)
        .with_assets(["https://a/logo.png", "https://a/photo.jpg"]);

    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(
        value,
        json!({
            "prompt": "script",
            "style": "забавен",
            "aspect_ratio": "1:1",
            "duration": 15,
            "assets": [
                { "url": "https://a/logo.png" },
                { "url": "https://a/photo.jpg" }
            ]
        })
    );
}
