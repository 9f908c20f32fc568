//! Summariser seam: failures map to absence, and the trait is mockable.

use fileconv::summarize::{MockSummarizer, OpenAiSummarizer, Summarizer};

#[tokio::test]
async fn invalid_credential_against_unreachable_service_returns_none() {
    let summarizer = OpenAiSummarizer::with_api_base(
        Some("sk-invalid".to_string()),
        "http://127.0.0.1:1".to_string(),
    );
    // Must swallow the connection failure, never error.
    assert_eq!(summarizer.summarize("a long enough text").await, None);
}

#[tokio::test]
async fn absent_credential_short_circuits_to_none() {
    let summarizer = OpenAiSummarizer::new(None);
    assert_eq!(summarizer.summarize("text").await, None);
}

#[tokio::test]
async fn callers_treat_the_seam_as_a_trait_object() {
    let mut mock = MockSummarizer::new();
    mock.expect_summarize()
        .returning(|_| Some("a canned summary".to_string()));

    let summarizer: Box<dyn Summarizer> = Box::new(mock);
    assert_eq!(
        summarizer.summarize("anything").await,
        Some("a canned summary".to_string())
    );
}
