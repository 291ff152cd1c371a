use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Free-text fields of one profile sent to the scoring service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityCandidate {
    pub id: i32,
    pub bio: Option<String>,
    pub interests: Option<String>,
    pub occupation: Option<String>,
}

impl From<&crate::models::Profile> for SimilarityCandidate {
    fn from(profile: &crate::models::Profile) -> Self {
        Self {
            id: profile.user_id,
            bio: profile.bio.clone(),
            interests: profile.interests.clone(),
            occupation: profile.occupation.clone(),
        }
    }
}

/// Result of one similarity lookup.
///
/// `Scored` may be partial: candidates missing from the map simply have no
/// similarity score. `Unavailable` means the whole call failed.
#[derive(Debug, Clone, PartialEq)]
pub enum SimilarityOutcome {
    Scored(HashMap<i32, f64>),
    Unavailable(String),
}

impl SimilarityOutcome {
    pub fn scores(&self) -> Option<&HashMap<i32, f64>> {
        match self {
            SimilarityOutcome::Scored(scores) => Some(scores),
            SimilarityOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SimilarityOutcome::Scored(_))
    }
}

/// Source of semantic similarity scores between profiles
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Score `candidates` against `requester_id` in a single batch.
    ///
    /// Never fails: any problem is reported as `SimilarityOutcome::Unavailable`.
    async fn fetch_scores(
        &self,
        requester_id: i32,
        candidates: &[SimilarityCandidate],
        top_k: Option<usize>,
    ) -> SimilarityOutcome;
}

#[derive(Debug, Serialize)]
struct ScoresRequest<'a> {
    user_id: i32,
    users_data: &'a [SimilarityCandidate],
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct ScoredUser {
    id: i32,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct ScoresResponse {
    recommendations: Vec<ScoredUser>,
}

/// HTTP client for the text similarity service
///
/// Issues exactly one `POST /recommendations_with_scores/` per call with the
/// full candidate batch. No retries.
pub struct HttpSimilarityClient {
    base_url: String,
    client: Client,
}

impl HttpSimilarityClient {
    /// Create a new client with a bounded request timeout
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/recommendations_with_scores/",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn request_scores(
        &self,
        requester_id: i32,
        candidates: &[SimilarityCandidate],
        top_k: Option<usize>,
    ) -> Result<HashMap<i32, f64>, String> {
        let body = ScoresRequest {
            user_id: requester_id,
            users_data: candidates,
            top_k: top_k.unwrap_or(candidates.len()),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(format!("service returned {}: {}", status, body));
        }

        let parsed: ScoresResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed response: {}", e))?;

        Ok(parsed
            .recommendations
            .into_iter()
            .filter(|scored| scored.score.is_finite())
            // + 0.0 folds a clamped -0.0 into 0.0
            .map(|scored| (scored.id, scored.score.clamp(0.0, 1.0) + 0.0))
            .collect())
    }
}

#[async_trait]
impl SimilarityScorer for HttpSimilarityClient {
    async fn fetch_scores(
        &self,
        requester_id: i32,
        candidates: &[SimilarityCandidate],
        top_k: Option<usize>,
    ) -> SimilarityOutcome {
        tracing::debug!(
            "Requesting similarity scores for user {} over {} profiles",
            requester_id,
            candidates.len()
        );

        match self.request_scores(requester_id, candidates, top_k).await {
            Ok(scores) => {
                tracing::debug!("Received {} similarity scores", scores.len());
                SimilarityOutcome::Scored(scores)
            }
            Err(reason) => {
                tracing::warn!(
                    "Similarity service unavailable for user {}, falling back to tag matching: {}",
                    requester_id,
                    reason
                );
                SimilarityOutcome::Unavailable(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<SimilarityCandidate> {
        vec![
            SimilarityCandidate {
                id: 1,
                bio: Some("hiker".to_string()),
                interests: Some("mountains".to_string()),
                occupation: None,
            },
            SimilarityCandidate {
                id: 2,
                bio: None,
                interests: None,
                occupation: Some("chef".to_string()),
            },
        ]
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client =
            HttpSimilarityClient::new("http://scorer:8085/".to_string(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://scorer:8085/recommendations_with_scores/"
        );
    }

    #[test]
    fn test_request_wire_format() {
        let batch = candidates();
        let body = ScoresRequest {
            user_id: 1,
            users_data: &batch,
            top_k: 2,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["user_id"], 1);
        assert_eq!(json["top_k"], 2);
        assert_eq!(json["users_data"][0]["bio"], "hiker");
        assert!(json["users_data"][1]["bio"].is_null());
        assert_eq!(json["users_data"][1]["occupation"], "chef");
    }

    #[tokio::test]
    async fn test_scores_are_clamped_and_partial() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/recommendations_with_scores/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"recommendations":[{"id":2,"score":1.7},{"id":3,"score":-0.2}]}"#)
            .create_async()
            .await;

        let client = HttpSimilarityClient::new(server.url(), Duration::from_secs(2)).unwrap();
        let outcome = client.fetch_scores(1, &candidates(), None).await;

        mock.assert_async().await;
        let scores = outcome.scores().expect("call should succeed");
        assert_eq!(scores.get(&2), Some(&1.0));
        assert_eq!(scores.get(&3), Some(&0.0));
        assert_eq!(scores.get(&1), None);
    }

    #[tokio::test]
    async fn test_negative_zero_score_is_normalized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/recommendations_with_scores/")
            .with_status(200)
            .with_body(r#"{"recommendations":[{"id":2,"score":-0.0},{"id":3,"score":-0.5}]}"#)
            .create_async()
            .await;

        let client = HttpSimilarityClient::new(server.url(), Duration::from_secs(2)).unwrap();
        let outcome = client.fetch_scores(1, &candidates(), None).await;

        let scores = outcome.scores().expect("call should succeed");
        assert!(scores[&2].is_sign_positive());
        assert!(scores[&3].is_sign_positive());
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        // Accept connections and never answer
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client =
            HttpSimilarityClient::new(format!("http://{}", addr), Duration::from_millis(300))
                .unwrap();

        let started = std::time::Instant::now();
        let outcome = client.fetch_scores(1, &candidates(), None).await;
        let elapsed = started.elapsed();

        assert!(matches!(outcome, SimilarityOutcome::Unavailable(_)));
        assert!(elapsed >= Duration::from_millis(250), "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);

        server.abort();
    }

    #[tokio::test]
    async fn test_top_k_defaults_to_batch_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/recommendations_with_scores/")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"user_id": 1, "top_k": 2}),
            ))
            .with_status(200)
            .with_body(r#"{"recommendations":[]}"#)
            .create_async()
            .await;

        let client = HttpSimilarityClient::new(server.url(), Duration::from_secs(2)).unwrap();
        let outcome = client.fetch_scores(1, &candidates(), None).await;

        mock.assert_async().await;
        assert_eq!(outcome, SimilarityOutcome::Scored(HashMap::new()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/recommendations_with_scores/")
            .with_status(500)
            .with_body(r#"{"error":"Internal server error"}"#)
            .create_async()
            .await;

        let client = HttpSimilarityClient::new(server.url(), Duration::from_secs(2)).unwrap();
        let outcome = client.fetch_scores(1, &candidates(), Some(10)).await;

        assert!(!outcome.is_available());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/recommendations_with_scores/")
            .with_status(200)
            .with_body(r#"{"results":"nope"}"#)
            .create_async()
            .await;

        let client = HttpSimilarityClient::new(server.url(), Duration::from_secs(2)).unwrap();
        let outcome = client.fetch_scores(1, &candidates(), None).await;

        assert!(matches!(outcome, SimilarityOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let client = HttpSimilarityClient::new(
            "http://127.0.0.1:9".to_string(),
            Duration::from_millis(500),
        )
        .unwrap();

        let outcome = client.fetch_scores(1, &candidates(), None).await;

        assert!(matches!(outcome, SimilarityOutcome::Unavailable(_)));
    }
}
