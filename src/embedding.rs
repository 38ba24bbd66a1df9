//! HTTP client for the external embedding service (§6). Grounded on the
//! teacher's `LLMService` shape (a `reqwest::Client` plus an endpoint
//! and optional key) but implements a real request/response cycle
//! instead of a local rule-based stand-in.

use crate::core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct EmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponseData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingResponseData>,
}

impl EmbeddingClient {
    pub fn new(base_url: String, model: String, api_key: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url,
            model,
            api_key,
        }
    }

    /// Embeds `text` and returns an L2-normalized vector (§4.3 step 1).
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let mut req = self.http.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| CoreError::embedding_unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::embedding_unavailable(format!(
                "embedding service returned status {}",
                response.status()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| CoreError::embedding_unavailable(e.to_string()))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CoreError::embedding_unavailable("empty embedding response".to_string()))?;

        Ok(l2_normalize(vector))
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let v = l2_normalize(vec![3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_handles_zero_vector() {
        let v = l2_normalize(vec![0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
