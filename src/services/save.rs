use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::platform::Platform;

const SAVE_PATH: &str = "/api/ai/save-generation";
const CONTENT_TYPE_SOCIAL: &str = "social_content";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveGenerationRequest<'a> {
    content_target_id: &'a str,
    content_type: &'a str,
    platform: Platform,
    generated_content: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaveErrorBody {
    error: String,
}

pub struct SaveClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SaveClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Persists one platform's generated content. A non-2xx response with an
    /// `error` field in the body surfaces that message verbatim.
    pub async fn save_generation(
        &self,
        content_target_id: &str,
        platform: Platform,
        generated_content: &str,
    ) -> Result<()> {
        let request = SaveGenerationRequest {
            content_target_id,
            content_type: CONTENT_TYPE_SOCIAL,
            platform,
            generated_content,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, SAVE_PATH))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<SaveErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {status}"),
            };
            return Err(AppError::SaveApi(message));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_wire_contract() {
        let request = SaveGenerationRequest {
            content_target_id: "article-42",
            content_type: CONTENT_TYPE_SOCIAL,
            platform: Platform::Instagram,
            generated_content: "Caption time",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contentTargetId"], "article-42");
        assert_eq!(json["contentType"], "social_content");
        assert_eq!(json["platform"], "instagram");
        assert_eq!(json["generatedContent"], "Caption time");
    }
}
