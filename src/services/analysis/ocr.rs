use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::ContentAnalysis,
};

use super::{ClickbaitTaxonomy, ContentAnalyzer};

/// Clickbait analyzer backed by a remote OCR endpoint
///
/// Posts the image URI to the endpoint, reads back the extracted text and
/// scores it against the [`ClickbaitTaxonomy`].
#[derive(Clone)]
pub struct OcrClickbaitAnalyzer {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    taxonomy: ClickbaitTaxonomy,
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: String,
}

impl OcrClickbaitAnalyzer {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
            taxonomy: ClickbaitTaxonomy::default(),
        }
    }

    /// Replaces the default term taxonomy
    pub fn with_taxonomy(mut self, taxonomy: ClickbaitTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Fetches the text found in an image
    async fn extract_text(&self, image_uri: &str) -> AppResult<String> {
        let mut request = self
            .http_client
            .post(&self.api_url)
            .json(&OcrRequest {
                image_url: image_uri,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OCR API returned status {}: {}",
                status, body
            )));
        }

        let ocr: OcrResponse = response.json().await?;
        Ok(ocr.text)
    }
}

#[async_trait::async_trait]
impl ContentAnalyzer for OcrClickbaitAnalyzer {
    async fn try_analyze(&self, image_uri: &str) -> AppResult<ContentAnalysis> {
        if image_uri.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Image URI cannot be empty".to_string(),
            ));
        }

        let text = self.extract_text(image_uri).await?;
        let analysis = self.taxonomy.score_text(&text);

        tracing::debug!(
            image_uri = %image_uri,
            clickbait_score = analysis.clickbait_score,
            terms = ?analysis.detected_terms,
            "Poster analyzed"
        );

        Ok(analysis)
    }

    fn name(&self) -> &'static str {
        "ocr"
    }
}
