use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::Translator;
use crate::config::TranslateConfig;
use crate::error::{JimakuError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct BlockRequest<'a> {
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub lines: &'a [String],
    pub glossary: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    pub translations: Vec<String>,
}

/// Generic JSON translation endpoint.
///
/// Each block is POSTed as `{source_lang, target_lang, lines, glossary}` and the
/// endpoint answers with `{translations}`, one entry per line.
pub struct ApiTranslator {
    client: Client,
    url: String,
    api_key: Option<String>,
    glossary: BTreeMap<String, String>,
}

impl ApiTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let url = config
            .api_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                JimakuError::Config("translate.api_url is required for the api provider".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("jimaku/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            glossary: config.glossary.clone(),
        })
    }
}

#[async_trait]
impl Translator for ApiTranslator {
    async fn translate_block(
        &self,
        lines: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>> {
        let request = BlockRequest {
            source_lang,
            target_lang,
            lines,
            glossary: &self.glossary,
        };

        debug!("Sending {} lines to {}", lines.len(), self.url);

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| JimakuError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(JimakuError::Translation(format!(
                "Translation API error {}: {}",
                status, error_text
            )));
        }

        let body: BlockResponse = response
            .json()
            .await
            .map_err(|e| JimakuError::Translation(format!("Failed to parse response: {}", e)))?;

        Ok(body.translations)
    }

    fn name(&self) -> &str {
        "api"
    }
}
