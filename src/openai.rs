//! OpenAI client construction for the transcription tools.

use crate::config::OpenAiSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from settings.
///
/// The API key comes from `OPENAI_API_KEY`; a missing key surfaces as an
/// authentication error on the first request, not here.
pub fn create_client(settings: &OpenAiSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = settings.api_base.as_deref() {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
