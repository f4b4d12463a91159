use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

use super::PluginConfig;
use crate::plugin::PluginError;

/// Builds the client shared by all HTTP plugins.
pub fn build_client(config: &PluginConfig) -> Result<Client, PluginError> {
    Ok(Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(Policy::limited(10))
        .build()?)
}

/// GETs `url` and returns the body of a 2xx response.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, PluginError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PluginError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}
