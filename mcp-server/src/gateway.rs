/// WHMCS API gateway
/// Issues exactly one form-encoded POST to `<base>/includes/api.php` per call.

use reqwest::Client;
use serde_json::Value;

use crate::config::WhmcsConfig;
use crate::error::ToolError;
use crate::tools::FormArgs;

/// Response format requested from WHMCS on every call
const RESPONSE_TYPE: &str = "json";

#[derive(Clone)]
pub struct WhmcsGateway {
    client: Client,
    config: WhmcsConfig,
}

impl WhmcsGateway {
    pub fn new(config: WhmcsConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: WhmcsConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &WhmcsConfig {
        &self.config
    }

    /// Form body for an action: credentials first, then the tool arguments
    pub fn build_form<'a>(&'a self, action: &'a str, args: &'a FormArgs) -> Vec<(&'a str, &'a str)> {
        let mut form = vec![
            ("action", action),
            ("identifier", self.config.identifier.as_str()),
            ("secret", self.config.secret.as_str()),
            ("accesskey", self.config.access_key.as_str()),
            ("responsetype", RESPONSE_TYPE),
        ];
        form.extend(args.iter().map(|(key, value)| (*key, value.as_str())));
        form
    }

    /// Call a WHMCS API action and return its JSON body untouched
    pub async fn call(&self, action: &str, args: &FormArgs) -> Result<Value, ToolError> {
        let url = self.config.api_url();
        tracing::debug!("→ POST {} action={} ({} args)", url, action, args.len());

        let response = self
            .client
            .post(&url)
            .form(&self.build_form(action, args))
            .send()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Transport(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("✗ WHMCS {} returned HTTP {}", action, status.as_u16());
            return Err(ToolError::remote(status.as_u16(), &body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ToolError::MalformedResponse(e.to_string()))?;

        tracing::debug!("✓ WHMCS {} responded ({} bytes)", action, body.len());
        Ok(value)
    }
}
