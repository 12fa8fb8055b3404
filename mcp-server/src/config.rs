/// Runtime configuration
/// WHMCS credentials and transport settings, read once from the environment.

use anyhow::{anyhow, Result};

pub const ENV_URL: &str = "WHMCS_URL";
pub const ENV_IDENTIFIER: &str = "WHMCS_IDENTIFIER";
pub const ENV_SECRET: &str = "WHMCS_SECRET";
pub const ENV_ACCESS_KEY: &str = "WHMCS_ACCESS_KEY";
pub const ENV_MODE: &str = "WHMCS_MCP_MODE";
pub const ENV_PORT: &str = "WHMCS_MCP_PORT";

pub const DEFAULT_PORT: u16 = 3001;

/// WHMCS API credentials
///
/// Built once at startup and handed to the gateway; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct WhmcsConfig {
    /// Base URL of the WHMCS installation, without the `/includes/api.php` suffix
    pub base_url: String,
    pub identifier: String,
    pub secret: String,
    pub access_key: String,
}

impl WhmcsConfig {
    pub fn new(
        base_url: impl Into<String>,
        identifier: impl Into<String>,
        secret: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            identifier: identifier.into(),
            secret: secret.into(),
            access_key: access_key.into(),
        }
    }

    /// Load credentials from environment variables
    ///
    /// Unset variables become empty strings; see [`WhmcsConfig::missing_fields`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load credentials through an arbitrary lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();

        Self {
            base_url: read(ENV_URL),
            identifier: read(ENV_IDENTIFIER),
            secret: read(ENV_SECRET),
            access_key: read(ENV_ACCESS_KEY),
        }
    }

    /// Names of the environment variables whose value is empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (ENV_URL, &self.base_url),
            (ENV_IDENTIFIER, &self.identifier),
            (ENV_SECRET, &self.secret),
            (ENV_ACCESS_KEY, &self.access_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Full URL of the WHMCS API endpoint
    pub fn api_url(&self) -> String {
        format!("{}/includes/api.php", self.base_url.trim_end_matches('/'))
    }
}

/// Transport the server attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// REST-style tool routes plus a JSON-RPC endpoint
    Http { port: u16 },
}

impl ServerMode {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup(ENV_MODE).unwrap_or_else(|| "stdio".to_string());

        match mode.trim().to_lowercase().as_str() {
            "" | "stdio" => Ok(ServerMode::Stdio),
            "http" => {
                let port = match lookup(ENV_PORT) {
                    Some(raw) => raw
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| anyhow!("Invalid {} '{}': {}", ENV_PORT, raw, e))?,
                    None => DEFAULT_PORT,
                };
                Ok(ServerMode::Http { port })
            }
            other => Err(anyhow!(
                "Unsupported {} '{}' (expected 'stdio' or 'http')",
                ENV_MODE,
                other
            )),
        }
    }
}
