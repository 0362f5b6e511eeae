use anyhow::{Context, Result, anyhow};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    // Console Configuration
    pub console_url: String,
    pub console_username: String,
    pub console_password: String,

    // Application Configuration
    pub request_timeout: u64,
    pub skip_tls_verify: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let console_url = get_env_required("CONSOLE_URL")?;
        let console_username = get_env_required("CONSOLE_USERNAME")?;
        let console_password = get_env_required("CONSOLE_PASSWORD")?;

        let request_timeout = get_env_u64_with_default("REQUEST_TIMEOUT", 60);
        // Self-hosted consoles commonly run with self-signed certificates
        let skip_tls_verify = get_env_bool_with_default("SKIP_TLS_VERIFY", false);

        Ok(Config {
            console_url,
            console_username,
            console_password,
            request_timeout,
            skip_tls_verify,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.console_url.starts_with("http://") && !self.console_url.starts_with("https://") {
            return Err(anyhow!(
                "CONSOLE_URL must start with http:// or https://, got: {}",
                self.console_url
            ));
        }

        if self.request_timeout == 0 {
            return Err(anyhow!("REQUEST_TIMEOUT must be greater than zero"));
        }

        Ok(())
    }
}

fn get_env_required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("Environment variable {} is required but not set", key))
}

fn get_env_u64_with_default(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_env_bool_with_default(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl Config {
    pub fn new_for_test(console_url: String) -> Self {
        Self {
            console_url,
            console_username: "admin".to_string(),
            console_password: "password".to_string(),
            request_timeout: 60,
            skip_tls_verify: false,
        }
    }
}
