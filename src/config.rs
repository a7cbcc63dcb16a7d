use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Symmetric secret used to sign bearer tokens. Set once at startup.
    pub secret_key: String,
    /// Base URL of the billing/usage API being proxied.
    pub upstream_base_url: String,
    /// Credential forwarded to the upstream on every proxied call.
    pub upstream_api_key: String,
    pub upstream_org_id: Option<String>,
    /// TTL for cached upstream responses, in seconds.
    pub cache_ttl_secs: u64,
    pub token_expiry_hours: i64,
}

const SECRET_PLACEHOLDER: &str = "your-secret-key-change-this-in-production";
const API_KEY_PLACEHOLDER: &str = "Your_OpenAI_API_Key_Here";

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let upstream_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if upstream_api_key.is_empty() || upstream_api_key == API_KEY_PLACEHOLDER {
        anyhow::bail!(
            "OPENAI_API_KEY is missing or still the placeholder. \
             Set a valid API key before starting the gateway."
        );
    }

    let secret_key =
        std::env::var("SECRET_KEY").unwrap_or_else(|_| SECRET_PLACEHOLDER.into());
    if secret_key == SECRET_PLACEHOLDER {
        let env_mode = std::env::var("RUST_ENV").unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SECRET_KEY is still the insecure placeholder. \
                 Set a proper signing secret before running in production."
            );
        }
        eprintln!("⚠️  SECRET_KEY is not set — using insecure placeholder. Set a real secret for production.");
    }

    Ok(Config {
        port: std::env::var("GATEWAY_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .unwrap_or(5000),
        secret_key,
        upstream_base_url: std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".into()),
        upstream_api_key,
        upstream_org_id: std::env::var("OPENAI_ORG_ID").ok().filter(|s| !s.is_empty()),
        cache_ttl_secs: std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600),
        token_expiry_hours: std::env::var("TOKEN_EXPIRY_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24),
    })
}
