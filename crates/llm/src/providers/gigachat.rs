//! GigaChat chat provider.
//!
//! Authenticates with the OAuth client-credentials endpoint, caches the
//! access token and renews it shortly before expiry. Chat calls go to the
//! OpenAI-style `chat/completions` endpoint.

use crate::client::{map_transport_error, ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use compliance_core::config::ProviderConfig;
use compliance_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_CHAT_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_MODEL: &str = "GigaChat-Pro";

/// Renew the token once less than this much validity remains.
const TOKEN_REFRESH_MARGIN_SECS: u64 = 30;

/// Lifetime assumed when the auth response carries no expiry.
const DEFAULT_TOKEN_TTL_SECS: u64 = 540;

const AUTH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for GigaChat.
#[derive(Debug, Clone)]
pub struct GigaChatSettings {
    /// Base64 client credentials sent as `Authorization: Basic`
    pub auth_key: String,
    pub scope: String,
    pub model: String,
    pub verify_tls: bool,
    pub auth_url: String,
    pub chat_url: String,
    pub timeout_secs: u64,
}

impl GigaChatSettings {
    /// Settings with defaults for everything but the key.
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            auth_key: auth_key.into(),
            scope: DEFAULT_SCOPE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            verify_tls: true,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            timeout_secs: DEFAULT_CHAT_TIMEOUT_SECS,
        }
    }

    /// Build settings from a resolved key, the optional config block and
    /// the `GIGACHAT_SCOPE` / `GIGACHAT_MODEL` / `GIGACHAT_VERIFY` variables.
    ///
    /// A missing or blank key is a configuration error.
    pub fn resolve(auth_key: Option<&str>, config: Option<&ProviderConfig>) -> AppResult<Self> {
        let auth_key = auth_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Config("GIGACHAT_AUTH_KEY is missing".to_string()))?;

        let mut settings = Self::new(auth_key);

        if let Some(ProviderConfig::GigaChat {
            model,
            scope,
            verify_tls,
            auth_url,
            chat_url,
            timeout,
            ..
        }) = config
        {
            settings.model = model.clone();
            if let Some(scope) = scope {
                settings.scope = scope.clone();
            }
            if let Some(verify) = verify_tls {
                settings.verify_tls = *verify;
            }
            if let Some(url) = auth_url {
                settings.auth_url = url.clone();
            }
            if let Some(url) = chat_url {
                settings.chat_url = url.clone();
            }
            if let Some(timeout) = timeout {
                settings.timeout_secs = *timeout;
            }
        }

        if let Ok(scope) = std::env::var("GIGACHAT_SCOPE") {
            settings.scope = scope;
        }
        if let Ok(model) = std::env::var("GIGACHAT_MODEL") {
            settings.model = model;
        }
        if let Ok(verify) = std::env::var("GIGACHAT_VERIFY") {
            settings.verify_tls = parse_verify_flag(&verify);
        }

        Ok(settings)
    }
}

/// `0`, `false` and `no` disable verification; anything else keeps it on.
fn parse_verify_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no")
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_at: Option<u64>,
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Remaining token validity in seconds.
///
/// `expires_at` is an absolute epoch timestamp (milliseconds or seconds);
/// small values are treated as a relative lifetime.
fn token_lifetime_secs(response: &TokenResponse, now_epoch_secs: u64) -> u64 {
    match (response.expires_at, response.expires_in) {
        (Some(at), _) if at >= 1_000_000_000_000 => (at / 1000).saturating_sub(now_epoch_secs),
        (Some(at), _) if at >= 1_000_000_000 => at.saturating_sub(now_epoch_secs),
        (Some(ttl), _) => ttl,
        (None, Some(ttl)) => ttl,
        (None, None) => DEFAULT_TOKEN_TTL_SECS,
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    model: Option<String>,
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// GigaChat chat client with a cached authorization token.
pub struct GigaChatClient {
    settings: GigaChatSettings,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl GigaChatClient {
    pub fn new(settings: GigaChatSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create GigaChat HTTP client: {}", e)))?;

        if !settings.verify_tls {
            tracing::warn!("GigaChat TLS certificate verification is disabled");
        }

        Ok(Self {
            settings,
            client,
            token: Mutex::new(None),
        })
    }

    /// Return a valid access token, fetching a new one when the cached
    /// token is missing or about to expire.
    async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
            tracing::debug!("GigaChat token near expiry, renewing");
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self) -> AppResult<CachedToken> {
        tracing::debug!("Requesting GigaChat access token (scope: {})", self.settings.scope);

        let response = self
            .client
            .post(&self.settings.auth_url)
            .timeout(Duration::from_secs(AUTH_TIMEOUT_SECS))
            .header("Authorization", format!("Basic {}", self.settings.auth_key))
            .header("RqUID", uuid::Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .form(&[("scope", self.settings.scope.as_str())])
            .send()
            .await
            .map_err(|e| map_transport_error("GigaChat auth", AUTH_TIMEOUT_SECS, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "GigaChat auth error ({}): {}",
                status, error_text
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse GigaChat token: {}", e)))?;

        let now_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let lifetime = token_lifetime_secs(&body, now_epoch);

        let value = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Llm("GigaChat auth response has no access_token".to_string()))?;

        tracing::debug!("GigaChat token valid for {}s", lifetime);

        Ok(CachedToken {
            value,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait::async_trait]
impl LlmClient for GigaChatClient {
    fn provider_name(&self) -> &str {
        "gigachat"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let token = self.access_token().await?;

        let model = if request.model.is_empty() {
            self.settings.model.as_str()
        } else {
            request.model.as_str()
        };

        tracing::info!("Sending chat request to GigaChat (model: {})", model);

        let payload = ChatCompletionRequest {
            model,
            messages: request.messages(),
            temperature: request.temperature.unwrap_or(0.2),
            max_tokens: request.max_tokens.unwrap_or(700),
        };

        let response = self
            .client
            .post(&self.settings.chat_url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_transport_error("GigaChat", self.settings.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
            }
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "GigaChat API error ({}): {}",
                status, error_text
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse GigaChat response: {}", e)))?;

        into_response(body, model)
    }
}

fn into_response(body: ChatCompletionResponse, requested_model: &str) -> AppResult<LlmResponse> {
    let content = body
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AppError::Llm("GigaChat response has no choices".to_string()))?;

    Ok(LlmResponse {
        content,
        model: body.model.unwrap_or_else(|| requested_model.to_string()),
        usage: body.usage.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: Option<u64>, expires_in: Option<u64>) -> TokenResponse {
        TokenResponse {
            access_token: Some("tok".to_string()),
            expires_at,
            expires_in,
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GigaChatSettings::resolve(None, None).unwrap_err();
        assert!(err.is_fatal());

        let err = GigaChatSettings::resolve(Some("   "), None).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_config_block_overrides_defaults() {
        let config = ProviderConfig::GigaChat {
            model: "GigaChat-Max".to_string(),
            auth_key_env: None,
            scope: Some("GIGACHAT_API_CORP".to_string()),
            verify_tls: Some(false),
            auth_url: None,
            chat_url: Some("https://proxy.local/chat".to_string()),
            timeout: Some(15),
        };

        let settings = GigaChatSettings::resolve(Some("key"), Some(&config)).unwrap();
        assert_eq!(settings.auth_key, "key");
        assert_eq!(settings.chat_url, "https://proxy.local/chat");
        assert_eq!(settings.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(settings.timeout_secs, 15);
    }

    #[test]
    fn test_verify_flag_parsing() {
        assert!(!parse_verify_flag("0"));
        assert!(!parse_verify_flag("False"));
        assert!(!parse_verify_flag("no"));
        assert!(parse_verify_flag("true"));
        assert!(parse_verify_flag("1"));
    }

    #[test]
    fn test_token_lifetime_from_epoch_millis() {
        let now = 1_700_000_000;
        let response = token(Some((now + 1800) * 1000), None);
        assert_eq!(token_lifetime_secs(&response, now), 1800);
    }

    #[test]
    fn test_token_lifetime_from_epoch_seconds_and_relative() {
        let now = 1_700_000_000;
        assert_eq!(token_lifetime_secs(&token(Some(now + 600), None), now), 600);
        assert_eq!(token_lifetime_secs(&token(None, Some(300)), now), 300);
        assert_eq!(token_lifetime_secs(&token(Some(120), None), now), 120);
        assert_eq!(
            token_lifetime_secs(&token(None, None), now),
            DEFAULT_TOKEN_TTL_SECS
        );
    }

    #[test]
    fn test_expired_epoch_gives_zero_lifetime() {
        let now = 1_700_000_000;
        let response = token(Some((now - 10) * 1000), None);
        assert_eq!(token_lifetime_secs(&response, now), 0);
    }

    #[test]
    fn test_cached_token_freshness_margin() {
        let now = Instant::now();
        let fresh = CachedToken {
            value: "a".to_string(),
            expires_at: now + Duration::from_secs(600),
        };
        let stale = CachedToken {
            value: "b".to_string(),
            expires_at: now + Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS - 1),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn test_response_without_choices_is_typed_error() {
        let body: ChatCompletionResponse =
            serde_json::from_str(r#"{"object":"chat.completion","choices":[]}"#).unwrap();
        assert!(matches!(into_response(body, "m"), Err(AppError::Llm(_))));
    }

    #[test]
    fn test_response_content_extraction() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Answer [1]"}, "index": 0}],
            "model": "GigaChat-Pro:1.0",
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let body: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let response = into_response(body, "GigaChat-Pro").unwrap();
        assert_eq!(response.content, "Answer [1]");
        assert_eq!(response.model, "GigaChat-Pro:1.0");
        assert_eq!(response.usage.total_tokens, 13);
    }

    #[test]
    fn test_client_builds_without_network() {
        let client = GigaChatClient::new(GigaChatSettings::new("key")).unwrap();
        assert_eq!(client.provider_name(), "gigachat");
    }
}
