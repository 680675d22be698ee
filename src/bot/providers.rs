//! AI completion providers and the failover chain.
//!
//! Each provider is a plain HTTP endpoint with its own parameter name for
//! the prompt text and its own response shape. The chain tries them in
//! configured order and settles for the first usable reply.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// Per-provider request timeout. A slow provider costs at most this much
/// before the chain moves on.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Reply returned when every provider fails.
pub const FALLBACK_REPLY: &str =
    "I'm experiencing technical difficulties. Please try again! 😊";

/// Response fields probed for the reply text, in priority order.
const REPLY_FIELDS: [&str; 5] = ["result", "response", "message", "reply", "answer"];

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// A single completion endpoint. GET providers send parameters as a query
/// string, POST providers as a JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Name of the parameter carrying the prompt text.
    pub text_param: String,
    /// Static parameters sent with every request.
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
}

impl ProviderSpec {
    pub fn get(name: &str, url: &str, text_param: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            method: HttpMethod::Get,
            text_param: text_param.to_string(),
            extra_params: BTreeMap::new(),
        }
    }

    pub fn post(name: &str, url: &str, text_param: &str, extra: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            method: HttpMethod::Post,
            text_param: text_param.to_string(),
            extra_params: extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Build the full parameter set for a request.
    fn request_params(&self, text: &str) -> BTreeMap<String, String> {
        let mut params = self.extra_params.clone();
        params.insert(self.text_param.clone(), text.to_string());
        params
    }
}

/// Ordered chain of completion providers.
pub struct AiChain {
    providers: Vec<ProviderSpec>,
    client: reqwest::Client,
}

impl AiChain {
    pub fn new(providers: Vec<ProviderSpec>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { providers, client }
    }

    /// Get a completion for `text`. Never fails: providers are tried in
    /// order and if all of them error out, time out, or return nothing
    /// usable, the static fallback reply is returned instead.
    pub async fn complete_text(&self, text: &str) -> String {
        for spec in &self.providers {
            match self.try_provider(spec, text).await {
                Ok(reply) => {
                    info!("AI ({}): ok", spec.name);
                    return reply;
                }
                Err(e) => {
                    warn!("AI ({}): failed: {}", spec.name, e);
                }
            }
        }

        FALLBACK_REPLY.to_string()
    }

    async fn try_provider(&self, spec: &ProviderSpec, text: &str) -> Result<String, String> {
        let params = spec.request_params(text);

        let request = match spec.method {
            HttpMethod::Get => self.client.get(&spec.url).query(&params),
            HttpMethod::Post => self.client.post(&spec.url).json(&params),
        };

        let response = request
            .send()
            .await
            .map_err(|e| format!("request error: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {status}"));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("bad JSON body: {e}"))?;

        extract_reply(&body).ok_or_else(|| "no usable reply field".to_string())
    }
}

/// Probe known reply fields in priority order, then the one nested
/// fallback path (`data.response`). First non-empty string wins.
pub fn extract_reply(body: &Value) -> Option<String> {
    for field in REPLY_FIELDS {
        if let Some(reply) = non_empty_str(body.get(field)) {
            return Some(reply);
        }
    }
    non_empty_str(body.get("data").and_then(|d| d.get("response")))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
