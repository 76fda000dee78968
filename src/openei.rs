//! OpenEI Utility Rate Database client
//!
//! Every request is one GET against a fixed endpoint with `version=latest`,
//! `format=json` and the API key appended. Transient failures (network
//! errors, timeouts, HTTP 429) are retried with exponential backoff; a
//! rejected key fails immediately.

use crate::config::OpenEiConfig;
use crate::error::{Result, TariffError};
use crate::logging::{LogContext, get_logger_with_context};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

pub mod transport;
pub mod types;

pub use transport::{HttpReply, ReqwestTransport, Sleeper, TokioSleeper, Transport, TransportError};
pub use types::{RatePlanSummary, RawTariff, UtilitySummary};

use types::{json_i64, json_text};

/// Error bodies are cut to this many characters in logs and messages
const BODY_EXCERPT_CHARS: usize = 200;

/// Attempt budget and exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff_base_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_seconds: 2,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): `base^attempt` seconds
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_base_seconds.saturating_pow(attempt))
    }
}

/// Source of full tariff documents for the refresh loop
#[async_trait::async_trait]
pub trait TariffSource: Send + Sync {
    async fn fetch_tariff(&self, plan_label: &str) -> Result<RawTariff>;
}

/// Client for the OpenEI Utility Rate Database API
pub struct OpenEiClient {
    api_key: String,
    base_url: String,
    policy: RetryPolicy,
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    logger: crate::logging::StructuredLogger,
}

impl OpenEiClient {
    /// Client over reqwest and the tokio timer
    pub fn new(config: &OpenEiConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_seconds))?;
        Ok(Self::with_transport(
            config,
            Box::new(transport),
            Box::new(TokioSleeper),
        ))
    }

    pub fn with_transport(
        config: &OpenEiConfig,
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("openei").with_field("endpoint", config.base_url.clone()),
        );
        Self {
            api_key: config.api_key.trim().to_string(),
            base_url: config.base_url.clone(),
            policy: RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                backoff_base_seconds: config.backoff_base_seconds,
            },
            transport,
            sleeper,
            logger,
        }
    }

    /// Issue one logical request, retrying transient failures
    async fn request(&self, params: &[(&str, String)]) -> Result<Value> {
        let mut query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        let redacted = format!("{:?}", query);
        query.push(("version".to_string(), "latest".to_string()));
        query.push(("format".to_string(), "json".to_string()));
        query.push(("api_key".to_string(), self.api_key.clone()));

        let max = self.policy.max_attempts;
        let mut last_failure = String::new();

        for attempt in 1..=max {
            self.logger.debug(&format!(
                "OpenEI request (attempt {}/{}): {}",
                attempt, max, redacted
            ));

            let failure = match self.transport.get(&self.base_url, &query).await {
                Ok(reply) => match reply.status {
                    200 => return self.decode_body(&reply.body),
                    401 => {
                        return Err(TariffError::auth(
                            "Invalid OpenEI API key. Get a free key at \
                             https://apps.openei.org/services/api/signup/",
                        ));
                    }
                    429 => "rate limited (HTTP 429)".to_string(),
                    status => {
                        let message =
                            format!("OpenEI API returned status {}: {}", status, excerpt(&reply.body));
                        self.logger.error(&message);
                        return Err(TariffError::protocol(message));
                    }
                },
                Err(e) => e.to_string(),
            };

            if attempt < max {
                let wait = self.policy.delay_after(attempt);
                self.logger.warn(&format!(
                    "OpenEI request failed ({}), retrying in {}s",
                    failure,
                    wait.as_secs()
                ));
                self.sleeper.sleep(wait).await;
            }
            last_failure = failure;
        }

        Err(TariffError::connection(format!(
            "Failed to connect to OpenEI after {} attempts: {}",
            max, last_failure
        )))
    }

    fn decode_body(&self, body: &str) -> Result<Value> {
        let data: Value = serde_json::from_str(body).map_err(|e| {
            TariffError::protocol(format!(
                "OpenEI returned invalid JSON ({}): {}",
                e,
                excerpt(body)
            ))
        })?;

        if let Some(err) = data.get("error") {
            let message = match err {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if mentions_credential(&message) {
                return Err(TariffError::auth(message));
            }
            self.logger
                .error(&format!("OpenEI API error payload: {}", excerpt(&message)));
            return Err(TariffError::protocol(message));
        }

        Ok(data)
    }

    /// Check the API key with a minimal request
    pub async fn validate_credential(&self) -> Result<()> {
        match self
            .request(&[("limit", "1".to_string()), ("detail", "minimal".to_string())])
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                if !e.is_auth() {
                    self.logger
                        .error(&format!("API key validation failed: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Residential utilities, optionally limited to one US state, sorted by name
    pub async fn list_utilities(&self, state: Option<&str>) -> Result<Vec<UtilitySummary>> {
        let mut params = vec![
            ("detail", "minimal".to_string()),
            ("limit", "500".to_string()),
            ("sector", "Residential".to_string()),
        ];
        if let Some(state) = state.map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("address", state.to_string()));
        }

        let data = self.request(&params).await?;

        let mut utilities: BTreeMap<String, String> = BTreeMap::new();
        for item in items(&data) {
            let name = item.get("utility").and_then(json_text).unwrap_or_default();
            let id = item.get("eiaid").and_then(json_text).unwrap_or_default();
            if name.is_empty() || id.is_empty() {
                continue;
            }
            utilities.entry(name).or_insert(id);
        }

        let result: Vec<UtilitySummary> = utilities
            .into_iter()
            .map(|(name, utility_id)| UtilitySummary { name, utility_id })
            .collect();
        self.logger.debug(&format!("Found {} utilities", result.len()));
        Ok(result)
    }

    /// Residential plans of one utility, newest effective date first
    pub async fn list_plans(&self, utility_id: &str) -> Result<Vec<RatePlanSummary>> {
        let params = [
            ("eia", utility_id.to_string()),
            ("sector", "Residential".to_string()),
            ("detail", "minimal".to_string()),
            ("limit", "100".to_string()),
            ("orderby", "startdate".to_string()),
            ("direction", "desc".to_string()),
        ];
        let data = self.request(&params).await?;

        let text = |item: &Value, key: &str| item.get(key).and_then(json_text).unwrap_or_default();

        let mut seen = HashSet::new();
        let mut plans: Vec<RatePlanSummary> = Vec::new();
        for item in items(&data) {
            let label = text(item, "label");
            let name = Some(text(item, "name"))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| label.clone());
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            plans.push(RatePlanSummary {
                name,
                label,
                description: text(item, "description"),
                effective_date: item.get("startdate").and_then(json_i64),
                end_date: item.get("enddate").and_then(json_i64),
                source: text(item, "source"),
                uri: text(item, "uri"),
            });
        }

        // Newest first; undated plans last
        plans.sort_by(|a, b| match (a.effective_date, b.effective_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        self.logger.debug(&format!(
            "Found {} rate plans for utility {}",
            plans.len(),
            utility_id
        ));
        Ok(plans)
    }

    /// Full-detail tariff document for one plan label
    pub async fn fetch_tariff(&self, plan_label: &str) -> Result<RawTariff> {
        let params = [
            ("getpage", plan_label.to_string()),
            ("detail", "full".to_string()),
        ];
        let data = self.request(&params).await?;

        let Some(document) = items(&data).first() else {
            return Err(TariffError::protocol(format!(
                "No rate schedule found for plan '{}'. The rate plan may have been \
                 retired or the ID is incorrect.",
                plan_label
            )));
        };

        let raw = RawTariff::new(document.clone());
        self.logger.debug(&format!(
            "Fetched rate schedule: {} (utility: {})",
            raw.text("name").unwrap_or_else(|| "unknown".to_string()),
            raw.text("utility").unwrap_or_else(|| "unknown".to_string())
        ));
        Ok(raw)
    }
}

#[async_trait::async_trait]
impl TariffSource for OpenEiClient {
    async fn fetch_tariff(&self, plan_label: &str) -> Result<RawTariff> {
        OpenEiClient::fetch_tariff(self, plan_label).await
    }
}

fn items(data: &Value) -> &[Value] {
    data.get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Error text naming the API key or a credential as a whole word
fn mentions_credential(message: &str) -> bool {
    message
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| matches!(word, "key" | "apikey" | "credential" | "credentials"))
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
