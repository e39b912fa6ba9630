use std::env;
use std::time::Duration;

use crate::ai_predict::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::provider::ProviderSettings;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SUM_TOLERANCE: i32 = 5;
const DEFAULT_PARALLELISM: usize = 4;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ai_enabled: bool,
    /// `None` routes every request to the heuristic.
    pub provider: Option<ProviderSettings>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub sum_tolerance: i32,
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            provider: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            sum_tolerance: DEFAULT_SUM_TOLERANCE,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let ai_enabled = get("PREDICT_AI_ENABLED")
            .map(|v| parse_bool(&v))
            .unwrap_or(true);
        let api_key = get("PREDICT_API_KEY").or_else(|| get("OPENAI_API_KEY"));
        let timeout_secs = get("PREDICT_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(2, 120);

        let provider = api_key.map(|api_key| ProviderSettings {
            api_key,
            base_url: get("PREDICT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: get("PREDICT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        });

        let temperature = get("PREDICT_TEMPERATURE")
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_TEMPERATURE)
            .clamp(0.0, 2.0);
        let max_tokens = get("PREDICT_MAX_TOKENS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .clamp(64, 4096);
        let sum_tolerance = get("PREDICT_SUM_TOLERANCE")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(DEFAULT_SUM_TOLERANCE)
            .clamp(0, 50);
        let parallelism = get("PREDICT_PARALLELISM")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PARALLELISM)
            .clamp(1, 16);

        Self {
            ai_enabled,
            provider,
            temperature,
            max_tokens,
            sum_tolerance,
            parallelism,
        }
    }

    pub fn uses_provider(&self) -> bool {
        self.ai_enabled && self.provider.is_some()
    }
}

fn parse_bool(raw: &str) -> bool {
    let t = raw.trim().to_ascii_lowercase();
    !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
}
