use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Budgets after which a session gives up on its own
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    pub max_turns: u32,
    #[serde(rename = "max_duration_secs", deserialize_with = "seconds")]
    pub max_duration: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_turns: 1000,
            max_duration: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Upper bound on decisions running at once
    pub max_workers: usize,
    /// Concurrent sessions allowed against one counterparty
    pub battles_per_counterparty: usize,
    /// Budget for one decision once it holds a worker. Waiting on the
    /// battle stream is bounded by `limits` instead.
    #[serde(rename = "decision_timeout_secs", deserialize_with = "seconds")]
    pub decision_timeout: Duration,
    pub limits: SessionLimits,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            battles_per_counterparty: 4,
            decision_timeout: Duration::from_secs(30),
            limits: SessionLimits::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Load from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
