//! Engine configuration
//!
//! Every engine takes its configuration explicitly at construction time;
//! there is no ambient or global configuration state. Defaults mirror the
//! deployed clinical profile and pass `validate()` as-is.

use serde::{Deserialize, Serialize};

use crate::classifier::RiskLevel;
use crate::errors::{CdssError, CdssResult};

/// Probability thresholds splitting the [0, 1] risk scale into bands.
///
/// `p < low_max` is low, `low_max <= p <= high_min` is medium, and
/// `p > high_min` is high. Both boundary values fall into the medium band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low_max: f64,
    pub high_min: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max: 0.30,
            high_min: 0.60,
        }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> CdssResult<()> {
        if !self.low_max.is_finite() || !self.high_min.is_finite() {
            return Err(CdssError::configuration("risk thresholds must be finite"));
        }
        if self.low_max < 0.0 || self.high_min > 1.0 {
            return Err(CdssError::configuration(
                "risk thresholds must lie within [0, 1]",
            ));
        }
        if self.low_max >= self.high_min {
            return Err(CdssError::configuration(format!(
                "low_max ({}) must be strictly below high_min ({})",
                self.low_max, self.high_min
            )));
        }
        Ok(())
    }

    /// Map an in-range score to its risk band.
    ///
    /// Callers are responsible for input validation; this mapping is shared
    /// by the classifier and the multi-risk engine so boundary handling is
    /// identical everywhere.
    pub fn level_for(&self, score: f64) -> RiskLevel {
        debug_assert!(score.is_finite() && (0.0..=1.0).contains(&score));
        if score < self.low_max {
            RiskLevel::Low
        } else if score <= self.high_min {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Which risk levels surface an alert.
///
/// Low-risk alerts are off by default to reduce alert fatigue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertGateConfig {
    pub show_low_risk: bool,
    pub show_medium_risk: bool,
    pub show_high_risk: bool,
}

impl Default for AlertGateConfig {
    fn default() -> Self {
        Self {
            show_low_risk: false,
            show_medium_risk: true,
            show_high_risk: true,
        }
    }
}

impl AlertGateConfig {
    pub fn should_alert(&self, level: RiskLevel) -> bool {
        match level {
            RiskLevel::Low => self.show_low_risk,
            RiskLevel::Medium => self.show_medium_risk,
            RiskLevel::High => self.show_high_risk,
        }
    }
}

/// Alert prioritization and suppression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPriorityConfig {
    /// Minimum gap between repeated alerts for the same patient and level
    pub suppression_interval_minutes: i64,
    /// At most this many low-priority alerts per rolling hour
    pub max_low_alerts_per_hour: usize,
    /// Consecutive similar alerts before priority is stepped down
    pub consecutive_threshold: u32,
    /// Bounded alert history size
    pub history_size: usize,
    /// Alerts per hour at which clinician fatigue is considered high
    pub fatigue_threshold_per_hour: usize,
}

impl Default for AlertPriorityConfig {
    fn default() -> Self {
        Self {
            suppression_interval_minutes: 15,
            max_low_alerts_per_hour: 5,
            consecutive_threshold: 3,
            history_size: 100,
            fatigue_threshold_per_hour: 20,
        }
    }
}

impl AlertPriorityConfig {
    pub fn validate(&self) -> CdssResult<()> {
        if self.history_size == 0 {
            return Err(CdssError::configuration("alert history size must be non-zero"));
        }
        if self.suppression_interval_minutes < 0 {
            return Err(CdssError::configuration(
                "suppression interval must not be negative",
            ));
        }
        Ok(())
    }
}

/// How ML predictions and rule findings are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMethod {
    /// Take the more pessimistic of the two assessments
    #[default]
    Conservative,
    /// Trust the model unless a critical violation is present
    Liberal,
    /// Rules are advisory only
    MlPriority,
}

/// Per-category toggles for the rules engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCategories {
    pub drug_interactions: bool,
    pub vital_sign_alerts: bool,
    pub age_safety: bool,
    pub contraindications: bool,
    pub allergy_checks: bool,
}

impl Default for RuleCategories {
    fn default() -> Self {
        Self {
            drug_interactions: true,
            vital_sign_alerts: true,
            age_safety: true,
            contraindications: true,
            allergy_checks: true,
        }
    }
}

/// Rules engine and hybrid decision settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesEngineConfig {
    pub combine_method: CombineMethod,
    pub categories: RuleCategories,
}

/// Aggregation strategy for the multi-risk engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    WeightedAverage,
    #[default]
    WeightedMax,
    Highest,
}

/// Per-risk-type settings for the multi-risk engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTypeConfig {
    pub enabled: bool,
    pub weight: f64,
}

/// Multi-risk engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRiskConfig {
    pub medication_error: RiskTypeConfig,
    pub disease_progression: RiskTypeConfig,
    pub adverse_event: RiskTypeConfig,
    pub hospital_readmission: RiskTypeConfig,
    pub aggregation: AggregationMethod,
}

impl Default for MultiRiskConfig {
    fn default() -> Self {
        Self {
            medication_error: RiskTypeConfig { enabled: true, weight: 0.30 },
            disease_progression: RiskTypeConfig { enabled: true, weight: 0.25 },
            adverse_event: RiskTypeConfig { enabled: true, weight: 0.25 },
            hospital_readmission: RiskTypeConfig { enabled: true, weight: 0.20 },
            aggregation: AggregationMethod::WeightedMax,
        }
    }
}

impl MultiRiskConfig {
    pub fn validate(&self) -> CdssResult<()> {
        for (name, cfg) in [
            ("medication_error", &self.medication_error),
            ("disease_progression", &self.disease_progression),
            ("adverse_event", &self.adverse_event),
            ("hospital_readmission", &self.hospital_readmission),
        ] {
            if !cfg.weight.is_finite() || cfg.weight < 0.0 {
                return Err(CdssError::configuration(format!(
                    "weight for {name} must be a non-negative finite number"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level configuration for the whole engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdssConfig {
    #[serde(default)]
    pub thresholds: RiskThresholds,
    #[serde(default)]
    pub alert_gate: AlertGateConfig,
    #[serde(default)]
    pub alert_priority: AlertPriorityConfig,
    #[serde(default)]
    pub rules: RulesEngineConfig,
    #[serde(default)]
    pub multi_risk: MultiRiskConfig,
}

impl CdssConfig {
    pub fn validate(&self) -> CdssResult<()> {
        self.thresholds.validate()?;
        self.alert_priority.validate()?;
        self.multi_risk.validate()?;
        Ok(())
    }
}
