//! Alert prioritization and fatigue reduction
//!
//! Dynamically prioritizes clinical alerts so that critical findings are
//! never missed while repetitive low-value alerts are suppressed. The
//! engine tracks a bounded alert history, demotes priorities when the
//! alert volume indicates clinician fatigue, and accepts usefulness
//! feedback that dampens future similar alerts.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::{RiskAssessment, RiskLevel};
use crate::config::AlertPriorityConfig;
use crate::errors::{CdssError, CdssResult};

/// Alert priority, ordered `Low < Medium < High < Critical`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    /// For documentation only
    Low,
    /// Review when able
    Medium,
    /// Review within 30 minutes
    High,
    /// Immediate action required
    Critical,
}

impl AlertPriority {
    fn step_down(self) -> Self {
        match self {
            AlertPriority::Critical => AlertPriority::High,
            AlertPriority::High => AlertPriority::Medium,
            AlertPriority::Medium | AlertPriority::Low => AlertPriority::Low,
        }
    }
}

/// Where an alert originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Ml,
    Rules,
    Hybrid,
}

/// Clinician feedback on a surfaced alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFeedback {
    Useful,
    NotUseful,
}

/// Situational context used when adjusting priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContext {
    /// Intensive-care setting; alerts are promoted to at least High
    pub intensive_care: bool,
    pub night_shift: bool,
}

/// Request to raise a new alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub message: String,
    pub recommendations: Vec<String>,
    pub patient_id: Option<String>,
    pub source: AlertSource,
}

impl AlertRequest {
    /// Build a request from a classifier assessment that surfaced an alert.
    /// Returns `None` when the assessment was gated off.
    pub fn from_assessment(assessment: &RiskAssessment) -> Option<Self> {
        if !assessment.alert_triggered {
            return None;
        }
        Some(Self {
            risk_level: assessment.level,
            risk_score: assessment.probability,
            message: assessment.message.clone().unwrap_or_default(),
            recommendations: assessment.recommendations.clone(),
            patient_id: None,
            source: AlertSource::Ml,
        })
    }

    #[must_use]
    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: AlertSource) -> Self {
        self.source = source;
        self
    }
}

/// A prioritized clinical alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub patient_id: Option<String>,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub priority: AlertPriority,
    pub message: String,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub source: AlertSource,
    pub adjustment_reason: String,
    pub suppressed: bool,
    pub suppression_reason: Option<String>,
    pub acknowledged: bool,
    pub feedback: Option<AlertFeedback>,
}

/// Clinician fatigue level inferred from alert volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    Normal,
    Elevated,
    High,
}

/// Rolling alert-fatigue statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatigueMetrics {
    pub total_alerts: usize,
    pub alerts_last_hour: usize,
    pub suppressed_count: usize,
    pub acknowledged_count: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub fatigue_level: FatigueLevel,
    pub recommendation: String,
}

/// Suppression effectiveness statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionStats {
    pub total_alerts: usize,
    pub suppressed_alerts: usize,
    pub suppression_rate: f64,
    pub effective_alerts: usize,
}

type SuppressionKey = (String, RiskLevel);

/// Engine for prioritizing, suppressing, and tracking clinical alerts
#[derive(Debug)]
pub struct AlertEngine {
    config: AlertPriorityConfig,
    history: VecDeque<Alert>,
    last_seen: HashMap<SuppressionKey, DateTime<Utc>>,
    consecutive: HashMap<SuppressionKey, u32>,
}

impl AlertEngine {
    pub fn new(config: AlertPriorityConfig) -> CdssResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            history: VecDeque::new(),
            last_seen: HashMap::new(),
            consecutive: HashMap::new(),
        })
    }

    /// Raise an alert using the current wall clock
    pub fn raise(&mut self, request: AlertRequest, context: &AlertContext) -> CdssResult<Alert> {
        self.raise_at(request, context, Utc::now())
    }

    /// Raise an alert at an explicit instant. Suppressed alerts are still
    /// recorded in history, flagged with the suppression reason.
    pub fn raise_at(
        &mut self,
        request: AlertRequest,
        context: &AlertContext,
        now: DateTime<Utc>,
    ) -> CdssResult<Alert> {
        if !request.risk_score.is_finite() || !(0.0..=1.0).contains(&request.risk_score) {
            return Err(CdssError::invalid_input(format!(
                "risk score {} is not a probability in [0, 1]",
                request.risk_score
            )));
        }

        let key = suppression_key(&request);
        let base = base_priority(request.risk_level, request.risk_score);
        let (priority, adjustment_reason) = self.adjust_priority(base, &key, context, now);
        let suppression_reason = self.suppression_reason(priority, &key, now);

        let alert = Alert {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            risk_level: request.risk_level,
            risk_score: request.risk_score,
            priority,
            message: request.message,
            recommendations: request.recommendations,
            timestamp: now,
            source: request.source,
            adjustment_reason,
            suppressed: suppression_reason.is_some(),
            suppression_reason,
            acknowledged: false,
            feedback: None,
        };

        if alert.suppressed {
            debug!(
                alert = %alert.id,
                reason = alert.suppression_reason.as_deref().unwrap_or(""),
                "alert suppressed"
            );
        } else {
            info!(alert = %alert.id, priority = ?alert.priority, "alert raised");
        }

        self.record(alert.clone(), key, now);
        Ok(alert)
    }

    fn adjust_priority(
        &self,
        base: AlertPriority,
        key: &SuppressionKey,
        context: &AlertContext,
        now: DateTime<Utc>,
    ) -> (AlertPriority, String) {
        let mut adjusted = base;
        let mut reason = "Base priority".to_string();

        let metrics = self.fatigue_metrics_at(now);
        if metrics.fatigue_level == FatigueLevel::High && base <= AlertPriority::Medium {
            adjusted = AlertPriority::Low;
            reason = "Priority reduced due to high alert fatigue".to_string();
        }

        let consecutive = self.consecutive.get(key).copied().unwrap_or(0);
        if consecutive >= self.config.consecutive_threshold
            && adjusted != AlertPriority::Critical
            && adjusted > AlertPriority::Low
        {
            adjusted = adjusted.step_down();
            reason = format!("Priority reduced after {consecutive} similar alerts");
        }

        if context.intensive_care && adjusted < AlertPriority::High {
            adjusted = AlertPriority::High;
            reason = "Priority elevated for intensive care context".to_string();
        } else if context.night_shift && adjusted == AlertPriority::Low {
            reason = "Low priority during night shift".to_string();
        }

        (adjusted, reason)
    }

    fn suppression_reason(
        &self,
        priority: AlertPriority,
        key: &SuppressionKey,
        now: DateTime<Utc>,
    ) -> Option<String> {
        // Critical alerts are never suppressed
        if priority == AlertPriority::Critical {
            return None;
        }

        let interval = Duration::minutes(self.config.suppression_interval_minutes);
        if let Some(last) = self.last_seen.get(key) {
            if now - *last < interval {
                return Some(format!(
                    "Similar alert within {} minutes",
                    self.config.suppression_interval_minutes
                ));
            }
        }

        if priority == AlertPriority::Low {
            let recent_low = self
                .history
                .iter()
                .filter(|a| a.priority == AlertPriority::Low && now - a.timestamp < Duration::hours(1))
                .count();
            if recent_low >= self.config.max_low_alerts_per_hour {
                return Some(format!(
                    "Exceeded {} low-priority alerts per hour",
                    self.config.max_low_alerts_per_hour
                ));
            }
        }

        None
    }

    fn record(&mut self, alert: Alert, key: SuppressionKey, now: DateTime<Utc>) {
        self.history.push_back(alert);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
        self.last_seen.insert(key.clone(), now);
        *self.consecutive.entry(key).or_insert(0) += 1;
    }

    /// Mark an alert acknowledged by the clinician
    pub fn acknowledge(&mut self, id: Uuid) -> CdssResult<()> {
        let alert = self
            .history
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(CdssError::AlertNotFound { id: id.to_string() })?;
        alert.acknowledged = true;
        Ok(())
    }

    /// Record clinician feedback. Alerts marked not useful add a penalty to
    /// the consecutive count so similar future alerts are demoted sooner.
    pub fn record_feedback(&mut self, id: Uuid, useful: bool) -> CdssResult<()> {
        let alert = self
            .history
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(CdssError::AlertNotFound { id: id.to_string() })?;
        alert.feedback = Some(if useful {
            AlertFeedback::Useful
        } else {
            AlertFeedback::NotUseful
        });
        if !useful {
            let key = (
                alert.patient_id.clone().unwrap_or_else(|| "unknown".to_string()),
                alert.risk_level,
            );
            *self.consecutive.entry(key).or_insert(0) += 2;
        }
        Ok(())
    }

    pub fn fatigue_metrics(&self) -> FatigueMetrics {
        self.fatigue_metrics_at(Utc::now())
    }

    /// Fatigue statistics over the hour preceding `now`
    pub fn fatigue_metrics_at(&self, now: DateTime<Utc>) -> FatigueMetrics {
        let recent: Vec<&Alert> = self
            .history
            .iter()
            .filter(|a| now - a.timestamp < Duration::hours(1))
            .collect();

        let count_priority = |p: AlertPriority| recent.iter().filter(|a| a.priority == p).count();
        let alerts_last_hour = recent.len();
        let threshold = self.config.fatigue_threshold_per_hour;
        let elevated_at = (threshold as f64 * 0.7).ceil() as usize;

        let (fatigue_level, recommendation) = if alerts_last_hour >= threshold {
            (
                FatigueLevel::High,
                "Consider reviewing alert thresholds or rotating coverage".to_string(),
            )
        } else if alerts_last_hour >= elevated_at {
            (
                FatigueLevel::Elevated,
                "Alert volume approaching fatigue threshold".to_string(),
            )
        } else {
            (FatigueLevel::Normal, "Alert volume is manageable".to_string())
        };

        FatigueMetrics {
            total_alerts: self.history.len(),
            alerts_last_hour,
            suppressed_count: self.history.iter().filter(|a| a.suppressed).count(),
            acknowledged_count: self.history.iter().filter(|a| a.acknowledged).count(),
            critical_count: count_priority(AlertPriority::Critical),
            high_count: count_priority(AlertPriority::High),
            medium_count: count_priority(AlertPriority::Medium),
            low_count: count_priority(AlertPriority::Low),
            fatigue_level,
            recommendation,
        }
    }

    pub fn suppression_stats(&self) -> SuppressionStats {
        let total = self.history.len();
        let suppressed = self.history.iter().filter(|a| a.suppressed).count();
        SuppressionStats {
            total_alerts: total,
            suppressed_alerts: suppressed,
            suppression_rate: if total == 0 {
                0.0
            } else {
                suppressed as f64 / total as f64
            },
            effective_alerts: total - suppressed,
        }
    }

    /// Alerts to display, highest priority first, newest first within a
    /// priority
    pub fn active_alerts(&self, include_suppressed: bool) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = self
            .history
            .iter()
            .filter(|a| include_suppressed || !a.suppressed)
            .collect();
        alerts.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        alerts
    }

    /// Drop alerts and suppression bookkeeping older than `max_age`
    pub fn prune_older_than(&mut self, max_age: Duration, now: DateTime<Utc>) {
        let cutoff = now - max_age;
        self.history.retain(|a| a.timestamp > cutoff);
        self.last_seen.retain(|_, seen| *seen > cutoff);
    }
}

fn suppression_key(request: &AlertRequest) -> SuppressionKey {
    (
        request
            .patient_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        request.risk_level,
    )
}

/// Base priority from risk level and score, before contextual adjustment
fn base_priority(level: RiskLevel, score: f64) -> AlertPriority {
    match level {
        RiskLevel::High if score >= 0.85 => AlertPriority::Critical,
        RiskLevel::High => AlertPriority::High,
        RiskLevel::Medium if score >= 0.55 => AlertPriority::High,
        RiskLevel::Medium => AlertPriority::Medium,
        RiskLevel::Low => AlertPriority::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    fn engine() -> AlertEngine {
        AlertEngine::new(AlertPriorityConfig::default()).unwrap()
    }

    fn request(level: RiskLevel, score: f64, patient: &str) -> AlertRequest {
        AlertRequest {
            risk_level: level,
            risk_score: score,
            message: "test alert".to_string(),
            recommendations: vec![],
            patient_id: Some(patient.to_string()),
            source: AlertSource::Ml,
        }
    }

    #[test]
    fn base_priorities_follow_level_and_score() {
        assert_eq!(base_priority(RiskLevel::High, 0.9), AlertPriority::Critical);
        assert_eq!(base_priority(RiskLevel::High, 0.7), AlertPriority::High);
        assert_eq!(base_priority(RiskLevel::Medium, 0.58), AlertPriority::High);
        assert_eq!(base_priority(RiskLevel::Medium, 0.4), AlertPriority::Medium);
        assert_eq!(base_priority(RiskLevel::Low, 0.1), AlertPriority::Low);
    }

    #[test]
    fn repeat_alert_within_interval_is_suppressed() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        let first = engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P001"), &ctx, t0())
            .unwrap();
        assert!(!first.suppressed);

        let second = engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P001"),
                &ctx,
                t0() + Duration::minutes(5),
            )
            .unwrap();
        assert!(second.suppressed);
        assert!(second.suppression_reason.as_deref().unwrap().contains("15 minutes"));
    }

    #[test]
    fn repeat_alert_after_interval_is_not_suppressed() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P001"), &ctx, t0())
            .unwrap();
        let later = engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P001"),
                &ctx,
                t0() + Duration::minutes(20),
            )
            .unwrap();
        assert!(!later.suppressed);
    }

    #[test]
    fn critical_alerts_are_never_suppressed() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        for minute in 0..4 {
            let alert = engine
                .raise_at(
                    request(RiskLevel::High, 0.95, "P001"),
                    &ctx,
                    t0() + Duration::minutes(minute),
                )
                .unwrap();
            assert_eq!(alert.priority, AlertPriority::Critical);
            assert!(!alert.suppressed, "critical alert suppressed at minute {minute}");
        }
    }

    #[test]
    fn low_priority_alerts_are_rate_limited() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        // distinct patients so the per-patient interval does not kick in
        for i in 0..5 {
            let alert = engine
                .raise_at(
                    request(RiskLevel::Low, 0.1, &format!("P{i:03}")),
                    &ctx,
                    t0() + Duration::minutes(i),
                )
                .unwrap();
            assert!(!alert.suppressed);
        }
        let sixth = engine
            .raise_at(
                request(RiskLevel::Low, 0.1, "P900"),
                &ctx,
                t0() + Duration::minutes(6),
            )
            .unwrap();
        assert!(sixth.suppressed);
        assert!(sixth
            .suppression_reason
            .as_deref()
            .unwrap()
            .contains("low-priority"));
    }

    #[test]
    fn consecutive_similar_alerts_are_demoted() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        for i in 0..3 {
            engine
                .raise_at(
                    request(RiskLevel::Medium, 0.4, "P001"),
                    &ctx,
                    t0() + Duration::minutes(i * 20),
                )
                .unwrap();
        }
        let fourth = engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P001"),
                &ctx,
                t0() + Duration::minutes(60),
            )
            .unwrap();
        assert_eq!(fourth.priority, AlertPriority::Low);
        assert!(fourth.adjustment_reason.contains("similar alerts"));
    }

    #[test]
    fn intensive_care_context_promotes_priority() {
        let mut engine = engine();
        let ctx = AlertContext { intensive_care: true, night_shift: false };
        let alert = engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P001"), &ctx, t0())
            .unwrap();
        assert_eq!(alert.priority, AlertPriority::High);
        assert!(alert.adjustment_reason.contains("intensive care"));
    }

    #[test]
    fn night_shift_is_noted_on_low_priority_alerts() {
        let mut engine = engine();
        let ctx = AlertContext { intensive_care: false, night_shift: true };
        let low = engine
            .raise_at(request(RiskLevel::Low, 0.1, "P001"), &ctx, t0())
            .unwrap();
        assert_eq!(low.priority, AlertPriority::Low);
        assert!(low.adjustment_reason.contains("night shift"));

        // higher priorities keep their base reason
        let medium = engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P002"), &ctx, t0())
            .unwrap();
        assert_eq!(medium.priority, AlertPriority::Medium);
        assert_eq!(medium.adjustment_reason, "Base priority");
    }

    #[test]
    fn high_fatigue_demotes_new_medium_alerts() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        for i in 0..20 {
            engine
                .raise_at(
                    request(RiskLevel::Medium, 0.58, &format!("P{i:03}")),
                    &ctx,
                    t0() + Duration::minutes(i),
                )
                .unwrap();
        }
        let metrics = engine.fatigue_metrics_at(t0() + Duration::minutes(21));
        assert_eq!(metrics.fatigue_level, FatigueLevel::High);

        let alert = engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P999"),
                &ctx,
                t0() + Duration::minutes(22),
            )
            .unwrap();
        assert_eq!(alert.priority, AlertPriority::Low);
        assert!(alert.adjustment_reason.contains("fatigue"));
    }

    #[test]
    fn fatigue_metrics_count_by_priority() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        engine
            .raise_at(request(RiskLevel::High, 0.9, "P001"), &ctx, t0())
            .unwrap();
        engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P002"), &ctx, t0())
            .unwrap();
        engine
            .raise_at(request(RiskLevel::Low, 0.1, "P003"), &ctx, t0())
            .unwrap();

        let metrics = engine.fatigue_metrics_at(t0() + Duration::minutes(5));
        assert_eq!(metrics.total_alerts, 3);
        assert_eq!(metrics.alerts_last_hour, 3);
        assert_eq!(metrics.critical_count, 1);
        assert_eq!(metrics.medium_count, 1);
        assert_eq!(metrics.low_count, 1);
        assert_eq!(metrics.fatigue_level, FatigueLevel::Normal);
    }

    #[test]
    fn acknowledge_marks_alert() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        let alert = engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P001"), &ctx, t0())
            .unwrap();
        engine.acknowledge(alert.id).unwrap();
        let metrics = engine.fatigue_metrics_at(t0());
        assert_eq!(metrics.acknowledged_count, 1);
    }

    #[test]
    fn unknown_alert_id_is_an_error() {
        let mut engine = engine();
        let err = engine.acknowledge(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CdssError::AlertNotFound { .. }));
    }

    #[test]
    fn not_useful_feedback_accelerates_demotion() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        let alert = engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P001"), &ctx, t0())
            .unwrap();
        engine.record_feedback(alert.id, false).unwrap();

        // consecutive is now 1 (raise) + 2 (penalty) = 3, at the threshold
        let next = engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P001"),
                &ctx,
                t0() + Duration::minutes(20),
            )
            .unwrap();
        assert_eq!(next.priority, AlertPriority::Low);
    }

    #[test]
    fn active_alerts_sort_by_priority_then_recency() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        engine
            .raise_at(request(RiskLevel::Low, 0.1, "P001"), &ctx, t0())
            .unwrap();
        engine
            .raise_at(
                request(RiskLevel::High, 0.95, "P002"),
                &ctx,
                t0() + Duration::minutes(1),
            )
            .unwrap();
        engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P003"),
                &ctx,
                t0() + Duration::minutes(2),
            )
            .unwrap();

        let active = engine.active_alerts(false);
        assert_eq!(active.len(), 3);
        assert_eq!(active[0].priority, AlertPriority::Critical);
        assert_eq!(active[1].priority, AlertPriority::Medium);
        assert_eq!(active[2].priority, AlertPriority::Low);
    }

    #[test]
    fn history_is_bounded() {
        let config = AlertPriorityConfig {
            history_size: 10,
            max_low_alerts_per_hour: 1000,
            ..Default::default()
        };
        let mut engine = AlertEngine::new(config).unwrap();
        let ctx = AlertContext::default();
        for i in 0..25 {
            engine
                .raise_at(
                    request(RiskLevel::Low, 0.1, &format!("P{i:03}")),
                    &ctx,
                    t0() + Duration::minutes(i),
                )
                .unwrap();
        }
        assert_eq!(engine.suppression_stats().total_alerts, 10);
    }

    #[test]
    fn pruning_clears_old_alerts() {
        let mut engine = engine();
        let ctx = AlertContext::default();
        engine
            .raise_at(request(RiskLevel::Medium, 0.4, "P001"), &ctx, t0())
            .unwrap();
        engine.prune_older_than(Duration::hours(24), t0() + Duration::hours(25));
        assert_eq!(engine.suppression_stats().total_alerts, 0);

        // suppression bookkeeping is cleared too
        let again = engine
            .raise_at(
                request(RiskLevel::Medium, 0.4, "P001"),
                &ctx,
                t0() + Duration::hours(25),
            )
            .unwrap();
        assert!(!again.suppressed);
    }

    #[test]
    fn invalid_risk_score_is_rejected() {
        let mut engine = engine();
        let mut bad = request(RiskLevel::Medium, 1.5, "P001");
        let err = engine
            .raise_at(bad.clone(), &AlertContext::default(), t0())
            .unwrap_err();
        assert!(matches!(err, CdssError::InvalidInput { .. }));
        bad.risk_score = f64::NAN;
        assert!(engine.raise_at(bad, &AlertContext::default(), t0()).is_err());
    }
}
