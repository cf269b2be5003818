//! Alert manager for throttling and dispatching alerts.
//!
//! This module provides the [`AlertManager`], the entry point of the
//! alerting system. It holds the rule and channel registries, decides
//! whether a triggered rule may fire (cooldown, hourly rate limit), renders
//! the message and fans the alert out to the rule's channels concurrently.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use selam_metrics::MetricsStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::channels::{build_channels, AlertChannel};
use crate::config::{AlertSettings, AlertsConfig};
use crate::template;
use crate::types::{Alert, AlertContext, AlertRule};

/// Width of the rolling window used by the rate limit and recent counts.
pub const RATE_LIMIT_WINDOW: TimeDelta = TimeDelta::hours(1);

/// Snapshot returned by [`AlertManager::get_alert_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    /// Registered rules.
    pub total_rules: usize,
    /// Registered channels.
    pub total_channels: usize,
    /// Successful firings per rule since startup.
    pub alert_counts: BTreeMap<String, u64>,
    /// Successful alerts within the last hour.
    pub recent_alerts: usize,
}

/// The alert manager owns rules, channels and firing history.
///
/// Cloning is cheap and every clone shares state, so one manager can be
/// built at startup and handed to every component that raises alerts.
#[derive(Debug)]
pub struct AlertManager {
    /// Throttling and history limits.
    settings: AlertSettings,
    /// Registered rules by name.
    rules: Arc<RwLock<HashMap<String, AlertRule>>>,
    /// Registered channels by name.
    channels: Arc<RwLock<HashMap<String, Arc<dyn AlertChannel>>>>,
    /// Last successful firing per rule.
    last_fired: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    /// Successfully dispatched alerts, oldest first.
    history: Arc<RwLock<VecDeque<Alert>>>,
    /// Firing times within the rate limit window, independent of `history`.
    fired_at: Arc<RwLock<VecDeque<DateTime<Utc>>>>,
    /// Successful firings per rule.
    fired_counts: Arc<RwLock<HashMap<String, u64>>>,
    /// Serializes cooldown check and update per rule.
    rule_locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AlertManager {
    /// Creates a new alert manager with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(AlertSettings::default())
    }

    /// Creates a new alert manager with custom settings.
    #[must_use]
    pub fn with_settings(settings: AlertSettings) -> Self {
        Self {
            settings,
            rules: Arc::new(RwLock::new(HashMap::new())),
            channels: Arc::new(RwLock::new(HashMap::new())),
            last_fired: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(VecDeque::new())),
            fired_at: Arc::new(RwLock::new(VecDeque::new())),
            fired_counts: Arc::new(RwLock::new(HashMap::new())),
            rule_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Builds a manager with the channels and rules described by `config`.
    ///
    /// Misconfigured channels and rules are skipped with a warning.
    #[must_use]
    pub fn from_config(config: &AlertsConfig) -> Self {
        let manager = Self::with_settings(config.settings.clone());
        if !config.enabled {
            info!("alerting disabled, no rules or channels registered");
            return manager;
        }

        for (name, channel) in build_channels(&config.channels) {
            manager.add_channel(name, channel);
        }

        for (name, rule_config) in &config.rules {
            match rule_config.to_rule(name) {
                Ok(rule) => manager.add_rule(rule),
                Err(e) => warn!(rule = %name, error = %e, "skipping invalid alert rule"),
            }
        }

        manager
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    // ============ Rule Management ============

    /// Registers `rule`, replacing any rule with the same name.
    ///
    /// Templates with invalid syntax are accepted but logged, since the
    /// message is degraded rather than dropped at trigger time.
    pub fn add_rule(&self, rule: AlertRule) {
        if let Err(e) = template::validate(&rule.message_template) {
            warn!(rule = %rule.name, error = %e, "alert rule has a malformed message template");
        }

        let unknown: Vec<&str> = {
            let channels = self.channels.read();
            rule.channels
                .iter()
                .map(String::as_str)
                .filter(|name| !channels.contains_key(*name))
                .collect()
        };
        if !unknown.is_empty() {
            debug!(rule = %rule.name, channels = ?unknown, "rule routes to channels not yet registered");
        }

        info!(rule = %rule.name, severity = %rule.severity, "added alert rule");
        self.rules.write().insert(rule.name.clone(), rule);
    }

    /// Removes a rule. Returns `true` if it existed.
    pub fn remove_rule(&self, name: &str) -> bool {
        let removed = self.rules.write().remove(name).is_some();
        if removed {
            info!(rule = %name, "removed alert rule");
        }
        removed
    }

    /// Gets a rule by name.
    #[must_use]
    pub fn get_rule(&self, name: &str) -> Option<AlertRule> {
        self.rules.read().get(name).cloned()
    }

    /// Lists all rules, sorted by name.
    #[must_use]
    pub fn list_rules(&self) -> Vec<AlertRule> {
        let mut rules: Vec<AlertRule> = self.rules.read().values().cloned().collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    // ============ Channel Management ============

    /// Registers `channel` under `name`, replacing any channel with that name.
    pub fn add_channel(&self, name: impl Into<String>, channel: Arc<dyn AlertChannel>) {
        let name = name.into();
        info!(channel = %name, kind = %channel.name(), "added alert channel");
        self.channels.write().insert(name, channel);
    }

    /// Names of the registered channels, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    // ============ Triggering ============

    /// Fires the named rule with `context`. See [`trigger_at`](Self::trigger_at).
    pub async fn trigger(&self, rule_name: &str, context: AlertContext) -> bool {
        self.trigger_at(rule_name, context, Utc::now()).await
    }

    /// Fires the named rule as of `now`.
    ///
    /// Returns `true` if at least one channel accepted the alert. Unknown
    /// rules, an active cooldown, an exhausted hourly budget and delivery
    /// failure on every channel all return `false`; only a successful
    /// dispatch updates the cooldown, history and per-rule count.
    pub async fn trigger_at(&self, rule_name: &str, context: AlertContext, now: DateTime<Utc>) -> bool {
        let Some(rule) = self.get_rule(rule_name) else {
            warn!(rule = %rule_name, "unknown alert rule");
            return false;
        };

        // Concurrent triggers of the same rule must not both pass the cooldown.
        let rule_lock = self.rule_lock(rule_name);
        let _serialized = rule_lock.lock().await;

        if let Some(last) = self.last_fired.read().get(rule_name) {
            if now.signed_duration_since(*last) < rule.cooldown() {
                debug!(rule = %rule_name, "alert in cooldown period");
                return false;
            }
        }

        if self.settings.rate_limit_enabled {
            let recent = self.recent_count(now);
            if recent >= self.settings.max_alerts_per_hour {
                warn!(
                    rule = %rule_name,
                    recent,
                    limit = self.settings.max_alerts_per_hour,
                    "alert rate limit exceeded"
                );
                return false;
            }
        }

        let alert = Alert {
            message: template::render_lossy(&rule.message_template, &context, rule_name),
            rule_name: rule.name.clone(),
            severity: rule.severity,
            timestamp: now,
            context,
            channels: rule.channels.clone(),
            correlation_id: selam_context::get(),
        };

        let (success, alert) = self.dispatch(alert).await;
        if success {
            self.record(alert, now);
            info!(rule = %rule_name, severity = %rule.severity, "alert triggered");
        } else {
            warn!(rule = %rule_name, "alert was not delivered to any channel");
        }
        success
    }

    /// Fires the rule when `metric` in `store` exceeds the rule's threshold.
    ///
    /// The observed value is the mean over the rule's `window_minutes` when
    /// set, otherwise the most recent point. Returns `false` when the rule
    /// has no threshold, the metric has no data, the value is not above the
    /// threshold, or the trigger itself returns `false`.
    pub async fn evaluate_threshold(&self, rule_name: &str, store: &MetricsStore, metric: &str) -> bool {
        let Some(rule) = self.get_rule(rule_name) else {
            warn!(rule = %rule_name, "unknown alert rule");
            return false;
        };
        let Some(threshold) = rule.threshold else {
            debug!(rule = %rule_name, "rule has no threshold");
            return false;
        };

        let value = match rule.window_minutes {
            Some(window) => store
                .get_metric_summary(metric, Some(window))
                .map(|summary| summary.mean),
            None => store.get_latest(metric),
        };
        let Some(value) = value else {
            debug!(rule = %rule_name, metric = %metric, "no data for threshold evaluation");
            return false;
        };

        if value <= threshold {
            return false;
        }

        let mut context = AlertContext::new();
        context.insert("metric".to_string(), Value::from(metric));
        context.insert("value".to_string(), Value::from(value));
        context.insert("threshold".to_string(), Value::from(threshold));
        self.trigger(rule_name, context).await
    }

    fn rule_lock(&self, rule_name: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.rule_locks.read().get(rule_name) {
            return Arc::clone(lock);
        }
        Arc::clone(
            self.rule_locks
                .write()
                .entry(rule_name.to_string())
                .or_default(),
        )
    }

    /// Sends `alert` to each of its channels concurrently and waits for all.
    async fn dispatch(&self, alert: Alert) -> (bool, Alert) {
        let targets: Vec<(String, Arc<dyn AlertChannel>)> = {
            let channels = self.channels.read();
            alert
                .channels
                .iter()
                .filter_map(|name| match channels.get(name) {
                    None => {
                        warn!(rule = %alert.rule_name, channel = %name, "alert channel not registered");
                        None
                    }
                    Some(channel) if !channel.is_enabled() => {
                        debug!(rule = %alert.rule_name, channel = %name, "alert channel disabled");
                        None
                    }
                    Some(channel) => Some((name.clone(), Arc::clone(channel))),
                })
                .collect()
        };

        if targets.is_empty() {
            return (false, alert);
        }

        let alert = Arc::new(alert);
        let deliveries = targets.into_iter().map(|(name, channel)| {
            let alert = Arc::clone(&alert);
            let task = tokio::spawn(async move { channel.deliver(&alert).await });
            async move {
                match task.await {
                    Ok(delivered) => delivered,
                    Err(e) => {
                        error!(channel = %name, error = %e, "alert channel task failed");
                        false
                    }
                }
            }
        });

        let success = join_all(deliveries).await.into_iter().any(|delivered| delivered);
        (success, Arc::unwrap_or_clone(alert))
    }

    fn record(&self, alert: Alert, now: DateTime<Utc>) {
        let rule_name = alert.rule_name.clone();
        self.last_fired.write().insert(rule_name.clone(), now);
        *self.fired_counts.write().entry(rule_name).or_insert(0) += 1;

        let cutoff = now - RATE_LIMIT_WINDOW;
        {
            let mut fired_at = self.fired_at.write();
            fired_at.push_back(now);
            while fired_at.front().is_some_and(|t| *t < cutoff) {
                fired_at.pop_front();
            }
        }

        let mut history = self.history.write();
        history.push_back(alert);
        history.retain(|a| a.timestamp >= cutoff);
        while history.len() > self.settings.max_history {
            history.pop_front();
        }
    }

    fn recent_count(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - RATE_LIMIT_WINDOW;
        self.fired_at.read().iter().filter(|t| **t >= cutoff).count()
    }

    // ============ Inspection ============

    /// Counts of rules, channels, per-rule firings and last-hour alerts.
    #[must_use]
    pub fn get_alert_stats(&self) -> AlertStats {
        AlertStats {
            total_rules: self.rule_count(),
            total_channels: self.channel_count(),
            alert_counts: self
                .fired_counts
                .read()
                .iter()
                .map(|(name, count)| (name.clone(), *count))
                .collect(),
            recent_alerts: self.recent_count(Utc::now()),
        }
    }

    /// The most recent `limit` alerts, newest first.
    #[must_use]
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        self.history.read().iter().rev().take(limit).cloned().collect()
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for AlertManager {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            rules: Arc::clone(&self.rules),
            channels: Arc::clone(&self.channels),
            last_fired: Arc::clone(&self.last_fired),
            history: Arc::clone(&self.history),
            fired_at: Arc::clone(&self.fired_at),
            fired_counts: Arc::clone(&self.fired_counts),
            rule_locks: Arc::clone(&self.rule_locks),
        }
    }
}
