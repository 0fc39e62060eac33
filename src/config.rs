use moka::future::Cache;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::db;

// Recognized `system_settings` parameter names.
pub const BILLING_DAY: &str = "BILLING_DAY";
pub const ASSIGNED_CONTRACTORS_TIME_LIMIT: &str = "ASSIGNED_CONTRACTORS_TIME_LIMIT";
pub const SLA_WARNING_THRESHOLD: &str = "SLA_WARNING_THRESHOLD";
pub const WORK_DEADLINE_HOURS: &str = "WORK_DEADLINE_HOURS";

/// How long a loaded snapshot is served before the table is consulted again.
const SNAPSHOT_TTL: Duration = Duration::from_secs(60);

/// Typed snapshot of the runtime policy values.
///
/// Every field has a hardcoded default; a missing `system_settings` row, an
/// empty value or one that fails to parse falls back silently. Percentage
/// parameters are stored in the table as whole percents ("20", "95").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeSettings {
    /// Day of month the billing cycle starts on.
    pub billing_day: u32,
    /// Fraction of the reaction window during which only reserved
    /// contractors see a new order.
    pub assigned_contractors_window: f64,
    /// Fraction of an SLA limit at which an order counts as warning.
    pub warning_threshold: f64,
    /// Completion deadline for in-work orders, in hours.
    pub work_deadline_hours: i64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            billing_day: 1,
            assigned_contractors_window: 0.20,
            warning_threshold: 0.95,
            work_deadline_hours: 24,
        }
    }
}

impl RuntimeSettings {
    /// Build a snapshot from raw (name, value) rows, one key at a time so a
    /// single bad value never poisons the others.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let defaults = Self::default();
        let mut snapshot = defaults;
        for (name, value) in pairs {
            match name {
                BILLING_DAY => {
                    snapshot.billing_day = day_of_month_or(value, defaults.billing_day);
                }
                ASSIGNED_CONTRACTORS_TIME_LIMIT => {
                    snapshot.assigned_contractors_window =
                        percent_or(value, defaults.assigned_contractors_window);
                }
                SLA_WARNING_THRESHOLD => {
                    snapshot.warning_threshold = percent_or(value, defaults.warning_threshold);
                }
                WORK_DEADLINE_HOURS => {
                    snapshot.work_deadline_hours =
                        positive_int_or(value, defaults.work_deadline_hours);
                }
                _ => {}
            }
        }
        snapshot
    }
}

fn percent_or(value: &str, default: f64) -> f64 {
    match value.trim().parse::<u32>() {
        Ok(percent) => f64::from(percent) / 100.0,
        Err(_) => default,
    }
}

fn positive_int_or(value: &str, default: i64) -> i64 {
    match value.trim().parse::<i64>() {
        Ok(hours) if hours >= 1 => hours,
        _ => default,
    }
}

fn day_of_month_or(value: &str, default: u32) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(day) if (1..=31).contains(&day) => day,
        _ => default,
    }
}

/// TTL-cached access to the [`RuntimeSettings`] snapshot.
///
/// One snapshot is loaded from the `system_settings` table and served for
/// [`SNAPSHOT_TTL`]; admin edits become visible within that bound without any
/// per-call string lookups on the hot paths.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Arc<Cache<(), RuntimeSettings>>,
    db: DatabaseConnection,
}

impl SettingsCache {
    pub fn new(db: DatabaseConnection) -> Self {
        let cache = Arc::new(
            Cache::builder()
                .time_to_live(SNAPSHOT_TTL)
                .max_capacity(1)
                .build(),
        );
        Self { cache, db }
    }

    /// Current snapshot, loading through the cache on expiry. A load failure
    /// degrades to the defaults rather than failing the calling operation.
    pub async fn current(&self) -> RuntimeSettings {
        self.cache
            .get_with((), async {
                match db::settings::get_all_settings(&self.db).await {
                    Ok(rows) => RuntimeSettings::from_pairs(
                        rows.iter()
                            .map(|row| (row.parameter_name.as_str(), row.parameter_value.as_str())),
                    ),
                    Err(e) => {
                        warn!("failed to load system settings, using defaults: {e}");
                        RuntimeSettings::default()
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_table_is_empty() {
        let snapshot = RuntimeSettings::from_pairs([]);
        assert_eq!(snapshot, RuntimeSettings::default());
        assert_eq!(snapshot.billing_day, 1);
        assert_eq!(snapshot.assigned_contractors_window, 0.20);
        assert_eq!(snapshot.warning_threshold, 0.95);
        assert_eq!(snapshot.work_deadline_hours, 24);
    }

    #[test]
    fn overrides_parse_as_whole_percents() {
        let snapshot = RuntimeSettings::from_pairs([
            (ASSIGNED_CONTRACTORS_TIME_LIMIT, "35"),
            (SLA_WARNING_THRESHOLD, "80"),
        ]);
        assert_eq!(snapshot.assigned_contractors_window, 0.35);
        assert_eq!(snapshot.warning_threshold, 0.80);
    }

    #[test]
    fn unparsable_values_fall_back_per_key() {
        let snapshot = RuntimeSettings::from_pairs([
            (BILLING_DAY, "15"),
            (ASSIGNED_CONTRACTORS_TIME_LIMIT, "not a number"),
            (WORK_DEADLINE_HOURS, ""),
        ]);
        // The good key sticks, the bad ones fall back.
        assert_eq!(snapshot.billing_day, 15);
        assert_eq!(snapshot.assigned_contractors_window, 0.20);
        assert_eq!(snapshot.work_deadline_hours, 24);
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let snapshot = RuntimeSettings::from_pairs([
            (BILLING_DAY, "0"),
            (WORK_DEADLINE_HOURS, "-3"),
        ]);
        assert_eq!(snapshot.billing_day, 1);
        assert_eq!(snapshot.work_deadline_hours, 24);

        let snapshot = RuntimeSettings::from_pairs([(BILLING_DAY, "32")]);
        assert_eq!(snapshot.billing_day, 1);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let snapshot = RuntimeSettings::from_pairs([("SOME_FUTURE_KNOB", "42")]);
        assert_eq!(snapshot, RuntimeSettings::default());
    }
}
