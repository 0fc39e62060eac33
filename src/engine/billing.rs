use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

/// Start of the billing cycle nearest in the past.
///
/// Builds `billing_day` in the current month (clamped to the month's length,
/// so day 31 means "last day" in shorter months) and rolls back one month if
/// that lands in the future. Midnight exactly on the billing day belongs to
/// the cycle that starts then, not the previous one.
pub fn billing_cycle_start(now: DateTime<Utc>, billing_day: u32) -> DateTime<Utc> {
    let day = billing_day.clamp(1, days_in_month(now.year(), now.month()));
    let start = NaiveDate::from_ymd_opt(now.year(), now.month(), day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now); // unreachable: the day is clamped into the month

    if start > now {
        start.checked_sub_months(Months::new(1)).unwrap_or(start)
    } else {
        start
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|date| date.pred_opt())
        .map(|date| date.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn mid_cycle_uses_current_month() {
        let start = billing_cycle_start(utc(2025, 6, 15, 12, 0, 0), 1);
        assert_eq!(start, utc(2025, 6, 1, 0, 0, 0));
    }

    #[test]
    fn exact_midnight_on_billing_day_belongs_to_current_cycle() {
        let start = billing_cycle_start(utc(2025, 6, 1, 0, 0, 0), 1);
        assert_eq!(start, utc(2025, 6, 1, 0, 0, 0));
    }

    #[test]
    fn billing_day_in_future_rolls_back_one_month() {
        let start = billing_cycle_start(utc(2025, 6, 10, 12, 0, 0), 15);
        assert_eq!(start, utc(2025, 5, 15, 0, 0, 0));
    }

    #[test]
    fn rollback_crosses_year_boundary() {
        let start = billing_cycle_start(utc(2025, 1, 3, 8, 0, 0), 20);
        assert_eq!(start, utc(2024, 12, 20, 0, 0, 0));
    }

    #[test]
    fn day_31_clamps_in_short_months() {
        // February 2025 has 28 days; the cycle starts on its last day.
        let start = billing_cycle_start(utc(2025, 2, 28, 10, 0, 0), 31);
        assert_eq!(start, utc(2025, 2, 28, 0, 0, 0));
    }

    #[test]
    fn clamped_day_in_future_rolls_back() {
        let start = billing_cycle_start(utc(2025, 3, 1, 0, 0, 0), 31);
        assert_eq!(start, utc(2025, 2, 28, 0, 0, 0));
    }
}
