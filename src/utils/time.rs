use chrono::{DateTime, Duration, Utc};

/// Last millisecond of the UTC day `ts` falls on.
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap()
        .and_utc()
}

/// Trial windows run from account creation and close at the end of the last
/// trial day, not at the creation hour.
pub fn trial_end(created_at: DateTime<Utc>, trial_period_days: i64) -> DateTime<Utc> {
    end_of_day(created_at + Duration::days(trial_period_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_end_of_day() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 12, 9, 30, 0).unwrap();
        let eod = end_of_day(ts);
        assert_eq!(
            eod,
            Utc.with_ymd_and_hms(2024, 5, 12, 23, 59, 59).unwrap()
                + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_trial_end_seven_days() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ends = trial_end(created, 7);
        assert_eq!(
            ends,
            Utc.with_ymd_and_hms(2024, 1, 8, 23, 59, 59).unwrap()
                + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_trial_end_keeps_full_last_day() {
        // created late in the day still gets the whole seventh day
        let created = Utc.with_ymd_and_hms(2024, 3, 10, 22, 45, 11).unwrap();
        let ends = trial_end(created, 7);
        assert_eq!(ends.date_naive(), created.date_naive() + Duration::days(7));
        assert!(ends > created + Duration::days(7));
    }
}
