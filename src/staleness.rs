use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};

/// Daily refresh boundary: dashboard data fetched before the most recent
/// 03:00 local is considered outdated.
const CUTOFF_HOUR: u32 = 3;

/// Whether a cached fetch timestamp (epoch milliseconds) predates the most
/// recent 03:00-local cutoff. `None` means never fetched, always stale.
///
/// Before 03:00 the effective cutoff is yesterday's, so data fetched the
/// previous evening stays valid for users active past midnight.
pub fn is_data_stale(last_fetch_ms: Option<i64>) -> bool {
    is_stale_at(last_fetch_ms, Local::now())
}

/// Deterministic core of [`is_data_stale`] with an injected clock.
pub fn is_stale_at(last_fetch_ms: Option<i64>, now: DateTime<Local>) -> bool {
    let Some(ts) = last_fetch_ms else {
        return true;
    };

    let cutoff_time = NaiveTime::from_hms_opt(CUTOFF_HOUR, 0, 0).unwrap();
    let mut cutoff_date = now.date_naive();
    if now.time() < cutoff_time {
        cutoff_date = cutoff_date - Duration::days(1);
    }

    let cutoff = match Local
        .from_local_datetime(&cutoff_date.and_time(cutoff_time))
        .earliest()
    {
        Some(dt) => dt,
        // 03:00 skipped by a DST transition; force a refresh.
        None => return true,
    };

    ts < cutoff.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn ms(dt: DateTime<Local>) -> i64 {
        dt.timestamp_millis()
    }

    #[test]
    fn never_fetched_is_stale() {
        assert!(is_data_stale(None));
    }

    #[test]
    fn just_fetched_is_fresh() {
        assert!(!is_stale_at(
            Some(ms(local(2026, 6, 10, 14, 0))),
            local(2026, 6, 10, 14, 0),
        ));
    }

    #[test]
    fn yesterday_evening_fetch_survives_early_morning() {
        let fetched = ms(local(2026, 6, 9, 16, 0));
        assert!(!is_stale_at(Some(fetched), local(2026, 6, 10, 2, 0)));
    }

    #[test]
    fn yesterday_evening_fetch_expires_after_cutoff() {
        let fetched = ms(local(2026, 6, 9, 16, 0));
        assert!(is_stale_at(Some(fetched), local(2026, 6, 10, 4, 0)));
    }

    #[test]
    fn fetch_exactly_at_cutoff_is_fresh() {
        let cutoff = ms(local(2026, 6, 10, 3, 0));
        assert!(!is_stale_at(Some(cutoff), local(2026, 6, 10, 9, 0)));
        assert!(is_stale_at(Some(cutoff - 1), local(2026, 6, 10, 9, 0)));
    }

    #[test]
    fn pre_cutoff_now_uses_yesterday_boundary() {
        // At 02:59 today the boundary is yesterday 03:00.
        let now = local(2026, 6, 10, 2, 59);
        assert!(is_stale_at(Some(ms(local(2026, 6, 9, 2, 0))), now));
        assert!(!is_stale_at(Some(ms(local(2026, 6, 9, 4, 0))), now));
    }

    #[test]
    fn wall_clock_wrapper_matches_now() {
        assert!(!is_data_stale(Some(chrono::Utc::now().timestamp_millis())));
    }
}
