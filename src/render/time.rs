use chrono::{DateTime, Utc};

const YEAR: f64 = 31_536_000.0;

/// Largest unit first. A unit applies once more than one of it has passed.
const UNITS: [(f64, &str); 5] = [
    (2_592_000.0, "mo"),
    (604_800.0, "w"),
    (86_400.0, "d"),
    (3_600.0, "h"),
    (60.0, "m"),
];

/// `Jan 2, 2024`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Short elapsed-time label such as `5m` or `3w`; the full date past a year.
pub fn time_since(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    // Clock skew can put a published date slightly in the future.
    let seconds = (now - date).num_seconds().max(0);
    let elapsed = seconds as f64;

    if elapsed / YEAR > 1.0 {
        return format_date(date);
    }

    for (unit, suffix) in UNITS {
        let interval = elapsed / unit;
        if interval > 1.0 {
            return format!("{}{}", interval.floor() as i64, suffix);
        }
    }

    format!("{}s", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ago(d: Duration) -> String {
        time_since(now() - d, now())
    }

    #[test]
    fn test_future_date_reads_as_now() {
        assert_eq!(time_since(now() + Duration::seconds(45), now()), "0s");
        assert_eq!(time_since(now() + Duration::days(2), now()), "0s");
    }

    #[test]
    fn test_units() {
        assert_eq!(ago(Duration::seconds(30)), "30s");
        assert_eq!(ago(Duration::seconds(150)), "2m");
        assert_eq!(ago(Duration::hours(5)), "5h");
        assert_eq!(ago(Duration::days(3)), "3d");
        assert_eq!(ago(Duration::days(15)), "2w");
        assert_eq!(ago(Duration::days(65)), "2mo");
    }

    #[test]
    fn test_exactly_one_unit_falls_through() {
        assert_eq!(ago(Duration::seconds(60)), "60s");
        assert_eq!(ago(Duration::hours(1)), "60m");
    }

    #[test]
    fn test_over_a_year_shows_date() {
        let date = Utc.with_ymd_and_hms(2023, 1, 2, 8, 0, 0).unwrap();
        assert_eq!(time_since(date, now()), "Jan 2, 2023");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 11, 30, 23, 59, 0).unwrap();
        assert_eq!(format_date(date), "Nov 30, 2024");
    }
}
