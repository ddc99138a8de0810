//! Symbolic date ranges resolved in the caller's time zone.
//!
//! Accepted tokens:
//! - `last-N-days` with `1 <= N <= 366`; today counts as one of the N days.
//! - `YYYY-M` or `YYYY-MM`: one calendar month.
//!
//! The result is a UTC `[start, end)` window whose bounds are local
//! midnights in the given IANA zone.

use chrono::{DateTime, Days, LocalResult, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{EngineError, ResultEngine};

pub const MAX_LAST_DAYS: u32 = 366;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn parse_time_zone(name: &str) -> ResultEngine<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::Validation(format!("invalid time zone: {name}")))
}

/// Resolve `token` relative to `now` in the zone named `time_zone`.
pub fn resolve_date_range(
    token: &str,
    time_zone: &str,
    now: DateTime<Utc>,
) -> ResultEngine<DateRange> {
    let tz = parse_time_zone(time_zone)?;
    let token = token.trim();
    let (first_day, end_day) = if let Some(days) = parse_last_days(token)? {
        let today = now.with_timezone(&tz).date_naive();
        let first = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| invalid_token(token))?;
        let end = today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| invalid_token(token))?;
        (first, end)
    } else {
        let first = parse_month(token)?;
        let end = first
            .checked_add_months(Months::new(1))
            .ok_or_else(|| invalid_token(token))?;
        (first, end)
    };
    Ok(DateRange {
        start: local_midnight(&tz, first_day)?,
        end: local_midnight(&tz, end_day)?,
    })
}

fn invalid_token(token: &str) -> EngineError {
    EngineError::Validation(format!("invalid date range: {token}"))
}

/// `Ok(None)` when the token is not of the `last-N-days` form at all.
fn parse_last_days(token: &str) -> ResultEngine<Option<u32>> {
    let Some(days) = token
        .strip_prefix("last-")
        .and_then(|rest| rest.strip_suffix("-days"))
    else {
        return Ok(None);
    };
    let days: u32 = days.parse().map_err(|_| invalid_token(token))?;
    if !(1..=MAX_LAST_DAYS).contains(&days) {
        return Err(EngineError::Validation(format!(
            "last-N-days must have 1 <= N <= {MAX_LAST_DAYS}"
        )));
    }
    Ok(Some(days))
}

fn parse_month(token: &str) -> ResultEngine<NaiveDate> {
    let (year, month) = token.split_once('-').ok_or_else(|| invalid_token(token))?;
    if year.len() != 4 || !(1..=2).contains(&month.len()) {
        return Err(invalid_token(token));
    }
    let year: i32 = year.parse().map_err(|_| invalid_token(token))?;
    let month: u32 = month.parse().map_err(|_| invalid_token(token))?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| invalid_token(token))
}

/// Start of `day` in `tz`. When midnight falls in a DST gap the first
/// instant after the gap is used.
fn local_midnight(tz: &Tz, day: NaiveDate) -> ResultEngine<DateTime<Utc>> {
    let mut local = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| EngineError::Validation("invalid date".to_string()))?;
    for _ in 0..4 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => {
                return Ok(at.with_timezone(&Utc));
            }
            LocalResult::None => local += chrono::Duration::minutes(30),
        }
    }
    Err(EngineError::Validation(format!(
        "no local midnight on {} in {}",
        day,
        tz.name()
    )))
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn last_seven_days_includes_today_in_local_zone() {
        // 2024-03-10 20:00 UTC is already 2024-03-11 in Jakarta (UTC+7).
        let range = resolve_date_range("last-7-days", "Asia/Jakarta", at(2024, 3, 10, 20)).unwrap();
        assert_eq!(range.start, at(2024, 3, 4, 17));
        assert_eq!(range.end, at(2024, 3, 11, 17));
        assert_eq!(range.days(), 7);
        assert!(range.contains(at(2024, 3, 10, 20)));
    }

    #[test]
    fn month_token_accepts_single_and_double_digit_months() {
        let now = at(2024, 6, 1, 0);
        let short = resolve_date_range("2024-2", "UTC", now).unwrap();
        let long = resolve_date_range("2024-02", "UTC", now).unwrap();
        assert_eq!(short, long);
        assert_eq!(short.start, at(2024, 2, 1, 0));
        assert_eq!(short.end, at(2024, 3, 1, 0));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let range = resolve_date_range("2023-12", "Europe/London", at(2024, 1, 5, 0)).unwrap();
        assert_eq!(range.start, at(2023, 12, 1, 0));
        assert_eq!(range.end, at(2024, 1, 1, 0));
    }

    #[test]
    fn rejects_bad_tokens_and_zones() {
        let now = at(2024, 1, 1, 0);
        for token in ["last-0-days", "last-367-days", "last-x-days", "2024-13", "24-1", "yesterday"] {
            assert!(
                matches!(resolve_date_range(token, "UTC", now), Err(EngineError::Validation(_))),
                "token {token}"
            );
        }
        assert!(matches!(
            resolve_date_range("2024-1", "Mars/Olympus", now),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn midnight_in_dst_gap_moves_forward() {
        // Santiago skipped 2022-09-11 00:00 -> 01:00 local.
        let range = resolve_date_range("last-1-days", "America/Santiago", at(2022, 9, 11, 12)).unwrap();
        assert_eq!(range.start, at(2022, 9, 11, 4));
    }
}
