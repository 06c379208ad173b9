//! Natural-language date resolution.
//!
//! Every resolution is relative to the request's reference date. A date with
//! no explicit year always lands in the reference year: "the 22nd" is the
//! 22nd of the current month, "December 28th" is December 28th of the
//! current year, even when that is in the future.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde_json::Value;

use super::errors::DispatchError;

/// Top-level argument keys holding a single date.
const DATE_FIELDS: &[&str] = &[
    "date",
    "shiftDate",
    "sourceDate",
    "targetDate",
    "startDate",
    "endDate",
    "effectiveDate",
];

/// Keys that may hold a `{start, end}` range object.
const RANGE_FIELDS: &[&str] = &["dateRange"];

#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    today: NaiveDate,
}

impl DateResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Resolve free text to a calendar date, or `None` if nothing fits.
    pub fn resolve(&self, input: &str) -> Option<NaiveDate> {
        let cleaned = normalize(input);
        if cleaned.is_empty() {
            return None;
        }

        if let Some(d) = parse_iso(&cleaned) {
            return Some(d);
        }

        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        self.parse_relative(&tokens)
            .or_else(|| self.parse_weekday(&tokens))
            .or_else(|| self.parse_day_of_month(&tokens))
            .or_else(|| self.parse_month_day(&tokens))
            .or_else(|| self.parse_numeric(&cleaned))
    }

    /// Resolve one named field, returning `YYYY-MM-DD`.
    pub fn resolve_field(&self, field: &str, input: &str) -> Result<String, DispatchError> {
        self.resolve(input)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .ok_or_else(|| DispatchError::UnparseableDate {
                field: field.to_string(),
                input: input.to_string(),
            })
    }

    /// Rewrite every date-like argument in place to `YYYY-MM-DD`.
    ///
    /// Covers the single-date keys, `{start, end}` inside `dateRange` (at the
    /// top level or under `query`), and `date` inside `updates`.
    pub fn resolve_date_fields(&self, args: &mut Value) -> Result<(), DispatchError> {
        let Some(obj) = args.as_object_mut() else {
            return Ok(());
        };

        for key in DATE_FIELDS {
            self.rewrite(obj, key, key)?;
        }
        for key in RANGE_FIELDS {
            if let Some(Value::Object(range)) = obj.get_mut(*key) {
                self.rewrite(range, "start", "dateRange.start")?;
                self.rewrite(range, "end", "dateRange.end")?;
            }
        }
        if let Some(Value::Object(query)) = obj.get_mut("query") {
            if let Some(Value::Object(range)) = query.get_mut("dateRange") {
                self.rewrite(range, "start", "query.dateRange.start")?;
                self.rewrite(range, "end", "query.dateRange.end")?;
            }
        }
        if let Some(Value::Object(updates)) = obj.get_mut("updates") {
            self.rewrite(updates, "date", "updates.date")?;
        }
        Ok(())
    }

    fn rewrite(
        &self,
        obj: &mut serde_json::Map<String, Value>,
        key: &str,
        field_label: &str,
    ) -> Result<(), DispatchError> {
        if let Some(Value::String(raw)) = obj.get(key) {
            let resolved = self.resolve_field(field_label, raw)?;
            obj.insert(key.to_string(), Value::String(resolved));
        }
        Ok(())
    }

    // ─── Forms ──────────────────────────────────────────────────────────

    fn parse_relative(&self, tokens: &[&str]) -> Option<NaiveDate> {
        let t = self.today;
        match tokens {
            ["today"] | ["tonight"] | ["now"] | ["this", "morning" | "afternoon" | "evening"] => {
                Some(t)
            }
            ["yesterday"] | ["last", "night"] => Some(t - Duration::days(1)),
            ["day", "before", "yesterday"] | ["the", "day", "before", "yesterday"] => {
                Some(t - Duration::days(2))
            }
            ["tomorrow"] => Some(t + Duration::days(1)),
            ["last", "week"] | ["a", "week", "ago"] => Some(t - Duration::days(7)),
            [n, unit, "ago"] => {
                let n = parse_count(n)?;
                match *unit {
                    "day" | "days" => Some(t - Duration::days(n)),
                    "week" | "weeks" => Some(t - Duration::days(n * 7)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn parse_weekday(&self, tokens: &[&str]) -> Option<NaiveDate> {
        let (qualifier, name) = match tokens {
            [name] => (None, *name),
            [q @ ("last" | "this" | "next" | "on" | "past"), name] => (Some(*q), *name),
            _ => return None,
        };
        let target = parse_weekday_name(name)?;

        let today_idx = i64::from(self.today.weekday().num_days_from_monday());
        let target_idx = i64::from(target.num_days_from_monday());
        let back = (today_idx - target_idx).rem_euclid(7);
        let forward = (target_idx - today_idx).rem_euclid(7);

        let date = match qualifier {
            Some("next") => self.today + Duration::days(if forward == 0 { 7 } else { forward }),
            Some("last") | Some("past") => {
                self.today - Duration::days(if back == 0 { 7 } else { back })
            }
            _ => self.today - Duration::days(back),
        };
        Some(date)
    }

    /// "the 22nd", "22nd": the given day in the reference month.
    fn parse_day_of_month(&self, tokens: &[&str]) -> Option<NaiveDate> {
        let day_token = match tokens {
            ["the", d] => *d,
            [d] if has_ordinal_suffix(d) => *d,
            _ => return None,
        };
        let day = parse_day(day_token)?;
        NaiveDate::from_ymd_opt(self.today.year(), self.today.month(), day)
    }

    /// "december 28th", "dec 28 2024", "28 december", "the 28th of december last year".
    fn parse_month_day(&self, tokens: &[&str]) -> Option<NaiveDate> {
        let tokens: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|t| *t != "the" && *t != "of" && *t != "on")
            .collect();

        let (month, day, rest) = match tokens.as_slice() {
            [m, d, rest @ ..] if parse_month(m).is_some() => (parse_month(m)?, parse_day(d)?, rest),
            [d, m, rest @ ..] if parse_month(m).is_some() => (parse_month(m)?, parse_day(d)?, rest),
            _ => return None,
        };

        let year = match rest {
            [] | ["this", "year"] => self.today.year(),
            ["last", "year"] => self.today.year() - 1,
            ["next", "year"] => self.today.year() + 1,
            [y] => parse_year(y)?,
            _ => return None,
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// US numeric form: `12/28`, `12/28/2024`, `12/28/24`.
    fn parse_numeric(&self, s: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = s.split('/').collect();
        let (m, d, y) = match parts.as_slice() {
            [m, d] => (*m, *d, None),
            [m, d, y] => (*m, *d, Some(*y)),
            _ => return None,
        };
        let month: u32 = m.trim().parse().ok()?;
        let day: u32 = d.trim().parse().ok()?;
        let year = match y {
            None => self.today.year(),
            Some(y) => parse_year(y.trim())?,
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

// ─── Token helpers ──────────────────────────────────────────────────────────

fn normalize(input: &str) -> String {
    input
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase()
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `YYYY-MM-DD`, optionally followed by a time part.
fn parse_iso(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10)?;
    let tail = &s[10..];
    if !(tail.is_empty() || tail.starts_with('t') || tail.starts_with(' ')) {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_count(token: &str) -> Option<i64> {
    let n = match token {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        other => other.parse().ok()?,
    };
    (0..=366).contains(&n).then_some(n)
}

fn has_ordinal_suffix(token: &str) -> bool {
    ["st", "nd", "rd", "th"]
        .iter()
        .any(|s| token.len() > 2 && token.ends_with(s) && token[..token.len() - 2].chars().all(|c| c.is_ascii_digit()))
}

fn parse_day(token: &str) -> Option<u32> {
    let digits = token
        .strip_suffix("st")
        .or_else(|| token.strip_suffix("nd"))
        .or_else(|| token.strip_suffix("rd"))
        .or_else(|| token.strip_suffix("th"))
        .unwrap_or(token);
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn parse_year(token: &str) -> Option<i32> {
    let y: i32 = token.parse().ok()?;
    match token.len() {
        2 => Some(2000 + y),
        4 => Some(y),
        _ => None,
    }
}

fn parse_month(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let token = token.trim_end_matches('.');
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(token))
        .map(|i| i as u32 + 1)
}

fn parse_weekday_name(token: &str) -> Option<Weekday> {
    let token = token.trim_end_matches('s'); // "fridays"
    let day = match token {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tues" | "tuesday" => Weekday::Tue,
        "wed" | "wednesday" => Weekday::Wed,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2026-01-10 is a Saturday.
    fn resolver() -> DateResolver {
        DateResolver::new(d(2026, 1, 10))
    }

    #[test]
    fn test_bare_day_of_month_stays_in_current_month() {
        assert_eq!(resolver().resolve("the 22nd"), Some(d(2026, 1, 22)));
        assert_eq!(resolver().resolve("22nd"), Some(d(2026, 1, 22)));
        assert_eq!(resolver().resolve("the 3rd"), Some(d(2026, 1, 3)));
    }

    #[test]
    fn test_month_day_uses_current_year() {
        assert_eq!(resolver().resolve("December 28th"), Some(d(2026, 12, 28)));
        assert_eq!(resolver().resolve("Dec 28"), Some(d(2026, 12, 28)));
        assert_eq!(resolver().resolve("28 December"), Some(d(2026, 12, 28)));
        assert_eq!(resolver().resolve("the 28th of December"), Some(d(2026, 12, 28)));
    }

    #[test]
    fn test_explicit_year_is_honored() {
        assert_eq!(resolver().resolve("2024-12-28"), Some(d(2024, 12, 28)));
        assert_eq!(resolver().resolve("December 28, 2024"), Some(d(2024, 12, 28)));
        assert_eq!(resolver().resolve("dec 28th last year"), Some(d(2025, 12, 28)));
        assert_eq!(resolver().resolve("12/28/24"), Some(d(2024, 12, 28)));
    }

    #[test]
    fn test_iso_with_time_keeps_date() {
        assert_eq!(resolver().resolve("2026-01-05T18:30:00Z"), Some(d(2026, 1, 5)));
    }

    #[test]
    fn test_relative_words() {
        let r = resolver();
        assert_eq!(r.resolve("today"), Some(d(2026, 1, 10)));
        assert_eq!(r.resolve("Tonight"), Some(d(2026, 1, 10)));
        assert_eq!(r.resolve("yesterday"), Some(d(2026, 1, 9)));
        assert_eq!(r.resolve("day before yesterday"), Some(d(2026, 1, 8)));
        assert_eq!(r.resolve("tomorrow"), Some(d(2026, 1, 11)));
        assert_eq!(r.resolve("3 days ago"), Some(d(2026, 1, 7)));
        assert_eq!(r.resolve("two weeks ago"), Some(d(2025, 12, 27)));
        assert_eq!(r.resolve("last week"), Some(d(2026, 1, 3)));
    }

    #[test]
    fn test_weekdays() {
        let r = resolver();
        // Saturday itself
        assert_eq!(r.resolve("saturday"), Some(d(2026, 1, 10)));
        assert_eq!(r.resolve("last saturday"), Some(d(2026, 1, 3)));
        assert_eq!(r.resolve("friday"), Some(d(2026, 1, 9)));
        assert_eq!(r.resolve("on Monday"), Some(d(2026, 1, 5)));
        assert_eq!(r.resolve("next monday"), Some(d(2026, 1, 12)));
        assert_eq!(r.resolve("next saturday"), Some(d(2026, 1, 17)));
    }

    #[test]
    fn test_numeric_us_form() {
        assert_eq!(resolver().resolve("1/5"), Some(d(2026, 1, 5)));
        assert_eq!(resolver().resolve("12/28/2024"), Some(d(2024, 12, 28)));
    }

    #[test]
    fn test_unparseable() {
        let r = resolver();
        assert_eq!(r.resolve("whenever"), None);
        assert_eq!(r.resolve(""), None);
        assert_eq!(r.resolve("the 45th"), None);
        assert_eq!(r.resolve("february 30"), None);
        let err = r.resolve_field("date", "someday").unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnparseableDate {
                field: "date".into(),
                input: "someday".into()
            }
        );
    }

    #[test]
    fn test_resolve_date_fields_rewrites_in_place() {
        let mut args = json!({
            "date": "yesterday",
            "sourceDate": "the 2nd",
            "cashTips": 40,
            "dateRange": {"start": "Jan 1", "end": "today"},
            "query": {"dateRange": {"start": "12/1/2025"}},
            "updates": {"date": "friday", "notes": "moved"}
        });
        resolver().resolve_date_fields(&mut args).unwrap();
        assert_eq!(args["date"], json!("2026-01-09"));
        assert_eq!(args["sourceDate"], json!("2026-01-02"));
        assert_eq!(args["cashTips"], json!(40));
        assert_eq!(args["dateRange"]["start"], json!("2026-01-01"));
        assert_eq!(args["dateRange"]["end"], json!("2026-01-10"));
        assert_eq!(args["query"]["dateRange"]["start"], json!("2025-12-01"));
        assert_eq!(args["updates"]["date"], json!("2026-01-09"));
        assert_eq!(args["updates"]["notes"], json!("moved"));
    }

    #[test]
    fn test_resolve_date_fields_reports_field() {
        let mut args = json!({"startDate": "2026-01-01", "endDate": "soon-ish"});
        let err = resolver().resolve_date_fields(&mut args).unwrap_err();
        match err {
            DispatchError::UnparseableDate { field, input } => {
                assert_eq!(field, "endDate");
                assert_eq!(input, "soon-ish");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
