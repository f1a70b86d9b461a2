//! Run-date handling: the analysis window and date templates for output paths
//! and figure titles.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ContourError, ContourResult};

/// Half-open time window `[start, end)` selecting the time steps of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window starting at 00:00 UTC on the given date.
    ///
    /// Missing date parts are taken from `today - 1 day`.
    pub fn from_date_parts(
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
        window_hours: u32,
        today: DateTime<Utc>,
    ) -> ContourResult<Self> {
        let yesterday = today - Duration::days(1);
        let year = year.unwrap_or_else(|| yesterday.year());
        let month = month.unwrap_or_else(|| yesterday.month());
        let day = day.unwrap_or_else(|| yesterday.day());

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ContourError::invalid_parameter(
                "date",
                format!("{:04}-{:02}-{:02} is not a calendar date", year, month, day),
            )
        })?;
        if window_hours == 0 {
            return Err(ContourError::invalid_parameter(
                "time-window",
                "window must be at least one hour",
            ));
        }

        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ContourError::invalid_parameter("date", "no midnight on that date"))?;
        let start = Utc.from_utc_datetime(&midnight);
        Ok(Self {
            start,
            end: start + Duration::hours(window_hours as i64),
        })
    }

    /// Half-open containment test.
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        t >= &self.start && t < &self.end
    }
}

/// Mean of a set of time stamps, or None when empty.
pub fn mean_time(times: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    let first = *times.iter().min()?;
    let total_ms: i64 = times
        .iter()
        .map(|t| (*t - first).num_milliseconds())
        .sum();
    Some(first + Duration::milliseconds(total_ms / times.len() as i64))
}

/// Resolve date placeholders in a path or title template.
///
/// Recognized placeholders:
/// - `{year}` `{month}` `{day}` `{hour}` `{minute}` `{doy}` (zero padded)
/// - strftime-style `%Y` `%m` `%d` `%H` `%M` `%j`
/// - `{{`, `}}` and `%%` for literal braces and percent signs
///
/// Braces only form a placeholder around an identifier, so TeX markup such
/// as `m$^{-3}$` passes through unchanged. An unknown identifier in braces or
/// an unknown `%` token is rejected.
pub fn resolve_template(template: &str, time: &DateTime<Utc>) -> ContourResult<String> {
    let invalid = |message: String| ContourError::InvalidTemplate {
        template: template.to_string(),
        message,
    };

    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let Some(name) = placeholder_name(chars.clone()) else {
                    out.push('{');
                    continue;
                };
                let value = placeholder_value(&name, time)
                    .ok_or_else(|| invalid(format!("unknown placeholder '{{{}}}'", name)))?;
                out.push_str(&value);
                // name is ASCII; skip it and the closing brace
                for _ in 0..=name.len() {
                    chars.next();
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            '%' => {
                let token = chars
                    .next()
                    .ok_or_else(|| invalid("dangling '%' at end".to_string()))?;
                let value = match token {
                    'Y' => placeholder_value("year", time),
                    'm' => placeholder_value("month", time),
                    'd' => placeholder_value("day", time),
                    'H' => placeholder_value("hour", time),
                    'M' => placeholder_value("minute", time),
                    'j' => placeholder_value("doy", time),
                    '%' => Some("%".to_string()),
                    _ => None,
                };
                let value = value.ok_or_else(|| invalid(format!("unknown token '%{}'", token)))?;
                out.push_str(&value);
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// The identifier between an opening brace and the next `}`, or None when
/// the brace holds anything else or is never closed.
fn placeholder_name(rest: impl Iterator<Item = char>) -> Option<String> {
    let mut name = String::new();
    for c in rest {
        if c == '}' {
            let starts_like_identifier =
                name.starts_with(|first: char| first.is_ascii_alphabetic() || first == '_');
            return starts_like_identifier.then_some(name);
        }
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        name.push(c);
    }
    None
}

/// Check a template without resolving it against a real date.
pub fn validate_template(template: &str) -> ContourResult<()> {
    resolve_template(template, &DateTime::<Utc>::default()).map(|_| ())
}

fn placeholder_value(name: &str, time: &DateTime<Utc>) -> Option<String> {
    let value = match name {
        "year" => format!("{:04}", time.year()),
        "month" => format!("{:02}", time.month()),
        "day" => format!("{:02}", time.day()),
        "hour" => format!("{:02}", time.hour()),
        "minute" => format!("{:02}", time.minute()),
        "doy" => format!("{:03}", time.ordinal()),
        _ => return None,
    };
    Some(value)
}
