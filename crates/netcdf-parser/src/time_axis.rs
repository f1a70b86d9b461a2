//! Decoding of CF-convention time coordinates.
//!
//! Time variables store offsets from a reference date, described by a `units`
//! attribute such as `"minutes since 2018-01-01 00:30:00"` or the GrADS/OPeNDAP
//! form `"days since 1-1-1 00:00:0.0"`.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hours),
            "d" | "day" | "days" => Some(Self::Days),
            _ => None,
        }
    }

    fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86400.0,
        }
    }
}

/// Parsed `"<unit> since <reference>"` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub reference: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a CF `units` string.
    ///
    /// Calendars are not interpreted: offsets are applied on the proleptic
    /// Gregorian calendar.
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let invalid = || NetCdfError::InvalidFormat(format!("unsupported time units '{}'", units));

        let mut parts = units.trim().splitn(3, char::is_whitespace);
        let unit = parts.next().and_then(TimeUnit::parse).ok_or_else(invalid)?;
        if !parts.next().is_some_and(|s| s.eq_ignore_ascii_case("since")) {
            return Err(invalid());
        }
        let reference = parts.next().ok_or_else(invalid)?;
        let reference = parse_reference(reference.trim()).ok_or_else(invalid)?;

        Ok(Self { unit, reference })
    }

    /// Convert one offset value to an absolute time.
    pub fn to_datetime(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.unit.seconds() * 1000.0).round();
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        self.reference
            .checked_add_signed(Duration::milliseconds(millis as i64))
    }

    /// Convert a whole time axis.
    pub fn decode(&self, values: &[f64]) -> NetCdfResult<Vec<DateTime<Utc>>> {
        values
            .iter()
            .map(|&v| {
                self.to_datetime(v).ok_or_else(|| {
                    NetCdfError::InvalidFormat(format!("time value {} is out of range", v))
                })
            })
            .collect()
    }
}

/// Parse `Y-M-D[( |T)h:m:s[.f]][Z| UTC]` with unpadded fields allowed.
fn parse_reference(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC").trim();
    let (date_part, time_part) = match s.split_once(|c: char| c == ' ' || c == 'T') {
        Some((d, t)) => (d, t.trim()),
        None => (s, ""),
    };

    let mut ymd = date_part.splitn(3, '-').map(|p| p.parse::<i64>().ok());
    let year = ymd.next()??;
    let month = ymd.next()??;
    let day = ymd.next().unwrap_or(Some(1))?;
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;

    let mut seconds = 0.0f64;
    if !time_part.is_empty() {
        let scales = [3600.0, 60.0, 1.0];
        for (field, scale) in time_part.split(':').zip(scales) {
            seconds += field.parse::<f64>().ok()? * scale;
        }
    }

    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    midnight.checked_add_signed(Duration::milliseconds((seconds * 1000.0).round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_since() {
        let units = CfTimeUnits::parse("minutes since 2018-01-01 00:30:00").unwrap();
        assert_eq!(units.unit, TimeUnit::Minutes);
        assert_eq!(
            units.reference,
            Utc.with_ymd_and_hms(2018, 1, 1, 0, 30, 0).unwrap()
        );
        assert_eq!(
            units.to_datetime(60.0).unwrap(),
            Utc.with_ymd_and_hms(2018, 1, 1, 1, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_grads_style_reference() {
        let units = CfTimeUnits::parse("days since 1-1-1 00:00:0.0").unwrap();
        assert_eq!(units.unit, TimeUnit::Days);
        assert_eq!(units.reference, Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_iso_reference() {
        let units = CfTimeUnits::parse("hours since 2020-01-01T00:00:00Z").unwrap();
        let times = units.decode(&[0.0, 1.5]).unwrap();
        assert_eq!(times[1], Utc.with_ymd_and_hms(2020, 1, 1, 1, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only_reference() {
        let units = CfTimeUnits::parse("days since 2020-01-01").unwrap();
        assert_eq!(
            units.to_datetime(0.5).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejects_unknown_units() {
        assert!(CfTimeUnits::parse("fortnights since 2020-01-01").is_err());
        assert!(CfTimeUnits::parse("days after 2020-01-01").is_err());
        assert!(CfTimeUnits::parse("days since").is_err());
        assert!(CfTimeUnits::parse("days since yesterday").is_err());
    }

    #[test]
    fn test_non_finite_offset() {
        let units = CfTimeUnits::parse("seconds since 1970-01-01").unwrap();
        assert!(units.to_datetime(f64::NAN).is_none());
        assert!(units.decode(&[f64::INFINITY]).is_err());
    }
}
