use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::DateError;

/// A commit timestamp with its recorded timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Timezone offset in minutes east of UTC.
    pub offset_minutes: i32,
}

/// Output styles for rendering a [`Date`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    /// "Thu Feb 13 23:31:30 2009 +0000", in the commit's own timezone.
    #[default]
    Default,
    /// "2009-02-13 23:31:30 +0000"
    Iso,
    /// "2009-02-13T23:31:30+00:00"
    IsoStrict,
    /// "Fri, 13 Feb 2009 23:31:30 +0000"
    Rfc2822,
    /// "2009-02-13"
    Short,
    /// "1234567890 +0000"
    Raw,
    /// "1234567890"
    Unix,
    /// "2 hours ago"
    Relative,
    /// Local wall-clock time, no offset shown.
    Local,
}

/// Convert a git decimal offset (`-0530` parsed as the integer -530) to
/// minutes east of UTC.
fn decimal_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.abs();
    sign * ((abs / 100) * 60 + abs % 100)
}

/// Inverse of [`decimal_to_minutes`].
fn minutes_to_decimal(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.abs();
    sign * ((abs / 60) * 100 + abs % 60)
}

impl Date {
    pub fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }

    /// Build from the decimal timezone convention of commit headers, where
    /// `-0530` arrives as the integer `-530`.
    pub fn from_decimal_offset(seconds: i64, tz: i32) -> Self {
        Self {
            seconds,
            offset_minutes: decimal_to_minutes(tz),
        }
    }

    /// Parse the raw header form `"<seconds> <±HHMM>"`; a missing offset
    /// means UTC.
    pub fn parse_raw(input: &str) -> Result<Self, DateError> {
        let mut parts = input.trim().splitn(2, ' ');
        let seconds = parts
            .next()
            .unwrap_or("")
            .parse::<i64>()
            .map_err(|_| DateError::Date(format!("bad timestamp in {input:?}")))?;
        let tz = match parts.next() {
            Some(tz) => tz
                .trim()
                .parse::<i32>()
                .map_err(|_| DateError::Date(format!("bad timezone in {input:?}")))?,
            None => 0,
        };
        Ok(Self::from_decimal_offset(seconds, tz))
    }

    /// Render in the given style.
    pub fn format(&self, style: DateStyle) -> String {
        match style {
            DateStyle::Raw => {
                format!(
                    "{} {:+05}",
                    self.seconds,
                    minutes_to_decimal(self.offset_minutes)
                )
            }
            DateStyle::Unix => self.seconds.to_string(),
            DateStyle::Relative => self.format_relative(),
            DateStyle::Local => {
                let dt = DateTime::from_timestamp(self.seconds, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH)
                    .with_timezone(&Local);
                dt.format("%a %b %e %H:%M:%S %Y").to_string()
            }
            _ => {
                let offset = FixedOffset::east_opt(self.offset_minutes * 60)
                    .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
                let dt = DateTime::from_timestamp(self.seconds, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH)
                    .with_timezone(&offset);
                match style {
                    DateStyle::Default => dt.format("%a %b %e %H:%M:%S %Y %z").to_string(),
                    DateStyle::Iso => dt.format("%Y-%m-%d %H:%M:%S %z").to_string(),
                    DateStyle::IsoStrict => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
                    DateStyle::Rfc2822 => dt.format("%a, %d %b %Y %H:%M:%S %z").to_string(),
                    DateStyle::Short => dt.format("%Y-%m-%d").to_string(),
                    _ => unreachable!("handled above"),
                }
            }
        }
    }

    fn format_relative(&self) -> String {
        let diff = Utc::now().timestamp() - self.seconds;
        if diff < 0 {
            return "in the future".into();
        }
        let diff = diff as u64;
        const MINUTE: u64 = 60;
        const HOUR: u64 = 3600;
        const DAY: u64 = 86400;
        match diff {
            0..=1 => "just now".into(),
            2..=59 => format!("{diff} seconds ago"),
            60..=119 => "1 minute ago".into(),
            d if d < HOUR => format!("{} minutes ago", d / MINUTE),
            d if d < 2 * HOUR => "1 hour ago".into(),
            d if d < DAY => format!("{} hours ago", d / HOUR),
            d if d < 2 * DAY => "1 day ago".into(),
            d if d < 7 * DAY => format!("{} days ago", d / DAY),
            d if d < 14 * DAY => "1 week ago".into(),
            d if d < 30 * DAY => format!("{} weeks ago", d / (7 * DAY)),
            d if d < 60 * DAY => "1 month ago".into(),
            d if d < 365 * DAY => format!("{} months ago", d / (30 * DAY)),
            d if d < 2 * 365 * DAY => "1 year ago".into(),
            d => {
                let years = d / (365 * DAY);
                let months = (d % (365 * DAY)) / (30 * DAY);
                if months > 0 {
                    format!("{years} years, {months} months ago")
                } else {
                    format!("{years} years ago")
                }
            }
        }
    }
}
