//! Date tagging of the recording directory name.

use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// How the recording directory is tagged with the night's date.
///
/// `After` shifts the clock forward 12 hours and `Before` back 12 hours, so a whole
/// night (evening to morning) lands in one directory.
///
/// Text forms are the dashboard option values, such as `none` or `date-pre-true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOption {
    /// No tag.
    #[default]
    None,
    /// `<date>_<dir>` with today's date.
    PreTrue,
    /// `<date>_<dir>` with the date 12 hours ahead.
    PreAfter,
    /// `<date>_<dir>` with the date 12 hours back.
    PreBefore,
    /// `<dir>_<date>` with today's date.
    PostTrue,
    /// `<dir>_<date>` with the date 12 hours ahead.
    PostAfter,
    /// `<dir>_<date>` with the date 12 hours back.
    PostBefore,
}

/// Returned by `DateOption::from_str` for unknown option text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDateOption(pub String);

impl fmt::Display for UnknownDateOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown date option '{}'", self.0)
    }
}

impl std::error::Error for UnknownDateOption {}

impl FromStr for DateOption {
    type Err = UnknownDateOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(DateOption::None),
            "date-pre-true" => Ok(DateOption::PreTrue),
            "date-pre-after" => Ok(DateOption::PreAfter),
            "date-pre-before" => Ok(DateOption::PreBefore),
            "date-post-true" => Ok(DateOption::PostTrue),
            "date-post-after" => Ok(DateOption::PostAfter),
            "date-post-before" => Ok(DateOption::PostBefore),
            other => Err(UnknownDateOption(other.to_string())),
        }
    }
}

impl DateOption {
    /// Parses option text; anything unknown means no tagging.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    fn offset(self) -> Duration {
        match self {
            DateOption::PreAfter | DateOption::PostAfter => Duration::hours(12),
            DateOption::PreBefore | DateOption::PostBefore => Duration::hours(-12),
            _ => Duration::zero(),
        }
    }

    /// Applies the tag to `directory` using `now` as the local time.
    pub fn apply(self, directory: &str, now: NaiveDateTime) -> String {
        let date = (now + self.offset()).format("%Y-%m-%d");
        match self {
            DateOption::None => directory.to_string(),
            DateOption::PreTrue | DateOption::PreAfter | DateOption::PreBefore => {
                format!("{date}_{directory}")
            }
            DateOption::PostTrue | DateOption::PostAfter | DateOption::PostBefore => {
                format!("{directory}_{date}")
            }
        }
    }
}
