//! Pre-compiled string formats used by [`Check::Format`](crate::Check::Format)

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern"));

static DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("date pattern"));

/// Named string format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// E-mail address (RFC 5322 simplified)
    Email,
    /// http/https URL
    Url,
    /// Calendar date `YYYY-MM-DD`, day checked against the month
    Date,
}

impl Format {
    pub fn matches(self, value: &str) -> bool {
        match self {
            Format::Email => EMAIL_REGEX.is_match(value),
            Format::Url => URL_REGEX.is_match(value),
            Format::Date => is_date(value),
        }
    }

    /// Name used in error messages
    pub fn describe(self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Url => "URL",
            Format::Date => "date (YYYY-MM-DD)",
        }
    }
}

fn is_date(value: &str) -> bool {
    let Some(caps) = DATE_REGEX.captures(value) else {
        return false;
    };
    let year: u32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    let day: u32 = caps[3].parse().unwrap_or(0);
    (1..=days_in_month(year, month)).contains(&day)
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        _ => 0,
    }
}
