//! Date recognition in free text.
//!
//! [`DateRecognizer`] finds date mentions in short texts such as
//! `"Posted on March 3, 2019 10:15"`, `"03.03.2019"` or `"vor 2 Tagen"`.
//! Month names and relative phrases are recognised for English, German and
//! Spanish. Every mention is returned with its surface text and the resolved
//! [`NaiveDateTime`]; dates on or before 1993-04-30 are discarded since no
//! forum software predates the web.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use harvest_core::dates::DateRecognizer;
//!
//! let now = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let recognizer = DateRecognizer::with_reference(&["en".to_string()], now).unwrap();
//! let found = recognizer.find_dates("asdfad 25-February-2012 21:46  afd adsf");
//!
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].surface, "25-February-2012 21:46");
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::{HarvestError, Result};

const ENGLISH_MONTHS: &[(&str, u32)] = &[
    ("january", 1), ("jan", 1), ("february", 2), ("feb", 2), ("march", 3), ("mar", 3), ("april", 4), ("apr", 4),
    ("may", 5), ("june", 6), ("jun", 6), ("july", 7), ("jul", 7), ("august", 8), ("aug", 8), ("september", 9),
    ("sept", 9), ("sep", 9), ("october", 10), ("oct", 10), ("november", 11), ("nov", 11), ("december", 12),
    ("dec", 12),
];

const GERMAN_MONTHS: &[(&str, u32)] = &[
    ("januar", 1), ("jänner", 1), ("jan", 1), ("februar", 2), ("feb", 2), ("märz", 3), ("maerz", 3), ("mär", 3),
    ("mrz", 3), ("april", 4), ("apr", 4), ("mai", 5), ("juni", 6), ("jun", 6), ("juli", 7), ("jul", 7),
    ("august", 8), ("aug", 8), ("september", 9), ("sept", 9), ("sep", 9), ("oktober", 10), ("okt", 10),
    ("november", 11), ("nov", 11), ("dezember", 12), ("dez", 12),
];

const SPANISH_MONTHS: &[(&str, u32)] = &[
    ("enero", 1), ("ene", 1), ("febrero", 2), ("feb", 2), ("marzo", 3), ("mar", 3), ("abril", 4), ("abr", 4),
    ("mayo", 5), ("may", 5), ("junio", 6), ("jun", 6), ("julio", 7), ("jul", 7), ("agosto", 8), ("ago", 8),
    ("septiembre", 9), ("setiembre", 9), ("sept", 9), ("sep", 9), ("octubre", 10), ("oct", 10),
    ("noviembre", 11), ("nov", 11), ("diciembre", 12), ("dic", 12),
];

/// Optional clock time following a date.
const TIME: &str = r"(?:(?:T|\s*(?:,|-|at|um|a las)?\s*\b)(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?(?:\s*(?P<ampm>[ap])\.?m\b\.?)?)?";

/// A date mention found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateMatch {
    /// The matched text, as written.
    pub surface: String,
    /// The resolved timestamp (midnight when no time was given).
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    YearFirst,
    Dotted,
    Slashed,
    DayMonthName,
    MonthNameDay,
    RelativeDay,
    Ago,
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

/// Multi-language date recognizer.
///
/// The reference time resolves relative phrases and separates past from
/// future dates.
#[derive(Debug, Clone)]
pub struct DateRecognizer {
    now: NaiveDateTime,
    month_first_slashes: bool,
    months: HashMap<String, u32>,
    patterns: Vec<(Pattern, Regex)>,
}

impl DateRecognizer {
    /// Creates a recognizer for `languages` relative to the local clock.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ConfigError`] if none of the languages is supported.
    pub fn new(languages: &[String]) -> Result<Self> {
        Self::with_reference(languages, Local::now().naive_local())
    }

    /// Creates a recognizer resolving relative dates against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ConfigError`] if none of the languages is supported.
    pub fn with_reference(languages: &[String], now: NaiveDateTime) -> Result<Self> {
        let mut months = HashMap::new();
        let mut relative_words = Vec::new();
        let mut ago_patterns = Vec::new();

        for language in languages {
            let (names, words, ago) = match language.as_str() {
                "en" => (ENGLISH_MONTHS, ["today", "yesterday"], r"\b(?P<n>\d+)\s+(?P<unit>min(?:ute)?s?|hours?|days?|weeks?|months?|years?)\s+ago\b"),
                "de" => (GERMAN_MONTHS, ["heute", "gestern"], r"\bvor\s+(?P<n>\d+)\s+(?P<unit>min(?:uten?)?|stunden?|tag(?:en?)?|wochen?|monat(?:en?)?|jahr(?:en?)?)\b"),
                "es" => (SPANISH_MONTHS, ["hoy", "ayer"], r"\bhace\s+(?P<n>\d+)\s+(?P<unit>min(?:utos?)?|horas?|d[ií]as?|semanas?|mes(?:es)?|a[ñn]os?)\b"),
                other => {
                    tracing::warn!(language = other, "Unsupported date language ignored");
                    continue;
                }
            };
            for (name, month) in names {
                months.entry(name.to_string()).or_insert(*month);
            }
            relative_words.extend(words);
            ago_patterns.push(ago);
        }

        if months.is_empty() {
            return Err(HarvestError::ConfigError(format!(
                "No supported date language in {:?} (supported: en, de, es)",
                languages
            )));
        }

        let mut names: Vec<&String> = months.keys().collect();
        names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let month_names = names.iter().map(|n| regex::escape(n)).collect::<Vec<_>>().join("|");

        let mut sources = vec![
            (Pattern::YearFirst, format!(r"\b(?P<year>\d{{4}})[-/](?P<month>\d{{1,2}})[-/](?P<day>\d{{1,2}}){TIME}")),
            (Pattern::Dotted, format!(r"\b(?P<day>\d{{1,2}})\.(?P<month>\d{{1,2}})\.(?P<year>\d{{4}}|\d{{2}})\b{TIME}")),
            (Pattern::Slashed, format!(r"\b(?P<first>\d{{1,2}})/(?P<middle>\d{{1,2}})/(?P<year>\d{{4}}|\d{{2}})\b{TIME}")),
            (
                Pattern::DayMonthName,
                format!(
                    r"\b(?P<day>\d{{1,2}})\.?(?:\s+de\s+|[\s\-]+)(?P<name>{month_names})\b\.?(?:\s+de\s+|[\s\-]+)(?P<year>\d{{4}})\b{TIME}"
                ),
            ),
            (
                Pattern::MonthNameDay,
                format!(
                    r"\b(?P<name>{month_names})\b\.?\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\.?(?:\s*,\s*|\s+)(?P<year>\d{{4}})\b{TIME}"
                ),
            ),
            (Pattern::RelativeDay, format!(r"\b(?P<word>{})\b{TIME}", relative_words.join("|"))),
        ];
        sources.extend(ago_patterns.into_iter().map(|ago| (Pattern::Ago, ago.to_string())));

        let patterns = sources
            .into_iter()
            .map(|(kind, source)| {
                Regex::new(&format!("(?i){}", source))
                    .map(|regex| (kind, regex))
                    .map_err(|e| HarvestError::ConfigError(format!("Invalid date pattern: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let month_first_slashes = languages.first().is_some_and(|l| l == "en");

        Ok(Self { now, month_first_slashes, months, patterns })
    }

    /// The reference time of this recognizer.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Every date mention in `text`, in order of appearance.
    ///
    /// Overlapping mentions are resolved in favour of the earliest, then the
    /// longest one.
    pub fn find_dates(&self, text: &str) -> Vec<DateMatch> {
        let mut found: Vec<(usize, usize, DateMatch)> = Vec::new();
        for (kind, regex) in &self.patterns {
            for caps in regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if let Some(date) = self.resolve(*kind, &caps) {
                    found.push((whole.start(), whole.end(), DateMatch { surface: whole.as_str().to_string(), date }));
                }
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let cutoff = earliest_plausible_date();
        let mut last_end = 0;
        let mut dates = Vec::new();
        for (start, end, date_match) in found {
            if start < last_end {
                continue;
            }
            last_end = end;
            if date_match.date > cutoff {
                dates.push(date_match);
            }
        }
        dates
    }

    /// Whether `text` mentions at least one date.
    pub fn contains_date(&self, text: &str) -> bool {
        !self.find_dates(text).is_empty()
    }

    /// The most recent date in `text` that does not lie in the future.
    pub fn most_recent(&self, text: &str) -> Option<DateMatch> {
        self.find_dates(text)
            .into_iter()
            .filter(|m| m.date <= self.now)
            .max_by_key(|m| m.date)
    }

    fn resolve(&self, kind: Pattern, caps: &Captures<'_>) -> Option<NaiveDateTime> {
        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

        match kind {
            Pattern::YearFirst | Pattern::Dotted => {
                let year = expand_year(caps.name("year")?.as_str())?;
                at_time(NaiveDate::from_ymd_opt(year, number("month")?, number("day")?)?, caps)
            }
            Pattern::Slashed => {
                let year = expand_year(caps.name("year")?.as_str())?;
                let (first, middle) = (number("first")?, number("middle")?);
                let (month, day) = if first > 12 {
                    (middle, first)
                } else if middle > 12 || self.month_first_slashes {
                    (first, middle)
                } else {
                    (middle, first)
                };
                at_time(NaiveDate::from_ymd_opt(year, month, day)?, caps)
            }
            Pattern::DayMonthName | Pattern::MonthNameDay => {
                let year = expand_year(caps.name("year")?.as_str())?;
                let month = *self.months.get(&caps.name("name")?.as_str().to_lowercase())?;
                at_time(NaiveDate::from_ymd_opt(year, month, number("day")?)?, caps)
            }
            Pattern::RelativeDay => {
                let word = caps.name("word")?.as_str().to_lowercase();
                let days_back = match word.as_str() {
                    "yesterday" | "gestern" | "ayer" => 1,
                    _ => 0,
                };
                let day = self.now - Duration::days(days_back);
                if caps.name("hour").is_some() {
                    at_time(day.date(), caps)
                } else {
                    Some(day)
                }
            }
            Pattern::Ago => {
                let n = i64::from(number("n")?);
                let delta = match unit_of(caps.name("unit")?.as_str())? {
                    Unit::Minutes => Duration::try_minutes(n),
                    Unit::Hours => Duration::try_hours(n),
                    Unit::Days => Duration::try_days(n),
                    Unit::Weeks => Duration::try_weeks(n),
                    Unit::Months => Duration::try_days(30 * n),
                    Unit::Years => Duration::try_days(365 * n),
                }?;
                self.now.checked_sub_signed(delta)
            }
        }
    }
}

/// Parses a machine-readable timestamp such as the `datetime` attribute of
/// `<time>`: RFC 3339 first, then common ISO variants and plain dates.
pub fn parse_datetime_attr(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"];
    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn earliest_plausible_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1993, 4, 30)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Two-digit years below 70 belong to this century.
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match (raw.len(), year) {
        (2, y) if y < 70 => 2000 + y,
        (2, y) => 1900 + y,
        (_, y) => y,
    })
}

fn at_time(date: NaiveDate, caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let Some(hour) = caps.name("hour") else {
        return Some(date.and_time(NaiveTime::MIN));
    };
    let mut hour: u32 = hour.as_str().parse().ok()?;
    let minute: u32 = caps.name("minute")?.as_str().parse().ok()?;
    let second: u32 = caps.name("second").map_or(Some(0), |s| s.as_str().parse().ok())?;

    if let Some(ampm) = caps.name("ampm") {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = ampm.as_str().eq_ignore_ascii_case("p");
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
    }

    NaiveTime::from_hms_opt(hour, minute, second).map(|time| date.and_time(time))
}

fn unit_of(raw: &str) -> Option<Unit> {
    let unit = raw.to_lowercase();
    let unit = unit.as_str();
    if unit.starts_with("min") {
        Some(Unit::Minutes)
    } else if unit.starts_with("hour") || unit.starts_with("stunde") || unit.starts_with("hora") {
        Some(Unit::Hours)
    } else if unit.starts_with("day") || unit.starts_with("tag") || unit.starts_with("dí") || unit.starts_with("dia") {
        Some(Unit::Days)
    } else if unit.starts_with("week") || unit.starts_with("woche") || unit.starts_with("semana") {
        Some(Unit::Weeks)
    } else if unit.starts_with("month") || unit.starts_with("monat") || unit.starts_with("mes") {
        Some(Unit::Months)
    } else if unit.starts_with("year") || unit.starts_with("jahr") || unit.starts_with("añ") || unit.starts_with("ano") {
        Some(Unit::Years)
    } else {
        None
    }
}
