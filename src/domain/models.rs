use crate::domain::error::DomainError;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

pub const MAX_RATING: u8 = 5;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond-timestamp id, bumped past the previous one when two are
/// minted within the same millisecond.
pub fn next_id() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: i64,
    pub date: String,
    pub name: String,
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    pub rating: u8,
}

impl SessionRecord {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "session.name")?;
        validate_non_empty(&self.date, "session.date")?;
        if self.rating > MAX_RATING {
            return Err(format!("session.rating must be <= {MAX_RATING}"));
        }
        Ok(())
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Timer,
    Stopwatch,
    Pomodoro,
    Todo,
    Planner,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Stopwatch => "stopwatch",
            Self::Pomodoro => "pomodoro",
            Self::Todo => "todo",
            Self::Planner => "planner",
        }
    }

    /// Modes whose active counter runs down rather than up.
    pub fn counts_down(self) -> bool {
        matches!(self, Self::Timer | Self::Pomodoro)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "timer" => Ok(Self::Timer),
            "stopwatch" => Ok(Self::Stopwatch),
            "pomodoro" => Ok(Self::Pomodoro),
            "todo" => Ok(Self::Todo),
            "planner" => Ok(Self::Planner),
            other => Err(format!("unsupported mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Running,
    Paused,
    /// The countdown hit zero and the completion transition is pending.
    Expired,
    AwaitingRating,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Expired => "expired",
            Self::AwaitingRating => "awaiting_rating",
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PomodoroPhase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl PomodoroPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short-break",
            Self::LongBreak => "long-break",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub rounds_per_cycle: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            rounds_per_cycle: 4,
        }
    }
}

impl PomodoroSettings {
    /// Zero fields fall back to the defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let or_default = |value: u32, fallback: u32| if value == 0 { fallback } else { value };
        Self {
            focus_minutes: or_default(self.focus_minutes, defaults.focus_minutes),
            short_break_minutes: or_default(self.short_break_minutes, defaults.short_break_minutes),
            long_break_minutes: or_default(self.long_break_minutes, defaults.long_break_minutes),
            rounds_per_cycle: or_default(self.rounds_per_cycle, defaults.rounds_per_cycle),
        }
    }

    pub fn phase_seconds(&self, phase: PomodoroPhase) -> u64 {
        let minutes = match phase {
            PomodoroPhase::Focus => self.focus_minutes,
            PomodoroPhase::ShortBreak => self.short_break_minutes,
            PomodoroPhase::LongBreak => self.long_break_minutes,
        };
        u64::from(minutes) * 60
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: i64,
    pub subject: String,
    pub day: Weekday,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub id: i64,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    #[default]
    Ko,
}

impl Language {
    pub fn default_session_name(self) -> &'static str {
        match self {
            Self::En => "Focus Session",
            Self::Ko => "집중 세션",
        }
    }

    /// Calendar date the way each locale writes it (`en-US` / `ko-KR`).
    pub fn format_date(self, date: NaiveDate) -> String {
        match self {
            Self::En => format!("{}/{}/{}", date.month(), date.day(), date.year()),
            Self::Ko => format!("{}. {}. {}.", date.year(), date.month(), date.day()),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Self::En),
            "ko" | "ko-kr" => Ok(Self::Ko),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// `1h 2m 3s`, or `2m 3s` under an hour.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// `HH:MM:SS`, or `MM:SS` under an hour.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

pub(crate) fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_hhmm(value: &str, field_name: &'static str) -> Result<(), DomainError> {
    let invalid = || DomainError::InvalidTime {
        field: field_name,
        value: value.to_string(),
    };
    let mut split = value.split(':');
    let (Some(hour_str), Some(minute_str), None) = (split.next(), split.next(), split.next())
    else {
        return Err(invalid());
    };
    if hour_str.len() != 2 || minute_str.len() != 2 {
        return Err(invalid());
    }

    let hour = hour_str.parse::<u8>().map_err(|_| invalid())?;
    let minute = minute_str.parse::<u8>().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(())
}

pub fn parse_weekday(value: &str) -> Result<Weekday, DomainError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Ok(Weekday::Mon),
        "tuesday" | "tue" => Ok(Weekday::Tue),
        "wednesday" | "wed" => Ok(Weekday::Wed),
        "thursday" | "thu" => Ok(Weekday::Thu),
        "friday" | "fri" => Ok(Weekday::Fri),
        "saturday" | "sat" => Ok(Weekday::Sat),
        "sunday" | "sun" => Ok(Weekday::Sun),
        other => Err(DomainError::InvalidDay(other.to_string())),
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
