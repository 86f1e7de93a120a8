use crate::domain::models::{Language, PomodoroSettings};
use crate::domain::session::RatingPolicy;
use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

const APP_JSON: &str = "app.json";
const SESSION_JSON: &str = "session.json";
const DEFAULT_COMPLETION_DELAY_MS: u64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct AppFile {
    schema: u8,
    app_name: String,
    timezone: String,
    language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    schema: u8,
    #[serde(default)]
    pomodoro: PomodoroSettings,
    #[serde(default = "default_true")]
    require_rating: bool,
    #[serde(default = "default_true")]
    rating_prompt: bool,
    #[serde(default = "default_completion_delay_ms")]
    completion_delay_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_completion_delay_ms() -> u64 {
    DEFAULT_COMPLETION_DELAY_MS
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub app_name: String,
    pub timezone: Tz,
    pub language: Language,
    pub pomodoro: PomodoroSettings,
    pub rating_policy: RatingPolicy,
    pub completion_delay: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "Focus".to_string(),
            timezone: Tz::UTC,
            language: Language::default(),
            pomodoro: PomodoroSettings::default(),
            rating_policy: RatingPolicy::default(),
            completion_delay: Duration::from_millis(DEFAULT_COMPLETION_DELAY_MS),
        }
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "Focus",
                "timezone": "UTC",
                "language": "ko"
            }),
        ),
        (
            SESSION_JSON,
            serde_json::json!({
                "schema": 1,
                "pomodoro": {
                    "focusMinutes": 25,
                    "shortBreakMinutes": 5,
                    "longBreakMinutes": 15,
                    "roundsPerCycle": 4
                },
                "requireRating": true,
                "ratingPrompt": true,
                "completionDelayMs": DEFAULT_COMPLETION_DELAY_MS
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_settings(config_dir: &Path) -> Result<AppSettings, InfraError> {
    let app: AppFile = serde_json::from_value(read_config(&config_dir.join(APP_JSON))?)?;
    let session: SessionFile =
        serde_json::from_value(read_config(&config_dir.join(SESSION_JSON))?)?;

    let timezone = app.timezone.trim().parse::<Tz>().map_err(|error| {
        InfraError::InvalidConfig(format!("invalid timezone '{}': {error}", app.timezone))
    })?;
    let language = app
        .language
        .parse::<Language>()
        .map_err(InfraError::InvalidConfig)?;

    Ok(AppSettings {
        app_name: app.app_name,
        timezone,
        language,
        pomodoro: session.pomodoro.normalized(),
        rating_policy: RatingPolicy {
            require_rating: session.require_rating,
            rating_prompt: session.rating_prompt,
        },
        completion_delay: Duration::from_millis(session.completion_delay_ms),
    })
}
