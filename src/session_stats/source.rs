//! Loading session records exported from the hosted backend.
//!
//! The backend answers the statistics page with exact-match filters already
//! applied (`day_period`, `effort`, participation). [`SourceQuery`] reproduces
//! that step so [`crate::session_stats::filter::filter_and_sort`] only has to
//! deal with the derived distance filter and ordering.

use crate::error::RangelogError;
use crate::session_stats::filter::{DayNightFilter, FilterConfig};
use crate::session_stats::model::{DayPeriod, SessionStat};
use crate::session_stats::query::TimeRange;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub day_period: Option<DayPeriod>,
    pub effort: Option<bool>,
    pub participant: Option<String>,
    pub time_range: TimeRange,
}

impl Default for SourceQuery {
    fn default() -> Self {
        Self {
            day_period: None,
            effort: None,
            participant: None,
            time_range: TimeRange::all(),
        }
    }
}

impl SourceQuery {
    /// Builds the backend-side selection from a filter config.
    ///
    /// Fails when `participated` is set but no user id is known.
    pub fn from_filter(
        filter: &FilterConfig,
        user_id: Option<&str>,
        time_range: TimeRange,
    ) -> Result<Self> {
        let day_period = match filter.day_night {
            DayNightFilter::All => None,
            DayNightFilter::Day => Some(DayPeriod::Day),
            DayNightFilter::Night => Some(DayPeriod::Night),
        };

        let participant = if filter.participated {
            let user_id = user_id.ok_or_else(|| RangelogError::InvalidArgument {
                message: t!("errors.participated_needs_user").to_string(),
            })?;
            Some(user_id.to_string())
        } else {
            None
        };

        Ok(Self {
            day_period,
            effort: filter.effort.as_bool(),
            participant,
            time_range,
        })
    }

    pub fn matches(&self, session: &SessionStat) -> bool {
        if let Some(period) = self.day_period
            && session.day_period != Some(period)
        {
            return false;
        }
        if let Some(effort) = self.effort
            && session.effort != Some(effort)
        {
            return false;
        }
        if let Some(user_id) = self.participant.as_deref()
            && !session.has_participant(user_id)
        {
            return false;
        }
        self.time_range.contains(session.created_at)
    }
}

pub trait SessionSource {
    /// Human-readable origin, shown in reports and errors.
    fn describe(&self) -> String;

    fn load(&self, query: &SourceQuery) -> Result<Vec<SessionStat>>;
}

/// Reads a JSON export from a file, or from stdin when the path is `-`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<String> {
        if self.path.as_os_str() == STDIN_PATH {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("read sessions from stdin")?;
            return Ok(raw);
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("read sessions from {}", self.path.display()))
    }
}

impl SessionSource for JsonFileSource {
    fn describe(&self) -> String {
        if self.path.as_os_str() == STDIN_PATH {
            "stdin".to_string()
        } else {
            self.path.display().to_string()
        }
    }

    fn load(&self, query: &SourceQuery) -> Result<Vec<SessionStat>> {
        let raw = self.read_raw()?;
        let sessions = parse_sessions_document(&raw, &self.describe())?;
        let loaded = sessions.len();
        let selected = apply_source_query(sessions, query);
        tracing::debug!(
            source = %self.describe(),
            loaded,
            selected = selected.len(),
            "loaded session stats"
        );
        Ok(selected)
    }
}

/// Accepts a bare array of records or the backend envelope `{"data": [...]}`.
pub fn parse_sessions_document(
    raw: &str,
    source_name: &str,
) -> std::result::Result<Vec<SessionStat>, RangelogError> {
    let document: Value = serde_json::from_str(raw).map_err(|e| RangelogError::InvalidDocument {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(RangelogError::InvalidDocument {
                    source_name: source_name.to_string(),
                    message: "`data` must be an array".to_string(),
                });
            }
        },
        _ => {
            return Err(RangelogError::InvalidDocument {
                source_name: source_name.to_string(),
                message: "expected an array of sessions or an object with `data`".to_string(),
            });
        }
    };

    let mut sessions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::warn!(index, "skipping non-object session entry");
            continue;
        }
        match serde_json::from_value::<SessionStat>(item) {
            Ok(session) => sessions.push(session),
            Err(e) => tracing::warn!(index, error = %e, "skipping unreadable session entry"),
        }
    }
    Ok(sessions)
}

pub fn apply_source_query(sessions: Vec<SessionStat>, query: &SourceQuery) -> Vec<SessionStat> {
    sessions
        .into_iter()
        .filter(|session| query.matches(session))
        .collect()
}
