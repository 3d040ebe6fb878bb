use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Day,
    Night,
}

impl DayPeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

/// One participant's record against a single target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub shots_fired: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub target_hits: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub target_index: Option<u64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub mistakes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub engagements: Vec<Engagement>,
}

/// A single logged training session, as exported by the backend.
///
/// Every field is optional on the wire. Values of the wrong shape are
/// dropped to `None` while deserializing instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStat {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: SessionId,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_day_period")]
    pub day_period: Option<DayPeriod>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub effort: Option<bool>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overall_hit_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_targets")]
    pub target_stats: Option<Vec<Target>>,
    /// Older exports carry distances under this name.
    #[serde(
        default,
        deserialize_with = "lenient_targets",
        skip_serializing_if = "Option::is_none"
    )]
    pub targets: Option<Vec<Target>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub training_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub team_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub squad_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub assignment_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_targets: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_shots: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_hits: Option<u64>,
    #[serde(default, deserialize_with = "lenient_participants")]
    pub participants: Vec<String>,
}

impl SessionStat {
    /// All targets from both `target_stats` and the legacy `targets` list.
    pub fn all_targets(&self) -> impl Iterator<Item = &Target> {
        self.target_stats
            .iter()
            .chain(self.targets.iter())
            .flat_map(|targets| targets.iter())
    }

    /// Finite, non-null target distances in meters.
    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.all_targets()
            .filter_map(|target| target.distance_m)
            .filter(|distance| distance.is_finite())
    }

    pub fn is_effort(&self) -> bool {
        self.effort == Some(true)
    }

    /// Hit percentage if known and finite.
    pub fn hit_percentage(&self) -> Option<f64> {
        self.overall_hit_percentage.filter(|value| value.is_finite())
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
            || self.all_targets().any(|target| {
                target
                    .engagements
                    .iter()
                    .any(|e| e.user_id.as_deref() == Some(user_id))
            })
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SessionId, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(string_from_value)
        .map(SessionId)
        .unwrap_or_default())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_from_value))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
        .map(|n| n as u64))
}

fn lenient_day_period<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DayPeriod>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(DayPeriod::parse))
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn lenient_targets<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Target>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(objects_from_array(items)),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => objects_from_array(items),
        _ => Vec::new(),
    })
}

fn lenient_participants<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| match item {
            // Either a bare id or a participant row carrying `user_id`.
            Value::Object(map) => map.get("user_id").and_then(string_from_value),
            other => string_from_value(other),
        })
        .collect())
}

fn objects_from_array<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Parses RFC 3339 timestamps, falling back to `YYYY-MM-DD` (UTC midnight)
/// and naive `YYYY-MM-DDTHH:MM:SS` values.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
