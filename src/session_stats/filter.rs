//! Derives the filtered, ordered session list shown on the statistics page.
//!
//! Everything here is pure: the input slice is never touched and the same
//! arguments always produce the same output.

use crate::session_stats::model::SessionStat;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DayNightFilter {
    #[default]
    All,
    Day,
    Night,
}

impl From<&str> for DayNightFilter {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "day" => Self::Day,
            "night" => Self::Night,
            _ => Self::All,
        }
    }
}

impl DayNightFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffortFilter {
    #[default]
    All,
    #[value(name = "true")]
    Effort,
    #[value(name = "false")]
    NoEffort,
}

impl From<&str> for EffortFilter {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "true" => Self::Effort,
            "false" => Self::NoEffort,
            _ => Self::All,
        }
    }
}

impl EffortFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Effort => "true",
            Self::NoEffort => "false",
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Effort => Some(true),
            Self::NoEffort => Some(false),
        }
    }
}

/// Distance buckets, each half-open: lower bound inclusive, upper exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistanceFilter {
    #[default]
    All,
    #[value(name = "0-300")]
    Short,
    #[value(name = "300-600")]
    Medium,
    #[value(name = "600-900")]
    Long,
    #[value(name = "900+")]
    Extreme,
}

impl From<&str> for DistanceFilter {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "0-300" => Self::Short,
            "300-600" => Self::Medium,
            "600-900" => Self::Long,
            "900+" => Self::Extreme,
            _ => Self::All,
        }
    }
}

impl DistanceFilter {
    pub const BUCKETS: [DistanceFilter; 4] = [Self::Short, Self::Medium, Self::Long, Self::Extreme];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Short => "0-300",
            Self::Medium => "300-600",
            Self::Long => "600-900",
            Self::Extreme => "900+",
        }
    }

    /// `(lower, upper)` bounds in meters; `None` for the unbounded `All`.
    pub fn bounds(self) -> Option<(f64, Option<f64>)> {
        match self {
            Self::All => None,
            Self::Short => Some((0.0, Some(300.0))),
            Self::Medium => Some((300.0, Some(600.0))),
            Self::Long => Some((600.0, Some(900.0))),
            Self::Extreme => Some((900.0, None)),
        }
    }

    pub fn contains(self, distance_m: f64) -> bool {
        match self.bounds() {
            None => true,
            Some((lower, upper)) => {
                distance_m >= lower && upper.is_none_or(|upper| distance_m < upper)
            }
        }
    }

    /// The bucket a distance falls into, if any.
    pub fn bucket_for(distance_m: f64) -> Option<Self> {
        Self::BUCKETS
            .into_iter()
            .find(|bucket| bucket.contains(distance_m))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortOrder {
    #[default]
    Recent,
    Best,
}

impl From<&str> for SortOrder {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "best" => Self::Best,
            _ => Self::Recent,
        }
    }
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Best => "best",
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<String> for $ty {
                fn from(raw: String) -> Self {
                    Self::from(raw.as_str())
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.as_str().to_string()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

string_conversions!(DayNightFilter, EffortFilter, DistanceFilter, SortOrder);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    pub day_night: DayNightFilter,
    pub effort: EffortFilter,
    pub distance: DistanceFilter,
    /// Restrict to sessions the current user took part in. Applied by the
    /// session source, not by [`filter_and_sort`].
    pub participated: bool,
    pub sort_order: SortOrder,
}

/// Smallest known target distance across `target_stats` and legacy `targets`.
pub fn min_distance(session: &SessionStat) -> Option<f64> {
    session.distances().reduce(f64::min)
}

/// Largest known target distance across `target_stats` and legacy `targets`.
pub fn max_distance(session: &SessionStat) -> Option<f64> {
    session.distances().reduce(f64::max)
}

/// Applies the distance filter, then sorts.
///
/// A session without any distance data is dropped whenever a distance bucket
/// is selected: it cannot be placed in a bucket. The day/night selection is
/// left to the session source, which matches `day_period` exactly.
pub fn filter_and_sort(sessions: &[SessionStat], config: &FilterConfig) -> Vec<SessionStat> {
    let mut out: Vec<SessionStat> = sessions
        .iter()
        .filter(|session| match config.distance {
            DistanceFilter::All => true,
            bucket => min_distance(session).is_some_and(|min| bucket.contains(min)),
        })
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep their input order.
    match config.sort_order {
        SortOrder::Recent => out.sort_by(compare_recent),
        SortOrder::Best => out.sort_by(compare_best),
    }

    out
}

fn compare_recent(a: &SessionStat, b: &SessionStat) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_best(a: &SessionStat, b: &SessionStat) -> Ordering {
    sort_key(b.hit_percentage())
        .total_cmp(&sort_key(a.hit_percentage()))
        .then_with(|| b.is_effort().cmp(&a.is_effort()))
        .then_with(|| sort_key(max_distance(b)).total_cmp(&sort_key(max_distance(a))))
}

// Missing values rank as zero; -0.0 is folded into 0.0 so `total_cmp` sees a tie.
fn sort_key(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => 0.0,
    }
}
