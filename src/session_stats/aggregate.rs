use crate::session_stats::filter::{DistanceFilter, min_distance};
use crate::session_stats::model::{DayPeriod, SessionId, SessionStat};
use crate::session_stats::query::GroupBy;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitStats {
    pub sessions: usize,
    pub known_hit_sessions: usize,
    /// Mean of the known `overall_hit_percentage` values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_hit_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_hit_percentage: Option<f64>,
    pub effort_sessions: usize,
    pub day_sessions: usize,
    pub night_sessions: usize,
    pub unknown_period_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shots_known: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits_known: Option<u64>,
}

#[derive(Default)]
struct HitStatsAccum {
    sessions: usize,
    hit_sum: f64,
    hit_count: usize,
    hit_best: Option<f64>,
    effort: usize,
    day: usize,
    night: usize,
    unknown_period: usize,
    shots_sum: u64,
    shots_any: bool,
    hits_sum: u64,
    hits_any: bool,
}

impl HitStatsAccum {
    fn add(&mut self, session: &SessionStat) {
        self.sessions += 1;
        if let Some(hit) = session.hit_percentage() {
            self.hit_sum += hit;
            self.hit_count += 1;
            self.hit_best = Some(self.hit_best.map_or(hit, |best| best.max(hit)));
        }
        if session.is_effort() {
            self.effort += 1;
        }
        match session.day_period {
            Some(DayPeriod::Day) => self.day += 1,
            Some(DayPeriod::Night) => self.night += 1,
            None => self.unknown_period += 1,
        }
        if let Some(v) = session.total_shots {
            self.shots_any = true;
            self.shots_sum = self.shots_sum.saturating_add(v);
        }
        if let Some(v) = session.total_hits {
            self.hits_any = true;
            self.hits_sum = self.hits_sum.saturating_add(v);
        }
    }

    fn build(self) -> HitStats {
        HitStats {
            sessions: self.sessions,
            known_hit_sessions: self.hit_count,
            mean_hit_percentage: (self.hit_count > 0).then(|| self.hit_sum / self.hit_count as f64),
            best_hit_percentage: self.hit_best,
            effort_sessions: self.effort,
            day_sessions: self.day,
            night_sessions: self.night,
            unknown_period_sessions: self.unknown_period,
            shots_known: self.shots_any.then_some(self.shots_sum),
            hits_known: self.hits_any.then_some(self.hits_sum),
        }
    }
}

fn hit_stats<'a>(sessions: impl IntoIterator<Item = &'a SessionStat>) -> HitStats {
    let mut accum = HitStatsAccum::default();
    for session in sessions {
        accum.add(session);
    }
    accum.build()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub stats: HitStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsBucket {
    pub label: String,
    pub start_local: String,
    pub end_local_exclusive: String,
    pub stats: HitStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendView {
    pub group_by: GroupBy,
    pub buckets: Vec<StatsBucket>,
    pub undated_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBucketStats {
    pub bucket: DistanceFilter,
    pub stats: HitStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceView {
    pub buckets: Vec<DistanceBucketStats>,
    pub no_distance_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsView {
    pub total_sessions: usize,
    pub returned_sessions: usize,
    pub sessions: Vec<SessionStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetailView {
    pub session: SessionStat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_m: Option<f64>,
}

pub fn build_summary_view(sessions: &[SessionStat]) -> SummaryView {
    SummaryView {
        stats: hit_stats(sessions),
        latest_created_at: sessions.iter().filter_map(|s| s.created_at).max(),
    }
}

pub fn build_trend_view(sessions: &[SessionStat], group_by: GroupBy) -> TrendView {
    let mut buckets: BTreeMap<NaiveDate, Vec<&SessionStat>> = BTreeMap::new();
    let mut undated_sessions = 0;

    for session in sessions {
        let Some(created_at) = session.created_at else {
            undated_sessions += 1;
            continue;
        };
        let key = bucket_start_date_local(created_at, group_by);
        buckets.entry(key).or_default().push(session);
    }

    let buckets = buckets
        .into_iter()
        .map(|(start, sessions)| {
            let (label, end_exclusive) = bucket_label_and_end_exclusive(start, group_by);
            StatsBucket {
                label,
                start_local: start.format("%Y-%m-%d").to_string(),
                end_local_exclusive: end_exclusive.format("%Y-%m-%d").to_string(),
                stats: hit_stats(sessions),
            }
        })
        .collect();

    TrendView {
        group_by,
        buckets,
        undated_sessions,
    }
}

/// Groups sessions by the bucket of their closest target.
pub fn build_distance_view(sessions: &[SessionStat]) -> DistanceView {
    let mut grouped: BTreeMap<usize, Vec<&SessionStat>> = BTreeMap::new();
    let mut no_distance_sessions = 0;

    for session in sessions {
        let bucket = min_distance(session).and_then(DistanceFilter::bucket_for);
        match bucket.and_then(|b| DistanceFilter::BUCKETS.iter().position(|x| *x == b)) {
            Some(index) => grouped.entry(index).or_default().push(session),
            None => no_distance_sessions += 1,
        }
    }

    let buckets = DistanceFilter::BUCKETS
        .iter()
        .enumerate()
        .map(|(index, bucket)| DistanceBucketStats {
            bucket: *bucket,
            stats: hit_stats(grouped.remove(&index).unwrap_or_default()),
        })
        .collect();

    DistanceView {
        buckets,
        no_distance_sessions,
    }
}

fn bucket_start_date_local(created_at: DateTime<Utc>, group_by: GroupBy) -> NaiveDate {
    let local_date = created_at.with_timezone(&Local).date_naive();
    match group_by {
        GroupBy::Day => local_date,
        GroupBy::Week => {
            let days_from_monday = i64::from(local_date.weekday().num_days_from_monday());
            local_date - Duration::days(days_from_monday)
        }
        GroupBy::Month => local_date.with_day(1).unwrap_or(local_date),
    }
}

fn bucket_label_and_end_exclusive(start: NaiveDate, group_by: GroupBy) -> (String, NaiveDate) {
    match group_by {
        GroupBy::Day => (
            start.format("%Y-%m-%d").to_string(),
            start + Duration::days(1),
        ),
        GroupBy::Week => (
            start.format("%Y-%m-%d").to_string(),
            start + Duration::days(7),
        ),
        GroupBy::Month => {
            let label = format!("{:04}-{:02}", start.year(), start.month());
            let end = start
                .checked_add_months(chrono::Months::new(1))
                .unwrap_or(start);
            (label, end)
        }
    }
}

/// Keeps the caller's order (already sorted) and truncates; `limit == 0` keeps all.
pub fn build_sessions_view(sessions: &[SessionStat], limit: usize) -> SessionsView {
    let total_sessions = sessions.len();
    let sessions: Vec<SessionStat> = if limit == 0 {
        sessions.to_vec()
    } else {
        sessions.iter().take(limit).cloned().collect()
    };

    SessionsView {
        total_sessions,
        returned_sessions: sessions.len(),
        sessions,
    }
}

pub fn build_session_detail_view(
    sessions: &[SessionStat],
    id: &SessionId,
) -> Option<SessionDetailView> {
    sessions
        .iter()
        .find(|session| &session.id == id)
        .map(|session| SessionDetailView {
            min_distance_m: min_distance(session),
            max_distance_m: crate::session_stats::filter::max_distance(session),
            session: session.clone(),
        })
}
