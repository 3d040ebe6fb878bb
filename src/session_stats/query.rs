use crate::error::RangelogError;
use crate::session_stats::filter::{
    DayNightFilter, DistanceFilter, EffortFilter, FilterConfig, SortOrder,
};
use crate::session_stats::model::SessionId;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    #[default]
    Summary,
    Trend,
    Distance,
    Sessions,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeRangeMode {
    All,
    SinceUntil,
    LastDays,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub mode: TimeRangeMode,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub last_days: Option<u32>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self {
            mode: TimeRangeMode::All,
            since: None,
            until: None,
            last_days: None,
        }
    }

    /// `since` is inclusive, `until` exclusive. Undated sessions only match
    /// the unbounded range.
    pub fn contains(&self, ts: Option<DateTime<Utc>>) -> bool {
        if self.mode == TimeRangeMode::All {
            return true;
        }
        let Some(ts) = ts else {
            return self.since.is_none() && self.until.is_none();
        };
        if let Some(since) = self.since
            && ts < since
        {
            return false;
        }
        if let Some(until) = self.until
            && ts >= until
        {
            return false;
        }
        true
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TimeRangeArgs {
    /// Include sessions created at or after this time (RFC3339 or YYYY-MM-DD local).
    #[arg(long)]
    pub since: Option<String>,
    /// Include sessions created before this time (RFC3339 or YYYY-MM-DD local; date-only is exclusive next-day start).
    #[arg(long)]
    pub until: Option<String>,
    /// Convenience range: last <Nd> days (mutually exclusive with --since/--until).
    #[arg(long)]
    pub last: Option<String>,
}

/// Filter flags. Unset flags fall back to the `[defaults]` table of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only day or night sessions.
    #[arg(long, value_enum)]
    pub day_night: Option<DayNightFilter>,

    /// Only sessions with (true) or without (false) the effort flag.
    #[arg(long, value_enum)]
    pub effort: Option<EffortFilter>,

    /// Only sessions whose closest target falls in this distance bucket (meters).
    #[arg(long, value_enum)]
    pub distance: Option<DistanceFilter>,

    /// Only sessions the current user took part in (needs --user or `user_id` in config).
    #[arg(long)]
    pub participated: bool,

    /// User id used by --participated.
    #[arg(long)]
    pub user: Option<String>,

    /// Sort order for the sessions view.
    #[arg(long = "sort", value_enum)]
    pub sort_order: Option<SortOrder>,
}

#[derive(Args, Debug, Clone)]
pub struct StatsCliArgs {
    /// Which report view to render.
    #[arg(long, value_enum, default_value_t = ViewKind::Summary)]
    pub view: ViewKind,

    /// Grouping granularity for the trend view.
    #[arg(long, value_enum, default_value_t = GroupBy::Day)]
    pub group_by: GroupBy,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub range: TimeRangeArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// When to colorize table output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Limit number of sessions in the sessions view (default from config, else 200; 0 = unlimited).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Session id for the session view.
    #[arg(long)]
    pub id: Option<String>,
}

pub fn validate_stats_cli_args(args: &StatsCliArgs) -> Result<()> {
    if args.view == ViewKind::Session && args.id.is_none() {
        return Err(RangelogError::InvalidArgument {
            message: "--id is required when --view session".to_string(),
        }
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsQuery {
    pub view: ViewKind,
    pub group_by: GroupBy,
    pub time_range: TimeRange,
    pub filter: FilterConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SessionId>,
}

enum BoundKind {
    Since,
    Until,
}

pub fn parse_time_range(args: &TimeRangeArgs, now_utc: DateTime<Utc>) -> Result<TimeRange> {
    if args.last.is_some() && (args.since.is_some() || args.until.is_some()) {
        bail!(RangelogError::InvalidArgument {
            message: "--last is incompatible with --since/--until".to_string(),
        });
    }

    if let Some(raw) = args.last.as_deref() {
        let days = parse_last_days(raw)?;
        let now_local = now_utc.with_timezone(&Local);
        let since_local = now_local - Duration::days(i64::from(days));
        return Ok(TimeRange {
            mode: TimeRangeMode::LastDays,
            since: Some(since_local.with_timezone(&Utc)),
            until: Some(now_local.with_timezone(&Utc)),
            last_days: Some(days),
        });
    }

    let since = args
        .since
        .as_deref()
        .map(|raw| parse_time_bound(raw, BoundKind::Since))
        .transpose()?;
    let until = args
        .until
        .as_deref()
        .map(|raw| parse_time_bound(raw, BoundKind::Until))
        .transpose()?;

    if since.is_none() && until.is_none() {
        return Ok(TimeRange::all());
    }

    Ok(TimeRange {
        mode: TimeRangeMode::SinceUntil,
        since,
        until,
        last_days: None,
    })
}

fn parse_last_days(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let Some(days_str) = trimmed
        .strip_suffix('d')
        .or_else(|| trimmed.strip_suffix('D'))
    else {
        bail!("--last must use the 'd' unit, e.g. 7d");
    };

    let days: u32 = days_str
        .parse()
        .with_context(|| format!("invalid --last value: {raw}"))?;
    if days == 0 {
        bail!("--last must be a positive integer (days)");
    }
    Ok(days)
}

fn parse_time_bound(raw: &str, kind: BoundKind) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid time value: {raw}"))?;
    let date = match kind {
        BoundKind::Since => date,
        BoundKind::Until => date
            .succ_opt()
            .with_context(|| format!("invalid --until date: {raw}"))?,
    };

    let naive = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid midnight for {raw}"))?;

    let local = match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => {
            bail!("local time does not exist for date input: {raw}");
        }
    };

    Ok(local.with_timezone(&Utc))
}

/// Fills unset filter flags from config defaults.
pub fn resolve_filter_config(args: &FilterArgs, defaults: &FilterConfig) -> FilterConfig {
    FilterConfig {
        day_night: args.day_night.unwrap_or(defaults.day_night),
        effort: args.effort.unwrap_or(defaults.effort),
        distance: args.distance.unwrap_or(defaults.distance),
        participated: args.participated || defaults.participated,
        sort_order: args.sort_order.unwrap_or(defaults.sort_order),
    }
}
