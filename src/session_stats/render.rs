use crate::session_stats::aggregate::{
    DistanceView, HitStats, SessionDetailView, SessionsView, SummaryView, TrendView,
};
use crate::session_stats::filter::{FilterConfig, max_distance, min_distance};
use crate::session_stats::model::{DayPeriod, SessionStat};
use crate::session_stats::query::{ColorMode, GroupBy, StatsQuery, TimeRange, TimeRangeMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub color: ColorMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", content = "result", rename_all = "kebab-case")]
pub enum StatsViewResult {
    Summary(SummaryView),
    Trend(TrendView),
    Distance(DistanceView),
    Sessions(SessionsView),
    Session(SessionDetailView),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsJsonOutput {
    pub source: String,
    pub query: StatsQuery,
    #[serde(flatten)]
    pub view: StatsViewResult,
}

pub fn render_stats_json(output: &StatsJsonOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("serialize stats json")
}

pub fn render_stats_table(output: &StatsJsonOutput, options: &RenderOptions) -> String {
    let ansi_enabled = should_enable_ansi(
        options.color,
        stdout_is_tty(),
        std::env::var_os("NO_COLOR").is_some(),
    );

    let mut meta = table_base(ansi_enabled);
    let mut meta_row = |key: &str, value: String| {
        meta.add_row(vec![
            cell_key(key, ansi_enabled),
            Cell::new(sanitize_cell_text(&value)),
        ]);
    };
    meta_row("Source", output.source.clone());
    meta_row("Filters", format_filters(&output.query.filter));
    meta_row("Range", format_time_range(&output.query.time_range));
    meta_row("View", view_label(&output.view).to_string());
    match &output.view {
        StatsViewResult::Sessions(sessions) => {
            meta_row("Sort", output.query.filter.sort_order.to_string());
            meta_row(
                "Sessions (returned)",
                format_count(sessions.returned_sessions),
            );
            meta_row("Sessions (total)", format_count(sessions.total_sessions));
        }
        StatsViewResult::Trend(trend) => {
            meta_row("Group-by", group_by_label(trend.group_by).to_string());
            if trend.undated_sessions > 0 {
                meta_row("Undated sessions", format_count(trend.undated_sessions));
            }
        }
        _ => {}
    }

    let mut out = String::new();
    out.push_str(&meta.to_string());
    out.push_str("\n\n");

    let view_table = match &output.view {
        StatsViewResult::Summary(view) => render_summary_table(view, ansi_enabled),
        StatsViewResult::Trend(view) => render_trend_table(view, ansi_enabled),
        StatsViewResult::Distance(view) => render_distance_table(view, ansi_enabled),
        StatsViewResult::Sessions(view) => render_sessions_table(view, ansi_enabled),
        StatsViewResult::Session(view) => render_session_detail_table(view, ansi_enabled),
    };

    out.push_str(&view_table.to_string());
    out.push('\n');
    out
}

fn stdout_is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

fn should_enable_ansi(color: ColorMode, stdout_is_tty: bool, no_color: bool) -> bool {
    match color {
        ColorMode::Auto => stdout_is_tty && !no_color,
        ColorMode::Always => true,
        ColorMode::Never => false,
    }
}

fn table_base(ansi_enabled: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if ansi_enabled {
        table.enforce_styling();
    }
    table
}

fn cell_key(text: &str, ansi_enabled: bool) -> Cell {
    let mut cell = Cell::new(sanitize_cell_text(text));
    if ansi_enabled {
        cell = cell.fg(Color::Yellow).add_attribute(Attribute::Bold);
    }
    cell
}

fn cell_header(text: &str, ansi_enabled: bool) -> Cell {
    let mut cell = Cell::new(sanitize_cell_text(text));
    if ansi_enabled {
        cell = cell.fg(Color::Cyan).add_attribute(Attribute::Bold);
    }
    cell
}

fn headers(table: &mut Table, names: &[&str], ansi_enabled: bool) {
    table.set_header(
        names
            .iter()
            .map(|name| cell_header(name, ansi_enabled))
            .collect::<Vec<_>>(),
    );
}

fn sanitize_cell_text(raw: &str) -> String {
    raw.chars()
        .map(|ch| match ch {
            '\t' | '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

fn format_count(value: usize) -> String {
    let s = value.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (idx, ch) in s.chars().enumerate() {
        out.push(ch);
        let remaining = s.len() - idx - 1;
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

fn format_opt_u64(value: Option<u64>) -> String {
    value
        .and_then(|v| usize::try_from(v).ok())
        .map(format_count)
        .unwrap_or_else(|| "-".to_string())
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| "-".to_string())
}

fn format_meters(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.0} m"))
        .unwrap_or_else(|| "-".to_string())
}

fn format_effort(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

fn format_period(value: Option<DayPeriod>) -> &'static str {
    value.map(DayPeriod::as_str).unwrap_or("-")
}

fn view_label(view: &StatsViewResult) -> &'static str {
    match view {
        StatsViewResult::Summary(_) => "summary",
        StatsViewResult::Trend(_) => "trend",
        StatsViewResult::Distance(_) => "distance",
        StatsViewResult::Sessions(_) => "sessions",
        StatsViewResult::Session(_) => "session",
    }
}

fn group_by_label(group_by: GroupBy) -> &'static str {
    match group_by {
        GroupBy::Day => "day",
        GroupBy::Week => "week",
        GroupBy::Month => "month",
    }
}

fn format_filters(filter: &FilterConfig) -> String {
    let mut parts = vec![
        format!("day/night={}", filter.day_night),
        format!("effort={}", filter.effort),
        format!("distance={}", filter.distance),
    ];
    if filter.participated {
        parts.push("participated".to_string());
    }
    parts.join(", ")
}

fn render_summary_table(view: &SummaryView, ansi_enabled: bool) -> Table {
    let mut table = table_base(ansi_enabled);
    headers(&mut table, &["Metric", "Value"], ansi_enabled);

    let stats = &view.stats;
    let rows: Vec<(&str, String)> = vec![
        ("Sessions", format_count(stats.sessions)),
        ("Sessions (known hit %)", format_count(stats.known_hit_sessions)),
        ("Mean hit %", format_percent(stats.mean_hit_percentage)),
        ("Best hit %", format_percent(stats.best_hit_percentage)),
        ("Effort sessions", format_count(stats.effort_sessions)),
        ("Day / night / unknown", format_periods(stats)),
        ("Shots (known)", format_opt_u64(stats.shots_known)),
        ("Hits (known)", format_opt_u64(stats.hits_known)),
        (
            "Latest",
            view.latest_created_at
                .map(format_dt_local)
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }

    table
}

fn format_periods(stats: &HitStats) -> String {
    format!(
        "{} / {} / {}",
        format_count(stats.day_sessions),
        format_count(stats.night_sessions),
        format_count(stats.unknown_period_sessions)
    )
}

fn render_trend_table(view: &TrendView, ansi_enabled: bool) -> Table {
    let mut table = table_base(ansi_enabled);
    headers(
        &mut table,
        &["Bucket", "Sessions", "Mean hit %", "Best hit %", "Effort"],
        ansi_enabled,
    );
    for bucket in &view.buckets {
        table.add_row(vec![
            Cell::new(sanitize_cell_text(&bucket.label)),
            Cell::new(format_count(bucket.stats.sessions)),
            Cell::new(format_percent(bucket.stats.mean_hit_percentage)),
            Cell::new(format_percent(bucket.stats.best_hit_percentage)),
            Cell::new(format_count(bucket.stats.effort_sessions)),
        ]);
    }
    table
}

fn render_distance_table(view: &DistanceView, ansi_enabled: bool) -> Table {
    let mut table = table_base(ansi_enabled);
    headers(
        &mut table,
        &["Distance (m)", "Sessions", "Mean hit %", "Best hit %"],
        ansi_enabled,
    );
    for bucket in &view.buckets {
        table.add_row(vec![
            Cell::new(bucket.bucket.as_str()),
            Cell::new(format_count(bucket.stats.sessions)),
            Cell::new(format_percent(bucket.stats.mean_hit_percentage)),
            Cell::new(format_percent(bucket.stats.best_hit_percentage)),
        ]);
    }
    table.add_row(vec![
        Cell::new("no distance"),
        Cell::new(format_count(view.no_distance_sessions)),
        Cell::new("-"),
        Cell::new("-"),
    ]);
    table
}

fn render_sessions_table(view: &SessionsView, ansi_enabled: bool) -> Table {
    let mut table = table_base(ansi_enabled);
    headers(
        &mut table,
        &[
            "Created", "Hit %", "Effort", "Period", "Range", "Id", "Assignment",
        ],
        ansi_enabled,
    );

    for session in &view.sessions {
        table.add_row(vec![
            Cell::new(
                session
                    .created_at
                    .map(format_dt_local)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format_percent(session.hit_percentage())),
            Cell::new(format_effort(session.effort)),
            Cell::new(format_period(session.day_period)),
            Cell::new(format_distance_range(session)),
            Cell::new(sanitize_cell_text(&session.id.to_string())),
            Cell::new(sanitize_cell_text(&truncate(
                session.assignment_name.as_deref().unwrap_or("-"),
                40,
            ))),
        ]);
    }

    table
}

fn format_distance_range(session: &SessionStat) -> String {
    match (min_distance(session), max_distance(session)) {
        (Some(min), Some(max)) if min < max => format!("{min:.0}-{max:.0} m"),
        (Some(min), _) => format_meters(Some(min)),
        _ => "-".to_string(),
    }
}

fn render_session_detail_table(view: &SessionDetailView, ansi_enabled: bool) -> Table {
    let session = &view.session;

    let mut table = table_base(ansi_enabled);
    headers(&mut table, &["Field", "Value"], ansi_enabled);

    let mut row = |key: &str, value: String| {
        table.add_row(vec![Cell::new(key), Cell::new(sanitize_cell_text(&value))]);
    };
    row("Id", session.id.to_string());
    row(
        "Created",
        session
            .created_at
            .map(format_dt_local)
            .unwrap_or_else(|| "-".to_string()),
    );
    row("Period", format_period(session.day_period).to_string());
    row("Effort", format_effort(session.effort).to_string());
    row("Hit %", format_percent(session.hit_percentage()));
    row("Closest target", format_meters(view.min_distance_m));
    row("Farthest target", format_meters(view.max_distance_m));
    row("Targets (logged)", format_opt_u64(session.total_targets));
    row("Shots", format_opt_u64(session.total_shots));
    row("Hits", format_opt_u64(session.total_hits));
    if let Some(name) = &session.assignment_name {
        row("Assignment", name.clone());
    }
    if let Some(training_id) = &session.training_id {
        row("Training", training_id.clone());
    }
    if !session.participants.is_empty() {
        row("Participants", session.participants.join(", "));
    }

    table
}

fn format_time_range(range: &TimeRange) -> String {
    match range.mode {
        TimeRangeMode::All => "all".to_string(),
        TimeRangeMode::LastDays => range
            .last_days
            .map(|days| format!("last {days}d"))
            .unwrap_or_else(|| "last".to_string()),
        TimeRangeMode::SinceUntil => {
            let since = range.since.map(format_dt_local_short);
            let until = range.until.map(format_dt_local_short);
            match (since, until) {
                (Some(since), Some(until)) => format!("since {since} until {until} (exclusive)"),
                (Some(since), None) => format!("since {since}"),
                (None, Some(until)) => format!("until {until} (exclusive)"),
                (None, None) => "all".to_string(),
            }
        }
    }
}

fn format_dt_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn format_dt_local_short(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
