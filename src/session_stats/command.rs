use crate::config::Config;
use crate::error::RangelogError;
use crate::session_stats::{
    JsonFileSource, OutputFormat, RenderOptions, SessionId, SessionSource, SourceQuery,
    StatsCliArgs, StatsJsonOutput, StatsQuery, StatsViewResult, ViewKind,
    build_distance_view, build_session_detail_view, build_sessions_view, build_summary_view,
    build_trend_view, filter_and_sort, parse_time_range, render_stats_json, render_stats_table,
    resolve_filter_config, validate_stats_cli_args,
};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// Session export to read (JSON array or `{"data": [...]}`); `-` reads stdin.
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    #[command(flatten)]
    pub stats: StatsCliArgs,
}

pub fn run(args: &StatsArgs, config: &Config) -> Result<()> {
    let source = JsonFileSource::new(&args.input);
    let output = build_output(&source, &args.stats, config)?;

    match args.stats.format {
        OutputFormat::Json => {
            println!("{}", render_stats_json(&output)?);
        }
        OutputFormat::Table => {
            if let StatsViewResult::Sessions(view) = &output.view
                && view.total_sessions == 0
            {
                eprintln!("{}", t!("messages.no_sessions"));
            }
            let table = render_stats_table(
                &output,
                &RenderOptions {
                    color: args.stats.color,
                },
            );
            print!("{table}");
        }
    }

    Ok(())
}

/// Loads, filters, sorts and aggregates; everything except printing.
pub fn build_output(
    source: &dyn SessionSource,
    args: &StatsCliArgs,
    config: &Config,
) -> Result<StatsJsonOutput> {
    validate_stats_cli_args(args)?;

    let filter = resolve_filter_config(&args.filter, &config.defaults.filter());
    let user_id = args.filter.user.clone().or_else(|| config.user_id.clone());
    let time_range = parse_time_range(&args.range, Utc::now())?;

    let query = StatsQuery {
        view: args.view,
        group_by: args.group_by,
        time_range: time_range.clone(),
        filter,
        user_id: user_id.clone(),
        limit: args.limit.unwrap_or_else(|| config.defaults.limit()),
        id: args.id.as_deref().map(SessionId::from),
    };

    let source_query = SourceQuery::from_filter(&filter, user_id.as_deref(), time_range)?;
    let sessions = source.load(&source_query)?;
    let sessions = filter_and_sort(&sessions, &filter);
    tracing::info!(
        sessions = sessions.len(),
        distance = %filter.distance,
        sort = %filter.sort_order,
        "filtered session stats"
    );

    let view = match query.view {
        ViewKind::Summary => StatsViewResult::Summary(build_summary_view(&sessions)),
        ViewKind::Trend => StatsViewResult::Trend(build_trend_view(&sessions, query.group_by)),
        ViewKind::Distance => StatsViewResult::Distance(build_distance_view(&sessions)),
        ViewKind::Sessions => {
            StatsViewResult::Sessions(build_sessions_view(&sessions, query.limit))
        }
        ViewKind::Session => {
            let id = query.id.clone().unwrap_or_default();
            let view = build_session_detail_view(&sessions, &id)
                .ok_or_else(|| RangelogError::SessionNotFound { id: id.to_string() })?;
            StatsViewResult::Session(view)
        }
    };

    Ok(StatsJsonOutput {
        source: source.describe(),
        query,
        view,
    })
}
