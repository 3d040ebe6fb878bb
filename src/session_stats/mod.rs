pub mod aggregate;
pub mod command;
pub mod filter;
pub mod model;
pub mod query;
pub mod render;
pub mod source;

pub use aggregate::{
    DistanceBucketStats, DistanceView, HitStats, SessionDetailView, SessionsView, StatsBucket,
    SummaryView, TrendView, build_distance_view, build_session_detail_view, build_sessions_view,
    build_summary_view, build_trend_view,
};
pub use filter::{
    DayNightFilter, DistanceFilter, EffortFilter, FilterConfig, SortOrder, filter_and_sort,
    max_distance, min_distance,
};
pub use model::{DayPeriod, Engagement, SessionId, SessionStat, Target};
pub use query::{
    ColorMode, FilterArgs, GroupBy, OutputFormat, StatsCliArgs, StatsQuery, TimeRange,
    TimeRangeArgs, TimeRangeMode, ViewKind, parse_time_range, resolve_filter_config,
    validate_stats_cli_args,
};
pub use render::{
    RenderOptions, StatsJsonOutput, StatsViewResult, render_stats_json, render_stats_table,
};
pub use source::{JsonFileSource, SessionSource, SourceQuery, parse_sessions_document};
