mod common;

use common::{SESSIONS_JSON, TestEnvironment, path_str, session_ids, stdout_json};

fn sessions_args<'a>(input: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "stats", "--input", input, "--view", "sessions", "--format", "json",
    ];
    args.extend_from_slice(extra);
    args
}

#[test]
fn sessions_default_to_most_recent_first() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(path_str(&input), &[])));
    assert_eq!(json["view"], "sessions");
    assert_eq!(
        session_ids(&json),
        vec![
            "s-night-far",
            "s-no-targets",
            "s-day-mid",
            "s-day-mid-effort",
            "s-legacy"
        ]
    );
    assert_eq!(json["result"]["total_sessions"], 5);
}

#[test]
fn best_sort_prefers_effort_on_equal_hit_percentage() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(
        path_str(&input),
        &["--distance", "300-600", "--sort", "best"],
    )));
    assert_eq!(session_ids(&json), vec!["s-day-mid-effort", "s-day-mid"]);
    assert_eq!(json["query"]["filter"]["distance"], "300-600");
    assert_eq!(json["query"]["filter"]["sortOrder"], "best");
}

#[test]
fn distance_filter_drops_sessions_without_distance_data() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(path_str(&input), &["--distance", "0-300"])));
    assert!(session_ids(&json).is_empty());
    assert_eq!(json["result"]["total_sessions"], 0);

    let json = stdout_json(&env.run(&sessions_args(path_str(&input), &["--distance", "900+"])));
    assert_eq!(session_ids(&json), vec!["s-legacy"]);
}

#[test]
fn day_night_filter_matches_exactly() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(
        path_str(&input),
        &["--day-night", "day", "--sort", "best"],
    )));
    assert_eq!(
        session_ids(&json),
        vec!["s-day-mid-effort", "s-day-mid", "s-no-targets"]
    );

    let json = stdout_json(&env.run(&sessions_args(path_str(&input), &["--day-night", "night"])));
    assert_eq!(session_ids(&json), vec!["s-night-far"]);
}

#[test]
fn effort_filter_skips_sessions_with_unknown_effort() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(path_str(&input), &["--effort", "false"])));
    assert_eq!(session_ids(&json), vec!["s-day-mid"]);
}

#[test]
fn participated_filters_by_user_id() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(
        path_str(&input),
        &["--participated", "--user", "u-ben"],
    )));
    assert_eq!(session_ids(&json), vec!["s-day-mid-effort"]);

    let json = stdout_json(&env.run(&sessions_args(
        path_str(&input),
        &["--participated", "--user", "u-ana"],
    )));
    assert_eq!(session_ids(&json), vec!["s-night-far"]);
}

#[test]
fn participated_without_user_fails() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let output = env.run(&sessions_args(path_str(&input), &["--participated"]));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--participated"), "stderr: {stderr}");
}

#[test]
fn time_range_is_half_open() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&sessions_args(
        path_str(&input),
        &[
            "--since",
            "2024-03-02T00:00:00Z",
            "--until",
            "2024-03-04T00:00:00Z",
        ],
    )));
    assert_eq!(session_ids(&json), vec!["s-no-targets", "s-day-mid"]);
}

#[test]
fn summary_reports_mean_of_known_hit_percentages() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&[
        "stats",
        "--input",
        path_str(&input),
        "--format",
        "json",
    ]));
    assert_eq!(json["view"], "summary");
    let stats = &json["result"]["stats"];
    assert_eq!(stats["sessions"], 5);
    assert_eq!(stats["known_hit_sessions"], 4);
    assert_eq!(stats["effort_sessions"], 2);
    assert_eq!(stats["day_sessions"], 3);
    assert_eq!(stats["night_sessions"], 1);
    assert_eq!(stats["unknown_period_sessions"], 1);
    assert_eq!(stats["shots_known"], 40);
    let mean = stats["mean_hit_percentage"].as_f64().expect("mean");
    assert!((mean - 69.875).abs() < 1e-9);
}

#[test]
fn distance_view_buckets_by_closest_target() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&[
        "stats",
        "--input",
        path_str(&input),
        "--view",
        "distance",
        "--format",
        "json",
    ]));
    let buckets = json["result"]["buckets"].as_array().expect("buckets");
    let counts: Vec<(String, u64)> = buckets
        .iter()
        .map(|b| {
            (
                b["bucket"].as_str().expect("bucket").to_string(),
                b["stats"]["sessions"].as_u64().expect("sessions"),
            )
        })
        .collect();
    assert_eq!(
        counts,
        vec![
            ("0-300".to_string(), 0),
            ("300-600".to_string(), 2),
            ("600-900".to_string(), 1),
            ("900+".to_string(), 1),
        ]
    );
    assert_eq!(json["result"]["no_distance_sessions"], 1);
}

#[test]
fn trend_view_covers_every_dated_session() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&[
        "stats",
        "--input",
        path_str(&input),
        "--view",
        "trend",
        "--group-by",
        "month",
        "--format",
        "json",
    ]));
    assert_eq!(json["result"]["group_by"], "month");
    assert_eq!(json["result"]["undated_sessions"], 0);
    let total: u64 = json["result"]["buckets"]
        .as_array()
        .expect("buckets")
        .iter()
        .map(|b| b["stats"]["sessions"].as_u64().expect("sessions"))
        .sum();
    assert_eq!(total, 5);
}

#[test]
fn session_view_shows_detail_or_fails_for_unknown_id() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let json = stdout_json(&env.run(&[
        "stats",
        "--input",
        path_str(&input),
        "--view",
        "session",
        "--id",
        "s-legacy",
        "--format",
        "json",
    ]));
    assert_eq!(json["result"]["session"]["id"], "s-legacy");
    assert_eq!(json["result"]["max_distance_m"].as_f64(), Some(1000.0));

    let output = env.run(&[
        "stats",
        "--input",
        path_str(&input),
        "--view",
        "session",
        "--id",
        "missing",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No session with id missing"), "stderr: {stderr}");
}

#[test]
fn reads_backend_envelope_from_stdin() {
    let env = TestEnvironment::new();
    let envelope = format!(r#"{{"data": {SESSIONS_JSON}, "error": null}}"#);

    let output = env.run_with_stdin(
        &["stats", "--view", "sessions", "--format", "json", "--limit", "2"],
        &envelope,
    );
    let json = stdout_json(&output);
    assert_eq!(json["source"], "stdin");
    assert_eq!(json["result"]["total_sessions"], 5);
    assert_eq!(session_ids(&json), vec!["s-night-far", "s-no-targets"]);
}

#[test]
fn malformed_document_is_reported() {
    let env = TestEnvironment::new();
    let input = env.write_sessions("{\"data\": 12}");

    let output = env.run(&["stats", "--input", path_str(&input)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not read sessions"), "stderr: {stderr}");
}

#[test]
fn table_output_lists_sessions_without_ansi() {
    let env = TestEnvironment::new();
    let input = env.write_sessions(SESSIONS_JSON);

    let output = env.run(&[
        "stats",
        "--input",
        path_str(&input),
        "--view",
        "sessions",
        "--sort",
        "best",
    ]);
    common::assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("s-day-mid-effort"));
    assert!(stdout.contains("Night qualification"));
    assert!(stdout.contains("Sessions (total)"));
    assert!(!stdout.contains('\u{1b}'));
}
