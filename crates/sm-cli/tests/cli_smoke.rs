use std::io::Write;

use clap::Parser;
use sm_cli::{Cli, CliError, execute_with_config, load_graph};
use sm_common::EngineConfig;
use tempfile::NamedTempFile;

const FIXTURE: &str = include_str!("../../sm-common/tests/fixtures/graph.json");

fn snapshot_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write snapshot");
    file
}

fn cli(file: &NamedTempFile, args: &[&str]) -> Cli {
    let path = file.path().to_str().expect("utf-8 path");
    let mut argv = vec!["sm-match", "--graph", path];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("valid arguments")
}

#[tokio::test]
async fn rank_candidates_prints_bare_results() {
    let file = snapshot_file(FIXTURE);
    let output = execute_with_config(
        cli(&file, &["rank-candidates", "--job", "job-backend", "--limit", "2"]),
        EngineConfig::default(),
    )
    .await
    .expect("ranking succeeds");

    let rows = output.as_array().expect("array output");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["counterpart_id"], "cand-ada");
    assert!(rows[0]["match_percentage"].is_u64());
}

#[tokio::test]
async fn service_flag_wraps_results_in_envelope() {
    let file = snapshot_file(FIXTURE);
    let output = execute_with_config(
        cli(&file, &["--service", "rank-jobs", "--candidate", "cand-ada"]),
        EngineConfig::default(),
    )
    .await
    .expect("ranking succeeds");

    assert_eq!(output["success"], true);
    assert_eq!(output["total"], output["matches"].as_array().map(Vec::len).unwrap_or(0));

    let missing = execute_with_config(
        cli(&file, &["--service", "rank-jobs", "--candidate", "nobody"]),
        EngineConfig::default(),
    )
    .await
    .expect("envelope, not an error");
    assert_eq!(missing["success"], false);
    assert_eq!(missing["error"], "candidate nobody not found");
}

#[tokio::test]
async fn enhanced_and_recommend_commands() {
    let file = snapshot_file(FIXTURE);

    let enhanced = execute_with_config(
        cli(&file, &["enhanced-candidates", "--job", "job-backend", "--limit", "3"]),
        EngineConfig::default(),
    )
    .await
    .expect("enhanced ranking");
    assert_eq!(enhanced[0]["counterpart_id"], "cand-ada");
    assert_eq!(enhanced[0]["match_percentage"], 29);

    let recommendations = execute_with_config(
        cli(&file, &["recommend", "--candidate", "cand-grace", "--job", "job-backend"]),
        EngineConfig::default(),
    )
    .await
    .expect("recommendations");
    let ids: Vec<_> = recommendations
        .as_array()
        .expect("array output")
        .iter()
        .filter_map(|r| r["skill_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["tokio", "postgres"]);
}

#[tokio::test]
async fn recommend_for_unknown_job_is_an_error() {
    let file = snapshot_file(FIXTURE);
    let err = execute_with_config(
        cli(&file, &["recommend", "--candidate", "cand-ada", "--job", "nope"]),
        EngineConfig::default(),
    )
    .await
    .expect_err("unknown job");
    assert!(matches!(err, CliError::Service(_)));
}

#[tokio::test]
async fn unreadable_or_malformed_snapshots_fail() {
    let err = load_graph(std::path::Path::new("/definitely/missing/graph.json"))
        .await
        .expect_err("missing file");
    assert!(matches!(err, CliError::Read { .. }));

    let file = snapshot_file("{\"jobs\": [");
    let err = load_graph(file.path()).await.expect_err("truncated json");
    assert!(matches!(err, CliError::Graph(_)));
}

#[tokio::test]
async fn skill_path_prints_path_or_null() {
    let file = snapshot_file(FIXTURE);

    let path = execute_with_config(
        cli(&file, &["skill-path", "--from", "docker", "--to", "k8s"]),
        EngineConfig::default(),
    )
    .await
    .expect("path lookup");
    assert_eq!(path["skill_ids"], serde_json::json!(["docker", "k8s"]));
    assert_eq!(path["skill_names"], serde_json::json!(["Docker", "Kubernetes"]));
    assert_eq!(path["relationship_types"], serde_json::json!(["complementary_to"]));

    // requires points from tokio to rust, not back
    let none = execute_with_config(
        cli(&file, &["skill-path", "--from", "rust", "--to", "tokio"]),
        EngineConfig::default(),
    )
    .await
    .expect("path lookup");
    assert!(none.is_null());
}
