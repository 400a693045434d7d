#![cfg(test)]
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use scanmap_common::error::StageError;
use scanmap_common::network::host::{HostRecord, UNKNOWN_HOSTNAME};
use scanmap_common::network::target::TargetSpec;
use scanmap_common::stage::{PipelineState, Stage};

use crate::support::{Fixture, ScriptedRunner, TWO_HOST_REPORT};

fn target() -> TargetSpec {
    TargetSpec::from_str("10.0.0.0/30").unwrap()
}

/// Scanner present, two hosts up: inventory, graph and artifact all follow
/// the report.
#[tokio::test]
async fn two_host_network_is_mapped() {
    let fixture = Fixture::new();
    let runner = Arc::new(ScriptedRunner {
        scanner_present: true,
        report: Some(TWO_HOST_REPORT),
        ..ScriptedRunner::default()
    });

    let summary = fixture.controller(runner.clone()).run(target()).await.unwrap();

    assert_eq!(
        summary.graph.nodes(),
        [
            HostRecord::new("10.0.0.1", Some("router".to_string())),
            HostRecord::new("10.0.0.2", None),
        ]
        .as_slice()
    );
    assert_eq!(summary.graph.nodes()[1].hostname(), UNKNOWN_HOSTNAME);

    let edges: Vec<(&str, &str)> = summary
        .graph
        .edges()
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(edges, [("10.0.0.1", "10.0.0.2")]);

    let page = std::fs::read_to_string(fixture.artifact()).unwrap();
    assert!(page.contains("router"));
    assert!(page.contains("10.0.0.2"));

    let scan = &runner.scans()[0];
    assert_eq!(Path::new(&scan.program), fixture.scanner.as_path());
    assert_eq!(scan.args.last().unwrap(), "10.0.0.0/30");
    assert_eq!(summary.history().last(), Some(&PipelineState::Done));
}

/// Scanner absent and the package manager refuses: the run stops at
/// installing and nothing downstream happens.
#[tokio::test]
async fn failed_install_stops_the_run() {
    let fixture = Fixture::new();
    let runner = Arc::new(ScriptedRunner {
        scanner_present: false,
        install_succeeds: false,
        report: Some(TWO_HOST_REPORT),
        ..ScriptedRunner::default()
    });
    let mut controller = fixture.controller(runner.clone());

    let err = controller.run(target()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Installing);
    match &err.source {
        StageError::InstallFailed { package, reason } => {
            assert_eq!(package, "nmap");
            assert!(reason.contains("Unable to locate package"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(runner.scans().is_empty());
    assert!(!fixture.dir.path().join("reports").exists());
    assert!(!fixture.artifact().exists());
    assert!(matches!(
        controller.state(),
        PipelineState::Failed { stage: Stage::Installing, .. }
    ));
    assert!(err.to_string().starts_with("installing stage failed"));
}

/// The scanner exits cleanly but leaves no report behind.
#[tokio::test]
async fn missing_report_fails_at_parsing() {
    let fixture = Fixture::new();
    let runner = Arc::new(ScriptedRunner {
        scanner_present: true,
        report: None,
        ..ScriptedRunner::default()
    });
    let mut controller = fixture.controller(runner);

    let err = controller.run(target()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Parsing);
    assert!(matches!(err.source, StageError::ReportUnreadable { .. }));
    assert!(!fixture.artifact().exists());
}

#[tokio::test]
async fn present_scanner_is_never_installed() {
    let fixture = Fixture::new();
    let runner = Arc::new(ScriptedRunner {
        scanner_present: true,
        report: Some(TWO_HOST_REPORT),
        ..ScriptedRunner::default()
    });

    let summary = fixture.controller(runner.clone()).run(target()).await.unwrap();

    assert!(!summary.installed);
    for stage in [Stage::Installing, Stage::Refreshing] {
        assert!(!summary.history().contains(&PipelineState::Running(stage)));
    }
    assert_eq!(runner.calls_to("sudo") + runner.calls_to("apt-get"), 0);
}

/// Scanner absent, install succeeds, run carries on to the end.
#[tokio::test]
async fn installed_scanner_is_used_for_the_scan() {
    let fixture = Fixture::new();
    let runner = Arc::new(ScriptedRunner {
        scanner_present: false,
        install_succeeds: true,
        report: Some(TWO_HOST_REPORT),
        ..ScriptedRunner::default()
    });

    let summary = fixture.controller(runner.clone()).run(target()).await.unwrap();

    assert!(summary.installed);
    assert_eq!(runner.calls_to("sudo") + runner.calls_to("apt-get"), 1);
    assert_eq!(
        &summary.history()[1..5],
        [
            PipelineState::Running(Stage::Probing),
            PipelineState::Running(Stage::Installing),
            PipelineState::Running(Stage::Refreshing),
            PipelineState::Running(Stage::Locating),
        ]
        .as_slice()
    );
    assert!(fixture.artifact().exists());
}

#[tokio::test]
async fn empty_report_renders_an_empty_map() {
    let fixture = Fixture::new();
    let runner = Arc::new(ScriptedRunner {
        scanner_present: true,
        report: Some(r#"<?xml version="1.0"?><nmaprun scanner="nmap"><runstats/></nmaprun>"#),
        ..ScriptedRunner::default()
    });

    let summary = fixture.controller(runner).run(target()).await.unwrap();

    assert!(summary.graph.is_empty());
    assert!(summary.graph.edges().is_empty());
    assert!(fixture.artifact().exists());
}
