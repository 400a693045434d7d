use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use scanmap_common::config::Config;
use scanmap_common::graph::GraphModel;
use scanmap_common::network::host::HostRecord;
use scanmap_core::pipeline::{PipelineController, RunSummary};
use tracing::Instrument;

use crate::sprint;
use crate::terminal::reporter::TerminalReporter;
use crate::terminal::{colors, print, spinner};

type Detail = (String, ColoredString);

pub async fn scan(config: Config) -> anyhow::Result<()> {
    let target = config.target.clone();
    print::header(&format!("scanning {target}"));
    print::print_status(format!("Target is a {}", target.kind().describe()));

    let span = spinner::scan_span("Getting ready...");
    let reporter = Arc::new(TerminalReporter::new(span.clone()));
    let mut controller = PipelineController::builder(config)
        .reporter(reporter)
        .build();

    let start_time: Instant = Instant::now();
    let outcome = controller.run(target).instrument(span.clone()).await;

    // The spinner goes away with the last handle on its span.
    drop(controller);
    drop(span);

    let summary: RunSummary = outcome?;
    scan_ends(&summary, start_time.elapsed());
    Ok(())
}

fn scan_ends(summary: &RunSummary, total_time: Duration) {
    sprint!();
    if summary.graph.is_empty() {
        print::header("zero hosts detected");
    } else {
        print::header("network map");
        print_hosts(&summary.graph);
    }
    print_summary(summary, total_time);
}

fn print_hosts(graph: &GraphModel) {
    let root: Option<&str> = graph.root().map(HostRecord::address);
    let hosts: &[HostRecord] = graph.nodes();
    for (idx, host) in hosts.iter().enumerate() {
        let is_root: bool = root == Some(host.address());
        print_host_tree(host, idx, is_root);
        if idx + 1 != hosts.len() {
            sprint!();
        }
    }
}

fn print_host_tree(host: &HostRecord, idx: usize, is_root: bool) {
    let name: ColoredString = if host.has_hostname() {
        host.hostname().color(colors::PRIMARY)
    } else {
        "No hostname".color(colors::UNKNOWN)
    };
    print::tree_head(idx, &name);

    let role: &str = if is_root { "Root" } else { "Leaf" };
    let details: Vec<Detail> = vec![
        ("Address".to_string(), host.address().color(colors::ADDRESS)),
        ("Role".to_string(), role.normal()),
    ];
    print::as_tree_one_level(&details);
}

fn print_summary(summary: &RunSummary, total_time: Duration) {
    let hosts_len: usize = summary.graph.nodes().len();
    let active_hosts: ColoredString = format!("{hosts_len} active hosts").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString = format!("Scan Complete: {active_hosts} identified in {total_time}")
        .color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
    print::fat_separator();

    if summary.installed {
        print::print_status("The scanner was installed during this run");
    }
    print::print_status(format!("Map written to {}", summary.artifact.display()));
    if summary.report.path.exists() {
        print::print_status(format!("Scan report kept at {}", summary.report.path.display()));
    }
    print::print_status(format!("Run {}", summary.run_id));
}
