//! # opscope - Main Entry Point
//!
//! Offline render mode: replay a profile record file against its execution
//! plan and emit the annotated DOT graph (and optionally a Chrome trace).
//! Recording happens inside the engine through the `opscope` library; this
//! binary only consumes what the engine exported.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufWriter;

use opscope::analysis::NodeTimings;
use opscope::cli::Args;
use opscope::export::ChromeTraceExporter;
use opscope::plan::{NodeSource, PlanGraph};
use opscope::viz::DagVisualizer;
use opscope_common::ProfileRecord;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let plan = PlanGraph::from_file(&args.plan)
        .with_context(|| format!("failed to load plan {}", args.plan.display()))?;

    let text = std::fs::read_to_string(&args.records)
        .with_context(|| format!("failed to read records {}", args.records.display()))?;
    let records = ProfileRecord::parse_lines(&text)
        .with_context(|| format!("failed to parse records {}", args.records.display()))?;
    info!("parsed {} records against a {}-node plan", records.len(), plan.node_count());

    let timings = NodeTimings::from_records(&records, plan.node_count());
    if !args.quiet {
        eprintln!(
            "{} events, {} threads, {:.3}s total elapsed",
            records.len(),
            timings.contributing_threads(),
            timings.total_secs()
        );
    }

    let dot = DagVisualizer::new(&plan).to_dot(&timings);
    match &args.dot {
        Some(path) => std::fs::write(path, &dot)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{dot}"),
    }

    if let Some(path) = &args.chrome {
        let mut exporter = ChromeTraceExporter::new();
        exporter.add_records(&records, Some(&plan));
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        exporter.export(BufWriter::new(file)).context("failed to write Chrome trace")?;
        info!("wrote {} Chrome trace events to {}", exporter.event_count(), path.display());
    }

    Ok(())
}
