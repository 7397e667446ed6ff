//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "opscope",
    about = "Render a recorded operator profile against its execution plan",
    after_help = "\
EXAMPLES:
    opscope --records query.prof --plan plan.json             Annotated DOT to stdout
    opscope --records query.prof --plan plan.json --dot q.dot Write DOT to a file
    opscope --records query.prof --plan plan.json \\
            --chrome trace.json                               Also emit a Chrome trace"
)]
pub struct Args {
    /// Profile record file written by the engine's event exporter
    #[arg(short, long, value_name = "FILE")]
    pub records: PathBuf,

    /// Execution plan description (JSON: node names + dependency edges)
    #[arg(short, long, value_name = "FILE")]
    pub plan: PathBuf,

    /// Write the annotated DOT graph to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    pub dot: Option<PathBuf>,

    /// Also export a Chrome Trace Event file (chrome://tracing, Perfetto)
    #[arg(long, value_name = "FILE")]
    pub chrome: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
