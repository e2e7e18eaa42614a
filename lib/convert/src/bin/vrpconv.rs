use rayon::ThreadPoolBuilder;
use anyhow::Result;
use tracing::*;

use vrpconv::*;
use vrp_instances::{ConvertOptions, Dialect};
use vrp_instances::dataset::{IdxNameMap, InstanceSet};
use vrp_instances::dialect::{DIALECT_STRINGS, MAX_SPLITS_RANGE};

mod common;
use common::*;

use structopt::StructOpt;

/// Normalize raw VRP instances (real-life export folders or Solomon files) into the canonical
/// `;`-separated solver format.
#[derive(Debug, StructOpt)]
#[structopt(name="vrpconv")]
struct ClArgs {
    /// Export folders or benchmark files; glob patterns are expanded
    #[structopt(required=true)]
    inputs: Vec<String>,
    /// Source dialect [default: folder-v2x2 for directories, solomon for files]
    #[structopt(long, short="d", parse(try_from_str), possible_values=&DIALECT_STRINGS)]
    dialect: Option<Dialect>,
    /// Maximum number of deliveries a split customer may receive
    #[structopt(long, default_value="2", validator=clap_range_validator(Some(MAX_SPLITS_RANGE.0), Some(MAX_SPLITS_RANGE.1)))]
    max_splits: u8,
    /// Stop at the first instance which fails to convert
    #[structopt(long)]
    fail_fast: bool,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
    #[structopt(flatten)]
    output: OutputOptions,
}


fn main() -> Result<()> {
    let args : ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.as_ref())?;
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global()?;

    let set = InstanceSet::from_inputs(&args.inputs, args.dialect, ConvertOptions::new(args.max_splits)?)?;
    info!(instances=set.len(), "converting");
    let batch = BatchOptions {
        output_dir: args.output.dir.clone(),
        prefix: args.output.prefix.clone(),
        fail_fast: args.fail_fast,
    };
    let summary = run_batch(&set, &batch)?;
    if let Some(path) = &args.output.report {
        summary.write_report(path)?;
    }

    if !summary.all_converted() {
        drop(_g);
        std::process::exit(1);
    }
    Ok(())
}
