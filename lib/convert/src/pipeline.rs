//! Batch conversion: every input is converted on its own and a failure only costs that input.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use anyhow::{Context, Result};
use itertools::Itertools;
use rayon::prelude::*;
use tracing::*;

use vrp_instances::CanonicalInstance;
use vrp_instances::dataset::{Dataset, Entry, IdxNameMap, InstanceSet};

/// Directory below which outputs land when no output directory is given.
pub const DEFAULT_OUTPUT_ROOT: &str = "test_data";

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// `None` picks `test_data/<dialect output dir>` per input.
    pub output_dir: Option<PathBuf>,
    pub prefix: String,
    pub fail_fast: bool,
}

impl BatchOptions {
    pub fn output_path(&self, set: &InstanceSet, idx: usize) -> Result<PathBuf> {
        let entry = set.entry(idx)?;
        let dir = match &self.output_dir {
            Some(d) => d.clone(),
            None => Path::new(DEFAULT_OUTPUT_ROOT).join(entry.dialect.output_dir()),
        };
        Ok(dir.join(set.output_file_name(idx, &self.prefix)?))
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Converted {
        output: PathBuf,
        customers: usize,
        vehicles: usize,
    },
    Failed {
        error: String,
    },
    /// Not attempted because an earlier input failed with `fail_fast` set.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub name: String,
    pub input: PathBuf,
    pub dialect: &'static str,
    pub status: Status,
}

impl Outcome {
    fn new(entry: &Entry, status: Status) -> Self {
        Outcome { name: entry.name.clone(), input: entry.path.clone(), dialect: entry.dialect.name(), status }
    }

    pub fn to_json(&self) -> json::JsonValue {
        let mut record = json::object! {
            name: self.name.as_str(),
            input: self.input.to_string_lossy().into_owned(),
            dialect: self.dialect,
        };
        match &self.status {
            Status::Converted { output, customers, vehicles } => {
                record["status"] = "converted".into();
                record["output"] = output.to_string_lossy().into_owned().into();
                record["customers"] = (*customers).into();
                record["vehicles"] = (*vehicles).into();
            }
            Status::Failed { error } => {
                record["status"] = "failed".into();
                record["error"] = error.as_str().into();
            }
            Status::Skipped => {
                record["status"] = "skipped".into();
            }
        }
        record
    }
}


/// Outcomes in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<Outcome>,
}

impl BatchSummary {
    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn converted(&self) -> usize { self.count(|s| matches!(s, Status::Converted { .. })) }

    pub fn failed(&self) -> usize { self.count(|s| matches!(s, Status::Failed { .. })) }

    pub fn skipped(&self) -> usize { self.count(|s| matches!(s, Status::Skipped)) }

    pub fn all_converted(&self) -> bool { self.converted() == self.outcomes.len() }

    pub fn to_json(&self) -> json::JsonValue {
        json::object! {
            converted: self.converted(),
            failed: self.failed(),
            skipped: self.skipped(),
            instances: self.outcomes.iter().map(Outcome::to_json).collect_vec(),
        }
    }

    pub fn write_report(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut buf = BufWriter::new(File::create(path).with_context(|| format!("failed to create report {:?}", path))?);
        self.to_json().write_pretty(&mut buf, 2)?;
        buf.flush()?;
        Ok(())
    }
}


/// Write a finished instance, creating the output directory if needed.
pub fn write_instance(instance: &CanonicalInstance, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("failed to create output directory {:?}", dir))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    instance.write(BufWriter::new(file)).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

/// Load, validate and write input `idx`. Nothing is written unless the instance is valid.
pub fn convert_one(set: &InstanceSet, idx: usize, opts: &BatchOptions) -> Result<Status> {
    let instance = set.load_instance(idx)?;
    let output = opts.output_path(set, idx)?;
    write_instance(&instance, &output)?;
    debug!(?output, "wrote instance");
    Ok(Status::Converted { output, customers: instance.n_customers(), vehicles: instance.vehicles.len() })
}

/// Convert every input of `set` on the current rayon pool.
#[instrument(level="info", skip(set, opts), fields(instances=set.len()))]
pub fn run_batch(set: &InstanceSet, opts: &BatchOptions) -> Result<BatchSummary> {
    let stop = AtomicBool::new(false);

    let outcomes: Vec<Outcome> = set.entries()
        .par_iter()
        .enumerate()
        .map(|(idx, entry)| {
            if stop.load(Ordering::Relaxed) {
                return Outcome::new(entry, Status::Skipped);
            }
            let _s = info_span!("instance", name=%entry.name).entered();
            let status = match convert_one(set, idx, opts) {
                Ok(status) => status,
                Err(e) => {
                    error!(input=?entry.path, dialect=%entry.dialect, "conversion failed: {:#}", e);
                    if opts.fail_fast {
                        stop.store(true, Ordering::Relaxed);
                    }
                    Status::Failed { error: format!("{:#}", e) }
                }
            };
            Outcome::new(entry, status)
        })
        .collect();

    let summary = BatchSummary { outcomes };
    info!(converted=summary.converted(), failed=summary.failed(), skipped=summary.skipped(), "batch finished");
    Ok(summary)
}
