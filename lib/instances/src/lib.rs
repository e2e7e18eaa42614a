pub use anyhow::Result;

use std::fmt;
use fnv::{FnvHashMap, FnvHashSet};

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;

/// Data faults which abort the conversion of a single instance.
///
/// These travel inside [`anyhow::Error`]; use `err.downcast_ref::<Error>()` to recover them.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
  MalformedRow {
    table: &'static str,
    line: usize,
    reason: String,
  },
  UnrecognizedSection {
    keyword: &'static str,
  },
  InconsistentCategory {
    truck: u32,
    trailer: u32,
  },
  TimeWindowViolation {
    customer: u32,
    service_time: f64,
    span: i64,
  },
  FleetPartition {
    fleet_size: usize,
  },
  DuplicateId {
    table: &'static str,
    id: u32,
  },
}


impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use Error::*;
    match self {
      MalformedRow { table, line, reason } =>
        write!(f, "malformed row in {} table (line {}): {}", table, line, reason),
      UnrecognizedSection { keyword } =>
        write!(f, "section keyword {:?} not found", keyword),
      InconsistentCategory { truck, trailer } =>
        write!(f, "truck category {} and trailer category {} disagree", truck, trailer),
      TimeWindowViolation { customer, service_time, span } =>
        write!(f, "customer {}: service time {} exceeds hard time window span {}", customer, service_time, span),
      FleetPartition { fleet_size } =>
        write!(f, "fleet of {} vehicles cannot be split into small/medium/big tiers", fleet_size),
      DuplicateId { table, id } =>
        write!(f, "duplicate id {} in {} table", id, table),
    }
  }
}

impl std::error::Error for Error {}


pub mod canonical;
pub mod dataset;
pub mod dialect;
pub mod raw;
pub mod reconcile;
pub mod synth;

mod parsers;
pub use parsers::{ParseInstance, FolderFmt, SolomonFmt, SolomonStr, TableKind};

pub use canonical::CanonicalInstance;
pub use dialect::{Dialect, FolderDialect, BenchmarkDialect, ConvertOptions};
