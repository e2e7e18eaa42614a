//! Source dialects. The real-life export variants differ only in column layout and a handful of
//! policies, so they are values of one [`FolderDialect`] rather than separate readers.
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use anyhow::Context;
use tracing::*;

use crate::{Result, CanonicalInstance};
use crate::parsers::{ParseInstance, FolderFmt, SolomonFmt};
use crate::raw::{FromRaw, legacy::LegacyTables, solomon::Solomon};

pub const MAX_SPLITS_RANGE: (u8, u8) = (1, 3);

/// Settings which apply to every dialect.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConvertOptions {
  /// Maximum number of deliveries a customer's demand may be split into (1..=3).
  pub max_splits: u8,
}

impl Default for ConvertOptions {
  fn default() -> Self { ConvertOptions { max_splits: 2 } }
}

impl ConvertOptions {
  pub fn new(max_splits: u8) -> Result<Self> {
    let (lo, hi) = MAX_SPLITS_RANGE;
    anyhow::ensure!(lo <= max_splits && max_splits <= hi, "max splits must be in {}..={}, got {}", lo, hi, max_splits);
    Ok(ConvertOptions { max_splits })
  }
}


/// Column positions in the customer table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CustomerColumns {
  pub id: usize,
  pub soft_tw: (usize, usize),
  pub hard_tw: (usize, usize),
  pub category: usize,
}

impl CustomerColumns {
  /// `id town-id timezone tw-begin tw-end rush-begin rush-end open close type ... can-split`
  pub const V1: CustomerColumns = CustomerColumns { id: 0, soft_tw: (3, 4), hard_tw: (7, 8), category: 9 };
  /// `id tw-begin tw-end rush-begin rush-end open close type ... can-split`
  pub const V2: CustomerColumns = CustomerColumns { id: 0, soft_tw: (1, 2), hard_tw: (5, 6), category: 7 };

  /// The split flag is the last column and must come after every other used column.
  pub fn min_fields(&self) -> usize {
    let last = [self.id, self.soft_tw.0, self.soft_tw.1, self.hard_tw.0, self.hard_tw.1, self.category]
      .iter().copied().max().unwrap_or(0);
    last + 2
  }
}

/// How customer-category rows map onto vehicle categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CategoryMode {
  /// One vehicle category per customer category; a later row replaces an earlier one.
  Single,
  /// Every row adds a vehicle category to the customer category's set.
  Set,
}

/// How a (truck, trailer) category pair collapses into a single vehicle category.
/// Category 0 means "none" and always defers to the other member of the pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PairRule {
  TruckFirst,
  /// Two non-zero categories must agree.
  RequireEqual,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CapacityRule {
  Truck,
  TruckPlusTrailer,
}

/// Which vehicle durations make up the setup time averaged into a customer's service time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SetupTimeRule {
  ParkingJoinReload,
  ReloadOnly,
}


#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FolderDialect {
  pub name: &'static str,
  pub customer_columns: CustomerColumns,
  /// Rewrite a `(0, 0)` time window to the whole day.
  pub full_day_sentinel: bool,
  pub quantity_multiplier: f64,
  pub categories: CategoryMode,
  pub pairs: PairRule,
  pub capacity: CapacityRule,
  pub setup_time: SetupTimeRule,
  pub split_deliveries: bool,
}

impl FolderDialect {
  pub const V1: FolderDialect = FolderDialect {
    name: "folder-v1",
    customer_columns: CustomerColumns::V1,
    full_day_sentinel: false,
    quantity_multiplier: 1.0,
    categories: CategoryMode::Single,
    pairs: PairRule::RequireEqual,
    capacity: CapacityRule::Truck,
    setup_time: SetupTimeRule::ParkingJoinReload,
    split_deliveries: false,
  };

  pub const V2: FolderDialect = FolderDialect {
    name: "folder-v2",
    customer_columns: CustomerColumns::V2,
    full_day_sentinel: true,
    quantity_multiplier: 1.0,
    categories: CategoryMode::Set,
    pairs: PairRule::RequireEqual,
    capacity: CapacityRule::TruckPlusTrailer,
    setup_time: SetupTimeRule::ParkingJoinReload,
    split_deliveries: true,
  };

  pub const V2_SCALED: FolderDialect = FolderDialect {
    name: "folder-v2x2",
    quantity_multiplier: 2.0,
    ..FolderDialect::V2
  };

  pub fn with_multiplier(self, quantity_multiplier: f64) -> Self {
    FolderDialect { quantity_multiplier, ..self }
  }
}


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BenchmarkDialect {
  /// Small/medium/big fleet tiers and demand-tier eligibility.
  Tiered,
  /// Identical vehicles, no eligibility restrictions.
  Homogeneous,
}

impl BenchmarkDialect {
  pub fn name(&self) -> &'static str {
    match self {
      BenchmarkDialect::Tiered => "solomon",
      BenchmarkDialect::Homogeneous => "solomon-plain",
    }
  }

  pub fn split_deliveries(&self) -> bool {
    matches!(self, BenchmarkDialect::Tiered)
  }
}


#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Dialect {
  Folder(FolderDialect),
  Benchmark(BenchmarkDialect),
}

pub const DIALECT_STRINGS: [&str; 5] = ["folder-v1", "folder-v2", "folder-v2x2", "solomon", "solomon-plain"];

impl FromStr for Dialect {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    return match s {
      "folder-v1" => Ok(Dialect::Folder(FolderDialect::V1)),
      "folder-v2" => Ok(Dialect::Folder(FolderDialect::V2)),
      "folder-v2x2" => Ok(Dialect::Folder(FolderDialect::V2_SCALED)),
      "solomon" => Ok(Dialect::Benchmark(BenchmarkDialect::Tiered)),
      "solomon-plain" => Ok(Dialect::Benchmark(BenchmarkDialect::Homogeneous)),
      _ => Err(format!("invalid dialect: {}", s)),
    };
  }
}

impl fmt::Display for Dialect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl Dialect {
  pub fn name(&self) -> &'static str {
    match self {
      Dialect::Folder(d) => d.name,
      Dialect::Benchmark(d) => d.name(),
    }
  }

  /// Directories are real-life exports, anything else a benchmark file.
  pub fn detect(path: impl AsRef<Path>) -> Dialect {
    if path.as_ref().is_dir() {
      Dialect::Folder(FolderDialect::V2_SCALED)
    } else {
      Dialect::Benchmark(BenchmarkDialect::Tiered)
    }
  }

  /// Output directory below `test_data/` used when none is given.
  pub fn output_dir(&self) -> &'static str {
    match self {
      Dialect::Folder(_) => "real_life",
      Dialect::Benchmark(BenchmarkDialect::Tiered) => "solomon_sdvrptwsd",
      Dialect::Benchmark(BenchmarkDialect::Homogeneous) => "solomon",
    }
  }

  /// Parse, reconcile and validate one instance.
  pub fn load(&self, path: &Path, id: Cow<str>, opt: &ConvertOptions) -> Result<CanonicalInstance> {
    debug!(dialect=self.name(), ?path, "load instance");
    let instance = match self {
      Dialect::Folder(dialect) => {
        let raw = LegacyTables::parse(FolderFmt(path, dialect))
          .with_context(|| format!("failed to read folder {:?}", path))?;
        CanonicalInstance::from_raw(raw, id, dialect, opt)?
      }
      Dialect::Benchmark(dialect) => {
        let raw = Solomon::parse(SolomonFmt(path))
          .with_context(|| format!("failed to read benchmark file {:?}", path))?;
        CanonicalInstance::from_raw(raw, id, dialect, opt)?
      }
    };
    instance.validate()?;
    Ok(instance)
  }
}
