use std::path::{Path, PathBuf};
use anyhow::Context;
use lazy_static::lazy_static;
use tracing::*;

use crate::Result;
use crate::dialect::{CustomerColumns, FolderDialect};
use crate::raw::legacy::*;
use super::ParseInstance;
use super::common::*;

/// Full-day window substituted for the `(0, 0)` "unconstrained" sentinel.
pub const FULL_DAY: (u32, u32) = (0, 23 * 60 + 59);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TableKind {
  Categories,
  Customer,
  Demand,
  Distance,
  Vehicle,
}

impl TableKind {
  pub const ALL: [TableKind; 5] = [
    TableKind::Categories,
    TableKind::Customer,
    TableKind::Demand,
    TableKind::Distance,
    TableKind::Vehicle,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      TableKind::Categories => "categories",
      TableKind::Customer => "customer",
      TableKind::Demand => "demand",
      TableKind::Distance => "distance",
      TableKind::Vehicle => "vehicle",
    }
  }

  pub fn header_lines(&self) -> usize {
    match self {
      TableKind::Distance => 0,
      _ => 1,
    }
  }

  /// Filename pattern (case-sensitive) selecting this table inside an export folder.
  pub fn pattern(&self) -> &'static glob::Pattern {
    &PATTERNS[*self as usize]
  }
}

lazy_static! {
  static ref PATTERNS: Vec<glob::Pattern> = TableKind::ALL.iter()
    .map(|t| glob::Pattern::new(&format!("*{}*.txt", t.name())).expect("table patterns are valid globs"))
    .collect();
}


#[derive(Debug, Copy, Clone)]
pub struct FolderFmt<'a, P>(pub P, pub &'a FolderDialect);

impl<'a, P: AsRef<Path>> ParseInstance<FolderFmt<'a, P>> for LegacyTables {
  fn parse(input: FolderFmt<'a, P>) -> Result<Self> {
    let FolderFmt(dir, dialect) = input;
    let dir = dir.as_ref();
    let mut tables = LegacyTables::default();
    for (kind, path) in discover(dir)? {
      let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {:?}", path))?;
      debug!(table=kind.name(), ?path, "read table");
      let ctx = || format!("in {:?}", path);
      match kind {
        TableKind::Categories => tables.categories = Some(read_categories(&text).with_context(ctx)?),
        TableKind::Customer => tables.customers = Some(read_customers(&text, dialect).with_context(ctx)?),
        TableKind::Demand => tables.demand = Some(read_demand(&text).with_context(ctx)?),
        TableKind::Distance => tables.distance = Some(read_distance(&text).with_context(ctx)?),
        TableKind::Vehicle => tables.vehicles = Some(read_vehicles(&text).with_context(ctx)?),
      }
    }
    Ok(tables)
  }
}

/// For every table kind, the first file (in name order) of `dir` matching its pattern.
pub fn discover(dir: &Path) -> Result<Vec<(TableKind, PathBuf)>> {
  let mut names: Vec<String> = std::fs::read_dir(dir)
    .with_context(|| format!("failed to list {:?}", dir))?
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
    .filter_map(|e| e.file_name().into_string().ok())
    .collect();
  names.sort();

  let mut found = Vec::with_capacity(TableKind::ALL.len());
  for kind in TableKind::ALL.iter().copied() {
    match names.iter().find(|n| kind.pattern().matches(n)) {
      Some(n) => found.push((kind, dir.join(n))),
      None => debug!(table=kind.name(), ?dir, "no file for table"),
    }
  }
  Ok(found)
}


/// `customer_category truck_type trailer_type`
pub fn read_categories(text: &str) -> Result<Vec<CategoryRow>> {
  let kind = TableKind::Categories;
  let mut rows = Vec::new();
  for (line, l) in data_lines(text, kind.header_lines()) {
    let row = Row::new(kind.name(), line, l);
    row.require(3)?;
    rows.push(CategoryRow {
      customer_category: row.parse(0, "customer category", u32_)?,
      truck_type: row.parse(1, "truck type", u32_)?,
      trailer_type: row.parse(2, "trailer type", u32_)?,
    });
  }
  Ok(rows)
}

pub fn read_customers(text: &str, dialect: &FolderDialect) -> Result<Vec<CustomerRow>> {
  let kind = TableKind::Customer;
  let CustomerColumns { id, soft_tw, hard_tw, category } = dialect.customer_columns;
  let mut rows = Vec::new();
  for (line, l) in data_lines(text, kind.header_lines()) {
    let row = Row::new(kind.name(), line, l);
    row.require(dialect.customer_columns.min_fields())?;
    let window = |(b, e): (usize, usize)| -> Result<(u32, u32)> {
      let tw = (row.parse(b, "time", time_of_day)?, row.parse(e, "time", time_of_day)?);
      Ok(if dialect.full_day_sentinel && tw == (0, 0) { FULL_DAY } else { tw })
    };
    rows.push(CustomerRow {
      id: row.parse(id, "customer id", u32_)?,
      hard_tw: window(hard_tw)?,
      soft_tw: window(soft_tw)?,
      category: row.parse(category, "category", u32_)?,
      splittable: flag(row.last()?),
    });
  }
  Ok(rows)
}

/// `date object-code ref non-ref`
pub fn read_demand(text: &str) -> Result<Vec<DemandRow>> {
  let kind = TableKind::Demand;
  let mut rows = Vec::new();
  for (line, l) in data_lines(text, kind.header_lines()) {
    let row = Row::new(kind.name(), line, l);
    row.require(4)?;
    rows.push(DemandRow {
      id: row.parse(1, "object code", u32_)?,
      reference: row.parse(2, "quantity", decimal)?,
      non_reference: row.parse(3, "quantity", decimal)?,
    });
  }
  Ok(rows)
}

/// `from to cost time`, no header.
pub fn read_distance(text: &str) -> Result<Vec<DistanceEdge>> {
  let kind = TableKind::Distance;
  let mut rows = Vec::new();
  for (line, l) in data_lines(text, kind.header_lines()) {
    let row = Row::new(kind.name(), line, l);
    row.require(4)?;
    rows.push(DistanceEdge {
      from: row.parse(0, "customer id", u32_)?,
      to: row.parse(1, "customer id", u32_)?,
      cost: row.parse(2, "cost", decimal)?,
      time: row.parse(3, "time", time_of_day)?,
    });
  }
  Ok(rows)
}

/// `ID truck_category trailer_category isRef truck_capacity trailer_capacity parking_time join_time
/// reload_time fixedCost ...`
pub fn read_vehicles(text: &str) -> Result<Vec<VehicleRow>> {
  let kind = TableKind::Vehicle;
  let mut rows = Vec::new();
  for (line, l) in data_lines(text, kind.header_lines()) {
    let row = Row::new(kind.name(), line, l);
    row.require(10)?;
    rows.push(VehicleRow {
      id: row.parse(0, "vehicle id", prefixed_id)?,
      truck_category: row.parse(1, "truck category", u32_)?,
      trailer_category: row.parse(2, "trailer category", u32_)?,
      truck_capacity: row.parse(4, "capacity", decimal)?,
      trailer_capacity: row.parse(5, "capacity", decimal)?,
      parking_time: row.parse(6, "parking time", decimal)?,
      join_time: row.parse(7, "join time", decimal)?,
      reload_time: row.parse(8, "reload time", decimal)?,
      fixed_cost: row.parse(9, "fixed cost", decimal)?,
    });
  }
  Ok(rows)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;
  use std::fs;

  fn malformed_line(err: anyhow::Error) -> usize {
    match err.downcast_ref::<Error>() {
      Some(Error::MalformedRow { line, .. }) => *line,
      other => panic!("expected malformed row, got {:?}", other),
    }
  }

  #[test]
  fn categories() -> Result<()> {
    let rows = read_categories("CAT TRUCK TRAILER\n1 10 0\n\n1 0 20\n")?;
    assert_eq!(rows, vec![
      CategoryRow { customer_category: 1, truck_type: 10, trailer_type: 0 },
      CategoryRow { customer_category: 1, truck_type: 0, trailer_type: 20 },
    ]);
    Ok(())
  }

  #[test]
  fn customers_v2_full_day_sentinel() -> Result<()> {
    let text = "\
ID TW-BEGIN TW-END RUSH-BEGIN RUSH-END OPEN CLOSE TYPE PARKING SPLIT
17 8:00 12:30 0:00 0:00 0:00 0:00 3 5 Y
18 0:00 0:00 0:00 0:00 6:00 20:00 4 5 n
";
    let rows = read_customers(text, &FolderDialect::V2)?;
    assert_eq!(rows[0], CustomerRow { id: 17, hard_tw: FULL_DAY, soft_tw: (480, 750), category: 3, splittable: true });
    assert_eq!(rows[1], CustomerRow { id: 18, hard_tw: (360, 1200), soft_tw: FULL_DAY, category: 4, splittable: false });
    Ok(())
  }

  #[test]
  fn customers_v1_keep_zero_windows() -> Result<()> {
    let text = "\
header
5 1 0 0:00 0:00 0:00 0:00 7:00 19:00 2 x x x yes
";
    let rows = read_customers(text, &FolderDialect::V1)?;
    assert_eq!(rows[0], CustomerRow { id: 5, hard_tw: (420, 1140), soft_tw: (0, 0), category: 2, splittable: true });
    Ok(())
  }

  #[test]
  fn customer_row_too_short() {
    let text = "header\n17 8:00 12:30 0:00 0:00 0:00 0:00 3\n";
    let err = read_customers(text, &FolderDialect::V2).unwrap_err();
    assert_eq!(malformed_line(err), 2);
  }

  #[test]
  fn customer_bad_time() {
    let text = "header\n17 8h00 12:30 0:00 0:00 0:00 0:00 3 5 Y\n";
    assert_eq!(malformed_line(read_customers(text, &FolderDialect::V2).unwrap_err()), 2);
  }

  #[test]
  fn demand() -> Result<()> {
    let rows = read_demand("DATE CODE REF NONREF\n2019-01-01 17 1,5 2\n")?;
    assert_eq!(rows[0].id, 17);
    assert_eq!(rows[0].total(), 3.5);
    Ok(())
  }

  #[test]
  fn distance_has_no_header() -> Result<()> {
    let rows = read_distance("17 18 12,25 1:05\n18 17 3 0:10:59\n")?;
    assert_eq!(rows, vec![
      DistanceEdge { from: 17, to: 18, cost: 12.25, time: 65 },
      DistanceEdge { from: 18, to: 17, cost: 3.0, time: 10 },
    ]);
    Ok(())
  }

  #[test]
  fn vehicles() -> Result<()> {
    let text = "\
ID TRUCK TRAILER REF TCAP LCAP PARK JOIN RELOAD FIXED BALANCE
CAR5 10 0 Y 12,5 7,5 1,5 0 2 100,25 x
";
    let rows = read_vehicles(text)?;
    assert_eq!(rows, vec![VehicleRow {
      id: 5,
      truck_category: 10,
      trailer_category: 0,
      truck_capacity: 12.5,
      trailer_capacity: 7.5,
      parking_time: 1.5,
      join_time: 0.0,
      reload_time: 2.0,
      fixed_cost: 100.25,
    }]);
    let err = read_vehicles("header\n5 10 0 Y 12 7 1 0 2 100\n").unwrap_err();
    assert_eq!(malformed_line(err), 2);
    Ok(())
  }

  #[test]
  fn patterns() {
    assert!(TableKind::Customer.pattern().matches("customers_2019.txt"));
    assert!(TableKind::Customer.pattern().matches("customer.txt"));
    assert!(!TableKind::Customer.pattern().matches("Customer.txt"));
    assert!(!TableKind::Customer.pattern().matches("customer.csv"));
    assert!(TableKind::Categories.pattern().matches("x_categories.txt"));
  }

  #[test]
  fn discover_first_match_and_missing_tables() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("b_customer.txt"), "")?;
    fs::write(dir.path().join("a_customer.txt"), "")?;
    fs::write(dir.path().join("vehicle.txt"), "")?;
    fs::write(dir.path().join("notes.md"), "")?;
    let found = discover(dir.path())?;
    assert_eq!(found, vec![
      (TableKind::Customer, dir.path().join("a_customer.txt")),
      (TableKind::Vehicle, dir.path().join("vehicle.txt")),
    ]);
    Ok(())
  }

  #[test]
  fn parse_folder() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("customer.txt"), "header\n1 8:00 9:00 0:00 0:00 7:00 18:00 1 x n\n")?;
    fs::write(dir.path().join("vehicle.txt"), "header\nCAR1 1 0 Y 10 0 1 1 1 50 x\n")?;
    let tables = LegacyTables::parse(FolderFmt(dir.path(), &FolderDialect::V2))?;
    assert_eq!(tables.customers.as_ref().map(|c| c.len()), Some(1));
    assert_eq!(tables.vehicles.as_ref().map(|v| v.len()), Some(1));
    assert!(tables.demand.is_none());
    assert!(tables.categories.is_none());
    assert!(tables.distance.is_none());
    Ok(())
  }
}
