use std::path::Path;
use anyhow::Context;

use crate::{Error, Result};
use crate::raw::solomon::*;
use super::ParseInstance;
use super::common::*;

const TABLE: &str = "solomon";

#[derive(Debug, Copy, Clone)]
pub struct SolomonFmt<P>(pub P);

/// Benchmark text already in memory.
#[derive(Debug, Copy, Clone)]
pub struct SolomonStr<'a>(pub &'a str);

impl<P: AsRef<Path>> ParseInstance<SolomonFmt<P>> for Solomon {
  fn parse(path: SolomonFmt<P>) -> Result<Solomon> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    Solomon::parse(SolomonStr(&data))
  }
}

impl<'a> ParseInstance<SolomonStr<'a>> for Solomon {
  fn parse(input: SolomonStr<'a>) -> Result<Solomon> {
    let mut lines = input.0.lines().enumerate().map(|(k, l)| (k + 1, l.trim()));
    let name = lines.next().map(|(_, l)| l.to_string()).unwrap_or_default();

    skip_past(&mut lines, "VEHICLE")?;
    lines.next(); // NUMBER CAPACITY
    let (line, l) = lines.by_ref()
      .find(|(_, l)| !l.is_empty())
      .ok_or(Error::UnrecognizedSection { keyword: "VEHICLE" })?;
    let row = Row::new(TABLE, line, l);
    row.require(2)?;
    let fleet_size = row.parse(0, "vehicle number", usize_)?;
    let capacity = row.parse(1, "vehicle capacity", decimal)?;

    skip_past(&mut lines, "CUSTOMER")?;
    lines.next(); // CUST NO. XCOORD. ...
    let mut customers = Vec::new();
    for (line, l) in lines.filter(|(_, l)| !l.is_empty()) {
      let row = Row::new(TABLE, line, l);
      row.require(7)?;
      customers.push(SolomonRow {
        id: row.parse(0, "customer number", u32_)?,
        x: row.parse(1, "x coordinate", decimal)?,
        y: row.parse(2, "y coordinate", decimal)?,
        demand: row.parse(3, "demand", u32_)? as f64,
        ready_time: row.parse(4, "ready time", u32_)?,
        due_time: row.parse(5, "due date", u32_)?,
        service_time: row.parse(6, "service time", u32_)?,
      });
    }

    Ok(Solomon { name, fleet_size, capacity, customers })
  }
}

/// Consume lines up to and including the one equal to `keyword`.
/// Running out of lines is an error rather than an endless wait.
fn skip_past<'a>(lines: &mut impl Iterator<Item=(usize, &'a str)>, keyword: &'static str) -> Result<(), Error> {
  if lines.any(|(_, l)| l == keyword) {
    Ok(())
  } else {
    Err(Error::UnrecognizedSection { keyword })
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  pub const C101_HEAD: &str = "C101

VEHICLE
NUMBER     CAPACITY
  25         200

CUSTOMER
CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE   TIME

    0      40         50          0          0       1236          0
    1      45         68         10        912        967         90
    2      45         70         30        825        870         90
";

  #[test]
  fn c101_head() -> Result<()> {
    let s = Solomon::parse(SolomonStr(C101_HEAD))?;
    assert_eq!(s.name, "C101");
    assert_eq!(s.fleet_size, 25);
    assert_eq!(s.capacity, 200.0);
    assert_eq!(s.customers.len(), 3);
    assert_eq!(s.customers[1], SolomonRow {
      id: 1,
      x: 45.0,
      y: 68.0,
      demand: 10.0,
      ready_time: 912,
      due_time: 967,
      service_time: 90,
    });
    Ok(())
  }

  fn missing_keyword(text: &str) -> &'static str {
    let err = Solomon::parse(SolomonStr(text)).unwrap_err();
    match err.downcast_ref::<Error>() {
      Some(Error::UnrecognizedSection { keyword }) => *keyword,
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn missing_sections_terminate() {
    assert_eq!(missing_keyword("C101\n\nNUMBER CAPACITY\n25 200\n"), "VEHICLE");
    assert_eq!(missing_keyword("C101\nVEHICLE\nNUMBER CAPACITY\n25 200\n\n0 40 50 0 0 1236 0\n"), "CUSTOMER");
    assert_eq!(missing_keyword(""), "VEHICLE");
  }

  #[test]
  fn short_customer_row() {
    let text = C101_HEAD.replace("    2      45         70         30        825        870         90", "2 45 70 30");
    let err = Solomon::parse(SolomonStr(&text)).unwrap_err();
    match err.downcast_ref::<Error>() {
      Some(Error::MalformedRow { line: 12, .. }) => {},
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn read_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("C101.txt");
    std::fs::write(&path, C101_HEAD)?;
    assert_eq!(Solomon::parse(SolomonFmt(&path))?.customers.len(), 3);
    assert!(Solomon::parse(SolomonFmt(dir.path().join("missing.txt"))).is_err());
    Ok(())
  }
}
