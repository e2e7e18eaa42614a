//! The solver-facing instance: dense customer table, vehicle table, square cost/time matrices
//! and the scalar configuration block, plus its `;`-separated text serialization.
use std::io::Write;
use itertools::Itertools;
use crate::{Error, Result};
use crate::raw::{Time, Cost, Quantity, Duration, ExtId};

pub const DELIMITER: &str = ";";
pub const COST_PREC: i32 = 5;

pub const CUSTOMER_HEADER: [&str; 9] = [
  "id", "volume", "weight",
  "hard_tw_begin", "hard_tw_end", "soft_tw_begin", "soft_tw_end",
  "service_time", "suitable_vehicles",
];

pub const VEHICLE_HEADER: [&str; 5] = ["id", "volume", "weight", "fixed_cost", "variable_cost"];


#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
  /// Dense index, `0..n` in the order the customer table lists them.
  pub index: usize,
  pub external_id: ExtId,
  pub category: Option<u32>,
  pub splittable: bool,
  pub demand: Quantity,
  pub hard_tw: (Time, Time),
  pub soft_tw: (Time, Time),
  pub service_time: Duration,
  /// Ids of the vehicle table rows allowed to serve this customer.
  pub vehicles: Vec<ExtId>,
}

impl Customer {
  /// Negative for an inverted window.
  #[inline]
  pub fn hard_tw_span(&self) -> i64 {
    i64::from(self.hard_tw.1) - i64::from(self.hard_tw.0)
  }

  /// Fails with [`Error::TimeWindowViolation`] if the service cannot fit into the hard time window.
  pub fn check_service_time(&self) -> Result<()> {
    let span = self.hard_tw_span();
    if self.service_time > span as f64 {
      return Err(Error::TimeWindowViolation {
        customer: self.external_id,
        service_time: self.service_time,
        span,
      }.into());
    }
    Ok(())
  }
}


#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
  pub id: ExtId,
  pub category: Option<u32>,
  pub volume: Quantity,
  pub weight: Quantity,
  pub setup_time: Duration,
  pub fixed_cost: Cost,
  pub variable_cost: Cost,
}


/// Row-major `n x n` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix<T> {
  n: usize,
  data: Vec<T>,
}

impl<T: Copy> SquareMatrix<T> {
  pub fn filled(n: usize, value: T) -> Self {
    SquareMatrix { n, data: vec![value; n * n] }
  }

  #[inline]
  pub fn dim(&self) -> usize { self.n }

  #[inline]
  pub fn get(&self, i: usize, j: usize) -> T {
    self.data[i * self.n + j]
  }

  #[inline]
  pub fn set(&mut self, i: usize, j: usize, value: T) {
    self.data[i * self.n + j] = value;
  }

  pub fn rows(&self) -> impl Iterator<Item=&[T]> {
    // chunks() panics on a zero chunk size
    self.data.chunks(self.n.max(1))
  }

  pub fn values(&self) -> &[T] { &self.data }
}


#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalInstance {
  pub id: String,
  pub customers: Vec<Customer>,
  pub vehicles: Vec<Vehicle>,
  pub cost: SquareMatrix<Cost>,
  pub time: SquareMatrix<Time>,
  /// Reserved by the solver format, always 0.
  pub max_violated_soft_tw: u32,
  /// `None` for sources without split deliveries; the section is then omitted.
  pub max_splits: Option<u8>,
}

impl CanonicalInstance {
  pub fn n_customers(&self) -> usize { self.customers.len() }

  /// Re-checks the structural invariants every constructor is expected to uphold.
  pub fn validate(&self) -> Result<()> {
    let n = self.customers.len();
    anyhow::ensure!(self.cost.dim() == n, "cost matrix is {0}x{0}, expected {1}x{1}", self.cost.dim(), n);
    anyhow::ensure!(self.time.dim() == n, "time matrix is {0}x{0}, expected {1}x{1}", self.time.dim(), n);
    for (k, c) in self.customers.iter().enumerate() {
      anyhow::ensure!(c.index == k, "customer {} has index {}, expected {}", c.external_id, c.index, k);
      for v in &c.vehicles {
        anyhow::ensure!(self.vehicles.iter().any(|veh| veh.id == *v),
          "customer {} refers to unknown vehicle {}", c.external_id, v);
      }
      c.check_service_time()?;
    }
    Ok(())
  }

  pub fn write(&self, mut buf: impl Write) -> Result<()> {
    self.write_customers(&mut buf)?;
    self.write_vehicles(&mut buf)?;
    self.write_costs(&mut buf)?;
    self.write_times(&mut buf)?;
    write_value(&mut buf, "max_violated_soft_tw", self.max_violated_soft_tw)?;
    if let Some(max_splits) = self.max_splits {
      write_value(&mut buf, "max_splits", max_splits)?;
    }
    buf.flush()?;
    Ok(())
  }

  pub fn to_text(&self) -> Result<String> {
    let mut buf = Vec::new();
    self.write(&mut buf)?;
    Ok(String::from_utf8(buf)?)
  }

  fn write_customers(&self, buf: &mut impl Write) -> Result<()> {
    writeln!(buf, "table customer")?;
    writeln!(buf, "{}", CUSTOMER_HEADER.iter().join(DELIMITER))?;
    for c in &self.customers {
      write!(buf, "{id};{q};{q};{hb};{he};{sb};{se};{s}",
             id = c.index,
             q = c.demand,
             hb = c.hard_tw.0,
             he = c.hard_tw.1,
             sb = c.soft_tw.0,
             se = c.soft_tw.1,
             s = c.service_time)?;
      for v in &c.vehicles {
        write!(buf, "{}{}", DELIMITER, v)?;
      }
      writeln!(buf)?;
    }
    writeln!(buf)?;
    Ok(())
  }

  fn write_vehicles(&self, buf: &mut impl Write) -> Result<()> {
    writeln!(buf, "table vehicle")?;
    writeln!(buf, "{}", VEHICLE_HEADER.iter().join(DELIMITER))?;
    for v in &self.vehicles {
      writeln!(buf, "{};{};{};{};{}", v.id, v.volume, v.weight, v.fixed_cost, v.variable_cost)?;
    }
    writeln!(buf)?;
    Ok(())
  }

  fn write_costs(&self, buf: &mut impl Write) -> Result<()> {
    writeln!(buf, "table cost")?;
    if self.cost.dim() > 0 {
      for row in self.cost.rows() {
        writeln!(buf, "{}", row.iter().map(|&c| round_to(c, COST_PREC)).join(DELIMITER))?;
      }
    }
    writeln!(buf)?;
    Ok(())
  }

  fn write_times(&self, buf: &mut impl Write) -> Result<()> {
    writeln!(buf, "table time")?;
    if self.time.dim() > 0 {
      for row in self.time.rows() {
        writeln!(buf, "{}", row.iter().join(DELIMITER))?;
      }
    }
    writeln!(buf)?;
    Ok(())
  }
}

fn write_value(buf: &mut impl Write, name: &str, value: impl std::fmt::Display) -> Result<()> {
  writeln!(buf, "value {}", name)?;
  writeln!(buf, "{}", value)?;
  writeln!(buf)?;
  Ok(())
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(x: f64, places: i32) -> f64 {
  let scale = 10f64.powi(places);
  let r = (x * scale).round() / scale;
  // avoid printing "-0"
  if r == 0.0 { 0.0 } else { r }
}
