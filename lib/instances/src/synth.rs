//! Fills in what a Solomon benchmark file lacks: a heterogeneous fleet, demand-based eligibility
//! and the distance matrices.
use std::borrow::Cow;
use std::ops::Range;
use tracing::*;

use crate::{Error, Result};
use crate::canonical::{CanonicalInstance, Customer, Vehicle, round_to};
use crate::dialect::{BenchmarkDialect, ConvertOptions};
use crate::raw::{FromRaw, ExtId, Time};
use crate::raw::metrics::{Euclidean, dist_matrix, dist_matrix_pp};
use crate::raw::solomon::*;

pub const BASE_VARIABLE_COST: f64 = 1.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VehicleTier {
  Small,
  Medium,
  Big,
}

impl VehicleTier {
  /// Scales capacity and both costs.
  pub fn multiplier(&self) -> f64 {
    match self {
      VehicleTier::Small => 0.5,
      VehicleTier::Medium => 1.0,
      VehicleTier::Big => 1.5,
    }
  }
}


/// Fleet of `V` vehicles split into small, medium and big, numbered in that order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FleetPartition {
  pub small: usize,
  pub medium: usize,
  pub big: usize,
}

impl FleetPartition {
  pub fn split(fleet_size: usize) -> Result<Self, Error> {
    let v = fleet_size as f64;
    let small = (0.45 * v).round() as usize;
    let medium = (0.30 * v).round() as usize;
    let big = fleet_size.checked_sub(small + medium)
      .ok_or(Error::FleetPartition { fleet_size })?;
    Ok(FleetPartition { small, medium, big })
  }

  pub fn ids(&self, tier: VehicleTier) -> Range<ExtId> {
    let (start, len) = match tier {
      VehicleTier::Small => (0, self.small),
      VehicleTier::Medium => (self.small, self.medium),
      VehicleTier::Big => (self.small + self.medium, self.big),
    };
    (start as ExtId)..((start + len) as ExtId)
  }

  pub fn tiers(&self) -> impl Iterator<Item=(ExtId, VehicleTier)> {
    use VehicleTier::*;
    self.ids(Small).map(|id| (id, Small))
      .chain(self.ids(Medium).map(|id| (id, Medium)))
      .chain(self.ids(Big).map(|id| (id, Big)))
  }

  /// Vehicles allowed to serve a customer of the given demand tier.
  pub fn eligible(&self, demand_tier: u32) -> Vec<ExtId> {
    use VehicleTier::*;
    let tiers: &[VehicleTier] = match demand_tier {
      0 => &[Small],
      1 => &[Small, Medium],
      2 => &[Small, Medium, Big],
      _ => &[Medium, Big],
    };
    tiers.iter().flat_map(|&t| self.ids(t)).collect()
  }
}


/// 0 below the average demand, 1 below 1.5 times it, 2 below twice it, 3 otherwise.
pub fn demand_tier(demand: f64, avg_demand: f64) -> u32 {
  if demand < avg_demand {
    0
  } else if demand < avg_demand * 1.5 {
    1
  } else if demand < avg_demand * 2.0 {
    2
  } else {
    3
  }
}

fn mean(values: impl ExactSizeIterator<Item=f64>) -> f64 {
  let n = values.len();
  if n == 0 {
    return 0.0;
  }
  values.sum::<f64>() / n as f64
}

fn end_of(begin: Time, length: Time, customer: ExtId) -> Result<Time> {
  begin.checked_add(length)
    .ok_or_else(|| anyhow::anyhow!("customer {}: time window end {} + {} overflows", customer, begin, length))
}


impl FromRaw<Solomon> for CanonicalInstance {
  type Dialect = BenchmarkDialect;

  #[instrument(level="debug", name="synthesize", skip(raw, opt), fields(benchmark=%raw.name))]
  fn from_raw(raw: Solomon, id: Cow<str>, dialect: &BenchmarkDialect, opt: &ConvertOptions) -> Result<Self> {
    let coords = raw.coords();
    let cost = dist_matrix(Euclidean(), &coords);
    let time = dist_matrix_pp(Euclidean(), &coords, |d| d.trunc() as Time);

    let (customers, vehicles) = match dialect {
      BenchmarkDialect::Tiered => tiered(&raw, mean(cost.values().iter().copied()))?,
      BenchmarkDialect::Homogeneous => homogeneous(&raw)?,
    };
    debug!(customers=customers.len(), vehicles=vehicles.len(), "synthesized");

    Ok(CanonicalInstance {
      id: id.into_owned(),
      customers,
      vehicles,
      cost,
      time,
      max_violated_soft_tw: 0,
      max_splits: if dialect.split_deliveries() { Some(opt.max_splits) } else { None },
    })
  }
}

fn tiered(raw: &Solomon, avg_edge_cost: f64) -> Result<(Vec<Customer>, Vec<Vehicle>)> {
  let fleet = FleetPartition::split(raw.fleet_size)?;
  trace!(?fleet, avg_edge_cost);
  let base_fixed_cost = round_to(avg_edge_cost * 10.0, 2);

  let vehicles = fleet.tiers()
    .map(|(id, tier)| {
      let m = tier.multiplier();
      Vehicle {
        id,
        category: Some(tier as u32),
        volume: raw.capacity * m,
        weight: raw.capacity * m,
        setup_time: 0.0,
        fixed_cost: base_fixed_cost * m,
        variable_cost: BASE_VARIABLE_COST * m,
      }
    })
    .collect();

  let avg_demand = mean(raw.customers.iter().map(|c| c.demand));
  let mut customers = Vec::with_capacity(raw.customers.len());
  for (index, r) in raw.customers.iter().enumerate() {
    let tier = demand_tier(r.demand, avg_demand);
    let window = (r.ready_time, end_of(r.ready_time, r.due_time, r.id)?);
    let c = Customer {
      index,
      external_id: r.id,
      category: Some(tier),
      splittable: true,
      demand: r.demand,
      hard_tw: window,
      soft_tw: window,
      service_time: r.service_time as f64,
      vehicles: if r.id == 0 { Vec::new() } else { fleet.eligible(tier) },
    };
    c.check_service_time()?;
    customers.push(c);
  }
  Ok((customers, vehicles))
}

fn homogeneous(raw: &Solomon) -> Result<(Vec<Customer>, Vec<Vehicle>)> {
  let vehicles = (0..raw.fleet_size as ExtId)
    .map(|id| Vehicle {
      id,
      category: None,
      volume: raw.capacity,
      weight: raw.capacity,
      setup_time: 0.0,
      fixed_cost: 1.0,
      variable_cost: 1.0,
    })
    .collect();

  let mut customers = Vec::with_capacity(raw.customers.len());
  for (index, r) in raw.customers.iter().enumerate() {
    let window = (r.ready_time, r.due_time);
    let c = Customer {
      index,
      external_id: r.id,
      category: None,
      splittable: false,
      demand: r.demand,
      hard_tw: window,
      soft_tw: window,
      service_time: r.service_time as f64,
      vehicles: Vec::new(),
    };
    c.check_service_time()?;
    customers.push(c);
  }
  Ok((customers, vehicles))
}


#[cfg(test)]
mod tests {
  use super::*;

  fn row(id: ExtId, x: f64, y: f64, demand: f64) -> SolomonRow {
    SolomonRow { id, x, y, demand, ready_time: 0, due_time: 100, service_time: 10 }
  }

  fn small_benchmark() -> Solomon {
    Solomon {
      name: "T1".to_string(),
      fleet_size: 10,
      capacity: 100.0,
      customers: vec![row(0, 0.0, 0.0, 0.0), row(1, 3.0, 4.0, 50.0)],
    }
  }

  fn convert(raw: Solomon, dialect: BenchmarkDialect) -> Result<CanonicalInstance> {
    CanonicalInstance::from_raw(raw, "t1".into(), &dialect, &ConvertOptions::default())
  }

  #[test]
  fn fleet_split() -> Result<()> {
    assert_eq!(FleetPartition::split(10)?, FleetPartition { small: 5, medium: 3, big: 2 });
    assert_eq!(FleetPartition::split(25)?, FleetPartition { small: 11, medium: 8, big: 6 });
    assert_eq!(FleetPartition::split(2)?, FleetPartition { small: 1, medium: 1, big: 0 });
    assert_eq!(FleetPartition::split(0)?, FleetPartition { small: 0, medium: 0, big: 0 });
    Ok(())
  }

  #[test]
  fn eligibility_by_demand_tier() -> Result<()> {
    let fleet = FleetPartition::split(10)?;
    assert_eq!(fleet.eligible(0), vec![0, 1, 2, 3, 4]);
    assert_eq!(fleet.eligible(1), (0..8).collect::<Vec<_>>());
    assert_eq!(fleet.eligible(2), (0..10).collect::<Vec<_>>());
    assert_eq!(fleet.eligible(3), vec![5, 6, 7, 8, 9]);
    Ok(())
  }

  #[test]
  fn demand_tiers() {
    assert_eq!(demand_tier(9.9, 10.0), 0);
    assert_eq!(demand_tier(10.0, 10.0), 1);
    assert_eq!(demand_tier(15.0, 10.0), 2);
    assert_eq!(demand_tier(19.99, 10.0), 2);
    assert_eq!(demand_tier(20.0, 10.0), 3);
  }

  #[test]
  fn tiered_end_to_end() -> Result<()> {
    let inst = convert(small_benchmark(), BenchmarkDialect::Tiered)?;
    assert!(inst.customers[0].vehicles.is_empty());
    assert_eq!(inst.customers[1].vehicles, vec![5, 6, 7, 8, 9]);
    assert_eq!(inst.customers[1].category, Some(3));
    assert_eq!(inst.customers[1].hard_tw, (0, 100));
    assert_eq!(inst.customers[1].soft_tw, (0, 100));

    // avg edge cost = (5 + 5) / 4, base fixed cost 25
    let v: Vec<_> = inst.vehicles.iter().map(|v| (v.id, v.volume, v.fixed_cost, v.variable_cost)).collect();
    assert_eq!(v.len(), 10);
    assert_eq!(v[0], (0, 50.0, 12.5, 0.5));
    assert_eq!(v[5], (5, 100.0, 25.0, 1.0));
    assert_eq!(v[9], (9, 150.0, 37.5, 1.5));

    assert_eq!(inst.cost.get(0, 1), 5.0);
    assert_eq!(inst.time.get(1, 0), 5);
    assert_eq!(inst.max_splits, Some(2));
    inst.validate()
  }

  #[test]
  fn window_end_is_ready_plus_due() -> Result<()> {
    let mut raw = small_benchmark();
    raw.customers[1].ready_time = 30;
    raw.customers[1].due_time = 40;
    let inst = convert(raw, BenchmarkDialect::Tiered)?;
    assert_eq!(inst.customers[1].hard_tw, (30, 70));
    Ok(())
  }

  #[test]
  fn truncated_times() -> Result<()> {
    let mut raw = small_benchmark();
    raw.customers[1].x = 1.0;
    raw.customers[1].y = 1.0;
    let inst = convert(raw, BenchmarkDialect::Tiered)?;
    assert_eq!(inst.time.get(0, 1), 1);
    assert_eq!(round_to(inst.cost.get(0, 1), 5), 1.41421);
    Ok(())
  }

  #[test]
  fn service_exceeds_window() {
    let mut raw = small_benchmark();
    raw.customers[1].service_time = 101;
    let err = convert(raw, BenchmarkDialect::Tiered).unwrap_err();
    match err.downcast_ref::<Error>() {
      Some(Error::TimeWindowViolation { customer: 1, span: 100, .. }) => {},
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn homogeneous_fleet() -> Result<()> {
    let mut raw = small_benchmark();
    raw.customers[1].ready_time = 30;
    raw.customers[1].due_time = 90;
    let inst = convert(raw, BenchmarkDialect::Homogeneous)?;
    assert_eq!(inst.vehicles.len(), 10);
    assert!(inst.vehicles.iter().all(|v| v.volume == 100.0 && v.fixed_cost == 1.0 && v.variable_cost == 1.0));
    assert!(inst.customers.iter().all(|c| c.vehicles.is_empty()));
    assert_eq!(inst.customers[1].hard_tw, (30, 90));
    assert_eq!(inst.max_splits, None);
    let text = inst.to_text()?;
    assert!(text.contains("\n1;50;50;30;90;30;90;10\n"));
    Ok(())
  }

  #[test]
  fn deterministic() -> Result<()> {
    let a = convert(small_benchmark(), BenchmarkDialect::Tiered)?.to_text()?;
    let b = convert(small_benchmark(), BenchmarkDialect::Tiered)?.to_text()?;
    assert_eq!(a, b);
    Ok(())
  }
}
