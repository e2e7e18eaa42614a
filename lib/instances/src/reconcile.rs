//! Joins the raw tables of a real-life export into a [`CanonicalInstance`].
use std::borrow::Cow;
use std::iter::FromIterator;
use tracing::*;

use crate::{Error, Result, Map, Set};
use crate::canonical::{CanonicalInstance, Customer, Vehicle, SquareMatrix};
use crate::dialect::{CategoryMode, CapacityRule, ConvertOptions, FolderDialect, PairRule, SetupTimeRule};
use crate::raw::{FromRaw, ExtId, Quantity, Time, Cost};
use crate::raw::legacy::*;

/// Maps sparse external customer ids onto `0..n` in first-observed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseRemap {
  order: Vec<ExtId>,
  index: Map<ExtId, usize>,
}

impl DenseRemap {
  pub fn new(ids: impl IntoIterator<Item=ExtId>) -> Result<Self> {
    let mut remap = DenseRemap::default();
    for id in ids {
      if remap.index.insert(id, remap.order.len()).is_some() {
        return Err(Error::DuplicateId { table: "customer", id }.into());
      }
      remap.order.push(id);
    }
    Ok(remap)
  }

  #[inline]
  pub fn get(&self, id: ExtId) -> Option<usize> { self.index.get(&id).copied() }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }
}


/// Collapse a (truck, trailer) category pair; 0 stands for "no category".
pub fn collapse_pair(truck: u32, trailer: u32, rule: PairRule) -> Result<u32, Error> {
  match (truck, trailer) {
    (0, t) => Ok(t),
    (t, 0) => Ok(t),
    (t, l) if t == l => Ok(t),
    (t, l) => match rule {
      PairRule::TruckFirst => Ok(t),
      PairRule::RequireEqual => Err(Error::InconsistentCategory { truck: t, trailer: l }),
    },
  }
}


/// Customer category -> vehicle categories able to serve it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMapping(Map<u32, Set<u32>>);

impl CategoryMapping {
  pub fn from_rows(rows: &[CategoryRow], mode: CategoryMode, pairs: PairRule) -> Result<Self> {
    let mut map: Map<u32, Set<u32>> = Map::default();
    for r in rows {
      let vehicle_category = collapse_pair(r.truck_type, r.trailer_type, pairs)?;
      let entry = map.entry(r.customer_category).or_default();
      if mode == CategoryMode::Single {
        entry.clear();
      }
      entry.insert(vehicle_category);
    }
    Ok(CategoryMapping(map))
  }

  /// Empty for unknown categories.
  pub fn resolve(&self, customer_category: u32) -> Cow<Set<u32>> {
    match self.0.get(&customer_category) {
      Some(s) => Cow::Borrowed(s),
      None => Cow::Owned(Set::default()),
    }
  }
}

impl FromIterator<(u32, u32)> for CategoryMapping {
  fn from_iter<I: IntoIterator<Item=(u32, u32)>>(iter: I) -> Self {
    let mut map: Map<u32, Set<u32>> = Map::default();
    for (c, v) in iter {
      map.entry(c).or_default().insert(v);
    }
    CategoryMapping(map)
  }
}


/// Vehicles (in table order) whose category is one of `categories`.
pub fn eligible_vehicles(categories: &Set<u32>, vehicles: &[Vehicle]) -> Vec<ExtId> {
  vehicles.iter()
    .filter(|v| v.category.map_or(false, |c| categories.contains(&c)))
    .map(|v| v.id)
    .collect()
}

/// Mean setup time of the given vehicles, 0 for none.
pub fn mean_setup_time(eligible: &[ExtId], vehicles: &Map<ExtId, &Vehicle>) -> f64 {
  if eligible.is_empty() {
    return 0.0;
  }
  let total: f64 = eligible.iter().map(|v| vehicles[v].setup_time).sum();
  total / eligible.len() as f64
}

pub fn build_vehicles(rows: &[VehicleRow], dialect: &FolderDialect) -> Result<Vec<Vehicle>> {
  let mut seen = Set::default();
  let mut vehicles = Vec::with_capacity(rows.len());
  for r in rows {
    if !seen.insert(r.id) {
      return Err(Error::DuplicateId { table: "vehicle", id: r.id }.into());
    }
    let capacity = match dialect.capacity {
      CapacityRule::Truck => r.truck_capacity,
      CapacityRule::TruckPlusTrailer => r.truck_capacity + r.trailer_capacity,
    } * dialect.quantity_multiplier;
    let setup_time = match dialect.setup_time {
      SetupTimeRule::ParkingJoinReload => r.parking_time + r.join_time + r.reload_time,
      SetupTimeRule::ReloadOnly => r.reload_time,
    };
    vehicles.push(Vehicle {
      id: r.id,
      category: Some(collapse_pair(r.truck_category, r.trailer_category, dialect.pairs)?),
      volume: capacity,
      weight: capacity,
      setup_time,
      fixed_cost: r.fixed_cost,
      variable_cost: 0.0,
    });
  }
  Ok(vehicles)
}

/// Total demand per customer id; a later row for the same id replaces an earlier one.
pub fn demand_lookup(rows: &[DemandRow], multiplier: f64) -> Map<ExtId, Quantity> {
  rows.iter().map(|r| (r.id, r.total() * multiplier)).collect()
}

/// Dense cost and time matrices. Missing edges stay 0, edges to unknown customers are dropped.
pub fn edge_matrices(edges: &[DistanceEdge], remap: &DenseRemap) -> (SquareMatrix<Cost>, SquareMatrix<Time>) {
  let n = remap.len();
  let mut cost = SquareMatrix::filled(n, 0.0);
  let mut time = SquareMatrix::filled(n, 0);
  let mut skipped = 0usize;
  for e in edges {
    match (remap.get(e.from), remap.get(e.to)) {
      (Some(i), Some(j)) => {
        cost.set(i, j, e.cost);
        time.set(i, j, e.time);
      }
      _ => skipped += 1,
    }
  }
  if skipped > 0 {
    warn!(skipped, "distance edges refer to customers missing from the customer table");
  }
  (cost, time)
}


impl FromRaw<LegacyTables> for CanonicalInstance {
  type Dialect = FolderDialect;

  #[instrument(level="debug", name="reconcile", skip(raw, dialect, opt), fields(dialect=dialect.name))]
  fn from_raw(raw: LegacyTables, id: Cow<str>, dialect: &FolderDialect, opt: &ConvertOptions) -> Result<Self> {
    let rows = raw.customers.unwrap_or_default();
    let remap = DenseRemap::new(rows.iter().map(|c| c.id))?;

    let demand = raw.demand
      .map(|d| demand_lookup(&d, dialect.quantity_multiplier))
      .unwrap_or_default();
    let mapping = match raw.categories {
      Some(rows) => CategoryMapping::from_rows(&rows, dialect.categories, dialect.pairs)?,
      None => CategoryMapping::default(),
    };
    let vehicles = build_vehicles(&raw.vehicles.unwrap_or_default(), dialect)?;
    let by_id: Map<ExtId, &Vehicle> = vehicles.iter().map(|v| (v.id, v)).collect();

    let mut customers = Vec::with_capacity(rows.len());
    for (index, r) in rows.iter().enumerate() {
      let eligible = eligible_vehicles(&mapping.resolve(r.category), &vehicles);
      let customer = Customer {
        index,
        external_id: r.id,
        category: Some(r.category),
        splittable: r.splittable,
        demand: demand.get(&r.id).copied().unwrap_or(0.0),
        hard_tw: r.hard_tw,
        soft_tw: r.soft_tw,
        service_time: mean_setup_time(&eligible, &by_id),
        vehicles: eligible,
      };
      customer.check_service_time()?;
      customers.push(customer);
    }

    let (cost, time) = edge_matrices(&raw.distance.unwrap_or_default(), &remap);
    debug!(customers=customers.len(), vehicles=vehicles.len(), "reconciled");

    Ok(CanonicalInstance {
      id: id.into_owned(),
      customers,
      vehicles,
      cost,
      time,
      max_violated_soft_tw: 0,
      max_splits: if dialect.split_deliveries { Some(opt.max_splits) } else { None },
    })
  }
}
