use super::{Time, Cost, Quantity, Duration, ExtId};

/// One row of `*categories*.txt`: which vehicle categories may serve a customer category.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CategoryRow {
  pub customer_category: u32,
  pub truck_type: u32,
  pub trailer_type: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CustomerRow {
  pub id: ExtId,
  pub hard_tw: (Time, Time),
  pub soft_tw: (Time, Time),
  pub category: u32,
  pub splittable: bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DemandRow {
  pub id: ExtId,
  pub reference: Quantity,
  pub non_reference: Quantity,
}

impl DemandRow {
  #[inline]
  pub fn total(&self) -> Quantity { self.reference + self.non_reference }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceEdge {
  pub from: ExtId,
  pub to: ExtId,
  pub cost: Cost,
  pub time: Time,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VehicleRow {
  pub id: ExtId,
  pub truck_category: u32,
  pub trailer_category: u32,
  pub truck_capacity: Quantity,
  pub trailer_capacity: Quantity,
  pub parking_time: Duration,
  pub join_time: Duration,
  pub reload_time: Duration,
  pub fixed_cost: Cost,
}

/// Everything read from one real-life export folder. A table is `None` when no file for it was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyTables {
  pub categories: Option<Vec<CategoryRow>>,
  pub customers: Option<Vec<CustomerRow>>,
  pub demand: Option<Vec<DemandRow>>,
  pub distance: Option<Vec<DistanceEdge>>,
  pub vehicles: Option<Vec<VehicleRow>>,
}
