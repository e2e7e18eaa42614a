use super::{Time, Quantity, ExtId};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SolomonRow {
  pub id: ExtId,
  pub x: f64,
  pub y: f64,
  pub demand: Quantity,
  pub ready_time: Time,
  pub due_time: Time,
  pub service_time: Time,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solomon {
  pub name: String,
  pub fleet_size: usize,
  pub capacity: Quantity,
  /// The depot is the row with id 0, normally the first.
  pub customers: Vec<SolomonRow>,
}

impl Solomon {
  pub fn coords(&self) -> Vec<(f64, f64)> {
    self.customers.iter().map(|c| (c.x, c.y)).collect()
  }
}
