pub mod legacy;
pub mod solomon;

use std::borrow::Cow;
use crate::dialect::ConvertOptions;

/// Minutes since midnight (or benchmark time units).
pub type Time = u32;
pub type Cost = f64;
pub type Quantity = f64;
pub type Duration = f64;
/// Identifier as it appears in the raw source.
pub type ExtId = u32;

pub trait FromRaw<T> where Self: Sized {
  type Dialect;

  fn from_raw(raw: T, id: Cow<str>, dialect: &Self::Dialect, opt: &ConvertOptions) -> crate::Result<Self>;
}


pub(crate) mod metrics {
  use num_traits::{AsPrimitive, Num};
  use crate::canonical::SquareMatrix;

  pub trait Metric {
    const SYM: bool = false;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64;
  }


  pub struct Euclidean();

  impl Metric for Euclidean {
    const SYM: bool = true;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64 {
      let a = p1.0.as_() - p2.0.as_();
      let b = p1.1.as_() - p2.1.as_();
      (a*a + b*b).sqrt()
    }
  }

  /// Compute the distance-matrix for the given coordinates
  #[inline]
  pub fn dist_matrix<M, T>(_metric: M, coords: &[(T, T)]) -> SquareMatrix<f64>
    where
      M: Metric,
      T: Num + AsPrimitive<f64>
  {
    dist_matrix_pp(_metric, coords, |x| x)
  }

  /// Like [`dist_matrix`], but allows a post-processing function to be supplied.
  pub fn dist_matrix_pp<M, T, S>(_metric: M, coords: &[(T, T)], func: impl Fn(f64) -> S) -> SquareMatrix<S>
    where
      M: Metric,
      T: Num + AsPrimitive<f64>,
      S: Copy + Default
  {
    let n = coords.len();
    let mut matrix = SquareMatrix::filled(n, S::default());
    if M::SYM {
      for i in 0..n {
        let p1 = coords[i];
        for j in (i+1)..n {
          let p2 = coords[j];
          let d = func(M::compute(p1, p2));
          matrix.set(i, j, d);
          matrix.set(j, i, d);
        }
        let d = func(M::compute(p1, p1));
        matrix.set(i, i, d);
      }
    } else {
      for i in 0..n {
        let p1 = coords[i];
        for j in 0..n {
          let p2 = coords[j];
          matrix.set(i, j, func(M::compute(p1, p2)));
        }
      }
    }

    matrix
  }

  #[cfg(test)]
  mod tests {
    use super::*;

    #[test]
    fn three_four_five() {
      let m = dist_matrix(Euclidean(), &[(0.0, 0.0), (3.0, 4.0), (-3.0, 0.5)]);
      assert_eq!(m.dim(), 3);
      assert_eq!(m.get(0, 1), 5.0);
      assert_eq!(m.get(1, 0), 5.0);
      assert_eq!(m.get(2, 2), 0.0);
    }

    #[test]
    fn truncated_times() {
      let m = dist_matrix_pp(Euclidean(), &[(0, 0), (1, 1), (2, 2)], |d| d.trunc() as u32);
      assert_eq!(m.get(0, 1), 1);
      assert_eq!(m.get(0, 2), 2);
      assert_eq!(m.get(2, 1), 1);
    }
  }
}
