//! Discretized state keys and feature vectors.
//!
//! Tabular methods index their tables with a [`StateKey`], while
//! function-approximation methods consume a [`FeatureVector`] produced by a
//! [`Featurizer`].
use crate::error::GridRlError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hashable identifier of a discretized world state.
///
/// A key consists of integer coordinates followed by any extra variables
/// needed to make the state Markov (e.g. the number of items carried).
/// Equal states yield equal keys. Keys are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(Vec<i64>);

impl StateKey {
    /// Builds a key from raw components.
    pub fn new(components: impl Into<Vec<i64>>) -> Self {
        Self(components.into())
    }

    /// Builds a key from 2D grid coordinates.
    pub fn grid(x: i64, y: i64) -> Self {
        Self(vec![x, y])
    }

    /// Appends an extra discrete variable to the key.
    pub fn with_extra(mut self, v: i64) -> Self {
        self.0.push(v);
        self
    }

    /// Components of the key.
    pub fn components(&self) -> &[i64] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

/// Fixed-length real vector derived from a state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Wraps a vector.
    pub fn new(v: Vec<f64>) -> Self {
        Self(v)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the vector has no features.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Features as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Checks the length against the input dimension of a consumer.
    pub fn check_dim(&self, expected: usize) -> Result<(), GridRlError> {
        if self.0.len() == expected {
            Ok(())
        } else {
            Err(GridRlError::DimensionMismatch {
                expected,
                actual: self.0.len(),
            })
        }
    }
}

/// Maps a state key to a feature vector of constant length.
pub trait Featurizer {
    /// Length of the produced feature vectors.
    fn dim(&self) -> usize;

    /// Computes the features of a state.
    fn features(&self, key: &StateKey) -> FeatureVector;
}

/// One-hot (tile) features over a `width x height` grid.
///
/// The first two components of the key are the grid coordinates. Extra
/// components, if any, are appended as raw values after the one-hot block,
/// up to `n_extra` of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneHotFeaturizer {
    width: usize,
    height: usize,
    n_extra: usize,
}

impl OneHotFeaturizer {
    /// Constructs the featurizer.
    pub fn new(width: usize, height: usize, n_extra: usize) -> Self {
        Self {
            width,
            height,
            n_extra,
        }
    }
}

impl Featurizer for OneHotFeaturizer {
    fn dim(&self) -> usize {
        self.width * self.height + self.n_extra
    }

    fn features(&self, key: &StateKey) -> FeatureVector {
        let mut v = vec![0.0; self.dim()];
        let c = key.components();
        let x = c.first().copied().unwrap_or(0);
        let y = c.get(1).copied().unwrap_or(0);

        // Out-of-bounds coordinates produce an all-zero tile block.
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            v[y as usize * self.width + x as usize] = 1.0;
        }
        for (i, e) in c.iter().skip(2).take(self.n_extra).enumerate() {
            v[self.width * self.height + i] = *e as f64;
        }
        FeatureVector(v)
    }
}

/// Gaussian radial basis features with centers on a regular grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RbfFeaturizer {
    centers: Vec<(f64, f64)>,
    sigma: f64,
}

impl RbfFeaturizer {
    /// Places `nx * ny` centers evenly over `[0, width] x [0, height]`.
    pub fn new(width: f64, height: f64, nx: usize, ny: usize, sigma: f64) -> Self {
        let step = |extent: f64, n: usize, i: usize| {
            if n <= 1 {
                extent / 2.0
            } else {
                extent * i as f64 / (n - 1) as f64
            }
        };
        let mut centers = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                centers.push((step(width, nx, i), step(height, ny, j)));
            }
        }
        Self { centers, sigma }
    }
}

impl Featurizer for RbfFeaturizer {
    fn dim(&self) -> usize {
        self.centers.len()
    }

    fn features(&self, key: &StateKey) -> FeatureVector {
        let c = key.components();
        let x = c.first().copied().unwrap_or(0) as f64;
        let y = c.get(1).copied().unwrap_or(0) as f64;
        let denom = 2.0 * self.sigma * self.sigma;
        let v = self
            .centers
            .iter()
            .map(|(cx, cy)| {
                let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                (-d2 / denom).exp()
            })
            .collect();
        FeatureVector(v)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equal_states_equal_keys() {
        let a = StateKey::grid(3, 4).with_extra(1);
        let b = StateKey::new(vec![3, 4, 1]);
        let c = StateKey::grid(3, 4).with_extra(2);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = vec![a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(format!("{}", a), "(3,4,1)");
    }

    #[test]
    fn test_one_hot_features() {
        let f = OneHotFeaturizer::new(3, 2, 1);
        assert_eq!(f.dim(), 7);
        let v = f.features(&StateKey::grid(2, 1).with_extra(4));
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 4.0]);

        let out = f.features(&StateKey::grid(5, 1));
        assert!(out.as_slice()[..6].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_rbf_features() {
        let f = RbfFeaturizer::new(4.0, 4.0, 3, 3, 1.0);
        assert_eq!(f.dim(), 9);
        let v = f.features(&StateKey::grid(2, 2));
        // The center at (2, 2) is the 5th one and responds with exp(0).
        assert!((v.as_slice()[4] - 1.0).abs() < 1e-12);
        assert!(v.as_slice().iter().all(|x| *x > 0.0 && *x <= 1.0));
    }

    #[test]
    fn test_check_dim() {
        let v = FeatureVector::new(vec![0.0; 3]);
        assert!(v.check_dim(3).is_ok());
        assert_eq!(
            v.check_dim(4),
            Err(GridRlError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
