//! Per-vertex influence weights.
//!
//! A weight map answers "how strongly does the deformation grip vertex `i`",
//! typically painted in a host application and handed over as one scalar per
//! vertex. Values usually live in `[0, 1]` but the map does not re-enforce
//! that range; a weight of zero always leaves the vertex untouched.

/// Errors raised when a weight map does not fit the mesh it is applied to.
#[derive(Debug, thiserror::Error)]
pub enum WeightMapError {
    /// Per-vertex weight array size mismatch.
    #[error("weight map has {got} entries but the mesh has {expected} vertices")]
    CountMismatch { expected: usize, got: usize },

    /// Weight values contain NaN or Inf.
    #[error("weight map contains non-finite values")]
    NonFiniteWeights,
}

/// Source of per-vertex influence weights.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightMap {
    /// Every vertex gets the same weight.
    Uniform(f64),

    /// One weight per vertex (must match vertex count).
    PerVertex(Vec<f64>),
}

impl WeightMap {
    /// Create a uniform weight map.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self::Uniform(value)
    }

    /// Create a per-vertex weight map.
    #[must_use]
    pub fn per_vertex(values: Vec<f64>) -> Self {
        Self::PerVertex(values)
    }

    /// Weight for vertex `i`.
    ///
    /// Callers are expected to [`validate`](Self::validate) the map against
    /// the mesh first; an out-of-range index on a per-vertex map yields 0.0
    /// rather than panicking.
    #[must_use]
    pub fn value_at(&self, index: usize) -> f64 {
        match self {
            Self::Uniform(value) => *value,
            Self::PerVertex(values) => values.get(index).copied().unwrap_or(0.0),
        }
    }

    /// Check that the map is defined and finite for every vertex in
    /// `[0, vertex_count)`.
    pub fn validate(&self, vertex_count: usize) -> Result<(), WeightMapError> {
        match self {
            Self::Uniform(value) => {
                if !value.is_finite() {
                    return Err(WeightMapError::NonFiniteWeights);
                }
            }
            Self::PerVertex(values) => {
                if values.len() != vertex_count {
                    return Err(WeightMapError::CountMismatch {
                        expected: vertex_count,
                        got: values.len(),
                    });
                }
                if values.iter().any(|w| !w.is_finite()) {
                    return Err(WeightMapError::NonFiniteWeights);
                }
            }
        }
        Ok(())
    }
}

impl Default for WeightMap {
    /// Full influence everywhere, matching a freshly applied deformer before
    /// any weights are painted.
    fn default() -> Self {
        Self::Uniform(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_lookup() {
        let map = WeightMap::uniform(0.5);
        assert_eq!(map.value_at(0), 0.5);
        assert_eq!(map.value_at(1000), 0.5);
        assert!(map.validate(4).is_ok());
    }

    #[test]
    fn test_per_vertex_lookup() {
        let map = WeightMap::per_vertex(vec![0.0, 0.25, 1.0]);
        assert_eq!(map.value_at(1), 0.25);
        assert_eq!(map.value_at(2), 1.0);
        assert!(map.validate(3).is_ok());
    }

    #[test]
    fn test_count_mismatch() {
        let map = WeightMap::per_vertex(vec![1.0, 1.0]);
        assert!(matches!(
            map.validate(3),
            Err(WeightMapError::CountMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let map = WeightMap::per_vertex(vec![1.0, f64::NAN]);
        assert!(matches!(
            map.validate(2),
            Err(WeightMapError::NonFiniteWeights)
        ));

        let map = WeightMap::uniform(f64::INFINITY);
        assert!(matches!(
            map.validate(8),
            Err(WeightMapError::NonFiniteWeights)
        ));
    }

    #[test]
    fn test_default_is_full_influence() {
        assert_eq!(WeightMap::default(), WeightMap::Uniform(1.0));
    }
}
