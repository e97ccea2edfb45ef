//! Vector type

use crate::error::{Result, VectorDbError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An embedding in n-dimensional space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Compute the L2 norm (magnitude) of the vector
    pub fn norm(&self) -> f32 {
        crate::similarity::norm(&self.data)
    }

    /// Reject empty vectors and vectors with NaN or infinite components.
    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(VectorDbError::InvalidVector {
                reason: "vector has no components".to_string(),
            });
        }
        if let Some(pos) = self.data.iter().position(|x| !x.is_finite()) {
            return Err(VectorDbError::InvalidVector {
                reason: format!("component {} is not finite ({})", pos, self.data[pos]),
            });
        }
        Ok(())
    }
}

impl FromStr for Vector {
    type Err = VectorDbError;

    /// Parse a vector from a comma-separated string
    fn from_str(s: &str) -> Result<Self> {
        let data: Result<Vec<f32>> = s
            .split(',')
            .map(|x| {
                x.trim()
                    .parse::<f32>()
                    .map_err(|_| VectorDbError::InvalidVector {
                        reason: format!("Invalid float: {}", x),
                    })
            })
            .collect();
        let vector = Vector::new(data?);
        vector.validate()?;
        Ok(vector)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

impl From<&[f32]> for Vector {
    fn from(data: &[f32]) -> Self {
        Vector::new(data.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for Vector {
    fn from(data: [f32; N]) -> Self {
        Vector::new(data.to_vec())
    }
}
