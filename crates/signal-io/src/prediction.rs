//! Prediction vector

use serde::{Deserialize, Serialize};

/// Raw class scores produced by one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Unnormalized logits, in output order
    pub logits: Vec<f64>,
}

/// Location view of a three-value prediction, as read by the host application
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationEstimate {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Prediction {
    pub fn new(logits: Vec<f64>) -> Self {
        Self { logits }
    }

    pub fn len(&self) -> usize {
        self.logits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logits.is_empty()
    }

    /// Interpret the first three logits as `x`, `y`, `size`
    pub fn location(&self) -> Option<LocationEstimate> {
        match self.logits.as_slice() {
            [x, y, size, ..] => Some(LocationEstimate {
                x: *x,
                y: *y,
                size: *size,
            }),
            _ => None,
        }
    }
}

impl From<Vec<f32>> for Prediction {
    fn from(logits: Vec<f32>) -> Self {
        Self::new(logits.into_iter().map(f64::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_view() {
        let prediction = Prediction::new(vec![1.5, -2.0, 0.25]);
        let location = prediction.location().unwrap();
        assert_eq!(location.x, 1.5);
        assert_eq!(location.y, -2.0);
        assert_eq!(location.size, 0.25);
    }

    #[test]
    fn test_location_needs_three_values() {
        assert!(Prediction::new(vec![1.0, 2.0]).location().is_none());
    }

    #[test]
    fn test_from_f32() {
        let prediction = Prediction::from(vec![0.5f32, 1.0, 2.0]);
        assert_eq!(prediction.logits, vec![0.5, 1.0, 2.0]);
    }
}
