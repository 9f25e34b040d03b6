//! Unit systems found in sheet headers.

use serde::{Deserialize, Serialize};

/// Unit system a sheet was drawn up in, inferred from its weight column label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitSystem {
    Imperial,
    Metric,
}

impl UnitSystem {
    /// `LBS` in the label means imperial, `KG` metric.
    pub fn from_weight_label(label: &str) -> Option<Self> {
        if label.contains("LBS") {
            Some(Self::Imperial)
        } else if label.contains("KG") {
            Some(Self::Metric)
        } else {
            None
        }
    }

    /// Composes a length from its sheet fields.
    ///
    /// Imperial sheets split length over a feet column and an inches column;
    /// everything else carries a single length already in consistent units.
    pub fn compose_length(units: Option<Self>, length: Option<f64>, inches: Option<f64>) -> Option<f64> {
        match units {
            Some(Self::Imperial) => match (length, inches) {
                (None, None) => None,
                (feet, inches) => Some(feet.unwrap_or(0.0) * 12.0 + inches.unwrap_or(0.0)),
            },
            _ => length,
        }
    }
}
