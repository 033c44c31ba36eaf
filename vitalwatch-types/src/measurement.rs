//! Measurement classes and classification outcomes.

use core::fmt;

/// A class of reading that can be classified against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MeasurementKind {
    /// Total cholesterol, compared against the monitored cohort's average.
    Cholesterol,
    /// Systolic blood pressure, compared against a clinician-set threshold.
    Systolic,
    /// Diastolic blood pressure, compared against a clinician-set threshold.
    Diastolic,
}

impl MeasurementKind {
    /// All kinds, in display order.
    pub const ALL: [MeasurementKind; 3] = [
        MeasurementKind::Cholesterol,
        MeasurementKind::Systolic,
        MeasurementKind::Diastolic,
    ];

    /// Returns the display label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementKind::Cholesterol => "Total Cholesterol",
            MeasurementKind::Systolic => "Systolic Blood Pressure",
            MeasurementKind::Diastolic => "Diastolic Blood Pressure",
        }
    }

    /// Unit the values of this kind are reported in.
    pub fn unit(&self) -> &'static str {
        match self {
            MeasurementKind::Cholesterol => "mg/dL",
            MeasurementKind::Systolic | MeasurementKind::Diastolic => "mmHg",
        }
    }

    /// True for the two blood-pressure components.
    pub fn is_blood_pressure(&self) -> bool {
        matches!(self, MeasurementKind::Systolic | MeasurementKind::Diastolic)
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.unit())
    }
}

/// Outcome of comparing a reading against its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Classification {
    Normal,
    Abnormal,
}

impl Classification {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Classification::Normal => "OK",
            Classification::Abnormal => "HIGH",
        }
    }

    pub fn is_abnormal(&self) -> bool {
        *self == Classification::Abnormal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_pressure_kinds() {
        assert!(!MeasurementKind::Cholesterol.is_blood_pressure());
        assert!(MeasurementKind::Systolic.is_blood_pressure());
        assert!(MeasurementKind::Diastolic.is_blood_pressure());
    }

    #[test]
    fn kind_display_includes_unit() {
        assert_eq!(
            MeasurementKind::Cholesterol.to_string(),
            "Total Cholesterol (mg/dL)"
        );
        assert_eq!(
            MeasurementKind::Diastolic.to_string(),
            "Diastolic Blood Pressure (mmHg)"
        );
    }

    #[test]
    fn abnormal_orders_above_normal() {
        assert!(Classification::Abnormal > Classification::Normal);
        assert_eq!(Classification::Abnormal.symbol(), "HIGH");
    }
}
