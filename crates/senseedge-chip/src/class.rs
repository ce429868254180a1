//! Fault classes and their wire-protocol names.

use core::fmt;

/// One of the classifier's output classes.
///
/// The hardware reports a 2-bit class id; anything outside `0..=3` decodes
/// to [`FaultClass::Unknown`] so a malformed result word can never index
/// past the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// Normal operation.
    Healthy,
    /// Bearing wear signature (mid-low band energy, high peak magnitude).
    BearingWear,
    /// Rotor imbalance signature (mid-high band energy).
    Imbalance,
    /// Shaft misalignment signature (high band energy).
    Misalignment,
    /// Out-of-range class id.
    Unknown,
}

impl FaultClass {
    /// Decode a class id. Ids above 3 map to [`FaultClass::Unknown`].
    #[must_use]
    pub const fn from_id(id: u8) -> Self {
        match id {
            0 => Self::Healthy,
            1 => Self::BearingWear,
            2 => Self::Imbalance,
            3 => Self::Misalignment,
            _ => Self::Unknown,
        }
    }

    /// The name used on the telemetry wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::BearingWear => "BEARING_WEAR",
            Self::Imbalance => "IMBALANCE",
            Self::Misalignment => "MISALIGNMENT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// True for any classification other than [`FaultClass::Healthy`].
    #[must_use]
    pub const fn is_fault(self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_to_name_mapping() {
        assert_eq!(FaultClass::from_id(0).name(), "HEALTHY");
        assert_eq!(FaultClass::from_id(1).name(), "BEARING_WEAR");
        assert_eq!(FaultClass::from_id(2).name(), "IMBALANCE");
        assert_eq!(FaultClass::from_id(3).name(), "MISALIGNMENT");
        for id in 4..=u8::MAX {
            assert_eq!(FaultClass::from_id(id), FaultClass::Unknown);
        }
        assert_eq!(FaultClass::Unknown.name(), "UNKNOWN");
    }

    #[test]
    fn only_healthy_is_not_a_fault() {
        assert!(!FaultClass::Healthy.is_fault());
        assert!(FaultClass::BearingWear.is_fault());
        assert!(FaultClass::Imbalance.is_fault());
        assert!(FaultClass::Misalignment.is_fault());
        assert!(FaultClass::Unknown.is_fault());
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(FaultClass::BearingWear.to_string(), "BEARING_WEAR");
    }
}
