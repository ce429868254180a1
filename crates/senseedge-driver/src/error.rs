//! Error types for SenseEdge driver operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, SenseEdgeError>;

/// Errors that can occur while acquiring or driving the accelerator.
///
/// Register access itself is infallible (the window is memory-mapped and
/// word-atomic); these cover host-side resource acquisition and misuse of
/// the controller state machine.
#[derive(Debug, Error)]
pub enum SenseEdgeError {
    /// Device node not found at the expected path
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// No SenseEdge register window detected on the system
    #[error("No SenseEdge devices detected")]
    NoDevicesFound,

    /// Device index out of range
    #[error("Device index {index} out of range (have {count} devices)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of available devices
        count: usize,
    },

    /// I/O error during device access
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Mapping the register window failed
    #[error("Failed to map register window: {reason}")]
    MapFailed {
        /// Reason for failure
        reason: String,
    },

    /// Controller is in the wrong state for the requested operation
    #[error("Controller in invalid state: {state}")]
    InvalidState {
        /// What was attempted, and when
        state: String,
    },

    /// A parameter source held the wrong number of values
    #[error("Parameter set holds {actual} values, need exactly {expected}")]
    ParameterCount {
        /// Required count
        expected: usize,
        /// Count actually supplied
        actual: usize,
    },

    /// GPIO access failed
    #[error("gpio{pin}: {reason}")]
    Gpio {
        /// Global GPIO number
        pin: u32,
        /// Reason for failure
        reason: String,
    },
}

impl SenseEdgeError {
    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create a map failed error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::MapFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(state: impl Into<String>) -> Self {
        Self::InvalidState {
            state: state.into(),
        }
    }

    /// Create a GPIO error
    pub fn gpio(pin: u32, reason: impl Into<String>) -> Self {
        Self::Gpio {
            pin,
            reason: reason.into(),
        }
    }
}

impl From<senseedge_chip::params::WrongLength> for SenseEdgeError {
    fn from(e: senseedge_chip::params::WrongLength) -> Self {
        Self::ParameterCount {
            expected: e.expected,
            actual: e.actual,
        }
    }
}
