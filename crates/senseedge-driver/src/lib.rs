//! Pure Rust driver for the SenseEdge vibration-monitoring accelerator.
//!
//! SenseEdge is a single-window memory-mapped device: ADC capture, FFT,
//! feature extraction, and an INT8 classifier behind nine registers. This
//! crate provides the full host stack for it. No vendor blobs, no shell
//! scripts.
//!
//! # Bus hierarchy
//!
//! ```text
//! Hardware:
//!   UioBus — register window of /dev/uioN via UIO mmap
//!
//! Development:
//!   SimBus — behavioral model of the full pipeline (cycle timing,
//!            INT8 classifier, alarm accumulator)
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use senseedge_driver::{DeviceManager, ParameterSet, PipelineController};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mgr = DeviceManager::discover()?;
//! let bus = mgr.open_first()?;
//!
//! let mut pipeline = PipelineController::new(bus);
//! pipeline.configure(&ParameterSet::diagnostic())?;
//! pipeline.enable()?;
//!
//! let outcome = pipeline.poll_cycle()?;
//! println!("{} (confidence {})", outcome.class, outcome.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Bring-up reference values
//!
//! | Setting | Value |
//! |---------|-------|
//! | ADC clock divider | 250 (25 MHz core → 100 kHz SPI) |
//! | Alarm threshold | confidence 150 |
//! | Consecutive faults | 3 |
//! | Poll budget | 1,000,000 reads/cycle |
//! | Telemetry | 115200 baud, 8N1, CRLF lines |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
mod bus;
mod discovery;
mod error;
mod loading;
mod pipeline;
mod report;
mod serial;
pub mod setup;

/// Register map and chip-level definitions (re-exported from senseedge-chip).
pub mod chip {
    pub use senseedge_chip::class::FaultClass;
    pub use senseedge_chip::features::FEATURE_NAMES;
    pub use senseedge_chip::params::{
        l1_weight_index, l2_weight_index, ParameterSet, WrongLength, HIDDEN_SIZE, INPUT_SIZE,
        OUTPUT_SIZE, TOTAL_PARAMS,
    };
    pub use senseedge_chip::pins;
    pub use senseedge_chip::regs;
}

pub use backends::{SimBus, UioBus};
pub use bus::{select_bus, BusSelection, RegisterBus};
pub use discovery::{DeviceManager, UioDeviceInfo, UIO_DEVICE_NAME};
pub use error::{Result, SenseEdgeError};
pub use loading::{load_parameters, read_parameter_file, LoadSummary};
pub use pipeline::{
    ControllerState, CycleOutcome, PipelineConfig, PipelineController, StatusSnapshot,
};
pub use report::{Reporter, ALARM_BANNER, BANNER_LINE_1, BANNER_LINE_2, TIMEOUT_WARNING};
pub use serial::{
    decode_frames, decode_to_string, CaptureLine, GpioTxLine, SerialTiming, TxLine, UartTx,
};

pub use senseedge_chip::class::FaultClass;
pub use senseedge_chip::params::ParameterSet;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        select_bus, BusSelection, CycleOutcome, DeviceManager, FaultClass, ParameterSet,
        PipelineConfig, PipelineController, RegisterBus, Reporter, Result, SenseEdgeError,
        SerialTiming, SimBus, StatusSnapshot, UartTx,
    };
}
