//! Parameter loading
//!
//! Streams a [`ParameterSet`] into the accelerator's parameter memory
//! through the write-only `NN_WEIGHTS` port, one packed word per value,
//! in ascending address order. The load is write-only by design; there
//! is no readback path, so correctness rests on the packing format and
//! the ordering contract.

use crate::bus::RegisterBus;
use crate::error::Result;
use senseedge_chip::params::ParameterSet;
use senseedge_chip::regs;
use std::path::Path;
use tracing::{debug, info};

/// Load operation summary
#[derive(Debug, Clone, Copy)]
pub struct LoadSummary {
    /// Packed words written to `NN_WEIGHTS`
    pub words_written: usize,

    /// Total duration
    pub elapsed: std::time::Duration,
}

/// Write a complete parameter set into the accelerator.
///
/// Every value is sent, including zeros: parameter memory has no reset
/// guarantee, so a full overwrite is the only way to a known state.
pub fn load_parameters<B: RegisterBus>(bus: &mut B, params: &ParameterSet) -> LoadSummary {
    let start = std::time::Instant::now();

    debug!(
        "Loading parameters: {} L1 weights, {} L1 biases, {} L2 weights, {} L2 biases",
        params.l1_weights().len(),
        params.l1_biases().len(),
        params.l2_weights().len(),
        params.l2_biases().len()
    );

    let mut words_written = 0;
    for (addr, value) in params.iter_addressed() {
        bus.write_word(regs::NN_WEIGHTS, regs::pack_weight_write(addr, value));
        words_written += 1;
    }

    let elapsed = start.elapsed();
    info!("✅ Parameters loaded: {words_written} words in {elapsed:?}");

    LoadSummary {
        words_written,
        elapsed,
    }
}

/// Read a parameter file: exactly 212 raw bytes, two's-complement `i8`,
/// in memory order (L1 weights, L1 biases, L2 weights, L2 biases).
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not exactly 212
/// bytes long.
pub fn read_parameter_file(path: &Path) -> Result<ParameterSet> {
    let bytes = std::fs::read(path)?;
    debug!("Read {} parameter bytes from {}", bytes.len(), path.display());

    let values: &[i8] = bytemuck::cast_slice(&bytes);
    Ok(ParameterSet::from_slice(values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::SimBus;
    use senseedge_chip::params::TOTAL_PARAMS;

    #[test]
    fn load_covers_every_address_in_order() {
        let mut bus = SimBus::new();
        let summary = load_parameters(&mut bus, &ParameterSet::diagnostic());

        assert_eq!(summary.words_written, TOTAL_PARAMS);
        assert_eq!(bus.weight_log().len(), TOTAL_PARAMS);
        for (i, &(addr, _)) in bus.weight_log().iter().enumerate() {
            assert_eq!(usize::from(addr), i);
        }
        assert_eq!(bus.params(), ParameterSet::diagnostic().values());
    }

    #[test]
    fn parameter_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "senseedge-params-{}.bin",
            std::process::id()
        ));

        let mut bytes = [0u8; TOTAL_PARAMS];
        bytes[0] = 0x7F; // 127
        bytes[1] = 0xFF; // -1
        bytes[211] = 0x80; // -128
        std::fs::write(&path, bytes).unwrap();

        let params = read_parameter_file(&path).unwrap();
        assert_eq!(params.values()[0], 127);
        assert_eq!(params.values()[1], -1);
        assert_eq!(params.values()[211], -128);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn short_parameter_file_is_rejected() {
        let path = std::env::temp_dir().join(format!(
            "senseedge-params-short-{}.bin",
            std::process::id()
        ));
        std::fs::write(&path, [0u8; 100]).unwrap();

        let err = read_parameter_file(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(err.to_string().contains("212"));
    }
}
