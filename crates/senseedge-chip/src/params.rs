//! Parameter-memory layout and the loadable parameter set.
//!
//! The classifier is a two-layer fully-connected network, 8 inputs → 16
//! hidden (ReLU) → 4 outputs (argmax). Its parameter memory holds exactly
//! 212 signed 8-bit values in four contiguous regions; a value's memory
//! address equals its index in the flat sequence:
//!
//! ```text
//! [  0..=127]  layer-1 weights, 16×8 row-major (neuron-major)
//! [128..=143]  layer-1 biases
//! [144..=207]  layer-2 weights, 4×16 row-major
//! [208..=211]  layer-2 biases
//! ```

// Reinterpreting raw parameter bytes is two's complement by definition.
#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]

use core::fmt;

/// Classifier input width (one feature vector).
pub const INPUT_SIZE: usize = 8;

/// Hidden-layer width.
pub const HIDDEN_SIZE: usize = 16;

/// Output classes.
pub const OUTPUT_SIZE: usize = 4;

/// First layer-1 weight index.
pub const L1_WEIGHTS_START: usize = 0;

/// First layer-1 bias index.
pub const L1_BIASES_START: usize = 128;

/// First layer-2 weight index.
pub const L2_WEIGHTS_START: usize = 144;

/// First layer-2 bias index.
pub const L2_BIASES_START: usize = 208;

/// Total parameter count.
pub const TOTAL_PARAMS: usize = 212;

/// Flat index of layer-1 weight `[neuron][input]`.
#[must_use]
pub const fn l1_weight_index(neuron: usize, input: usize) -> usize {
    L1_WEIGHTS_START + neuron * INPUT_SIZE + input
}

/// Flat index of layer-2 weight `[class][hidden]`.
#[must_use]
pub const fn l2_weight_index(class: usize, hidden: usize) -> usize {
    L2_WEIGHTS_START + class * HIDDEN_SIZE + hidden
}

/// A byte source had the wrong length for a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongLength {
    /// Required length ([`TOTAL_PARAMS`]).
    pub expected: usize,
    /// Length actually supplied.
    pub actual: usize,
}

impl fmt::Display for WrongLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter set needs exactly {} values, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for WrongLength {}

/// The complete, ordered parameter set of the classifier.
///
/// Loaded once into the accelerator before the pipeline is enabled;
/// immutable thereafter (there is no runtime update path).
#[derive(Clone, PartialEq, Eq)]
pub struct ParameterSet {
    values: [i8; TOTAL_PARAMS],
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterSet({TOTAL_PARAMS} values)")
    }
}

impl ParameterSet {
    /// Wrap a complete flat parameter array.
    #[must_use]
    pub const fn new(values: [i8; TOTAL_PARAMS]) -> Self {
        Self { values }
    }

    /// All-zero parameters. Classifies everything as class 0 with
    /// confidence 0; useful as a blank slate.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            values: [0; TOTAL_PARAMS],
        }
    }

    /// The bring-up diagnostic pattern: all zeros except weight 127 on the
    /// layer-1 and layer-2 diagonals for the first four units, so each of
    /// the first four features routes straight through to one class.
    #[must_use]
    pub fn diagnostic() -> Self {
        let mut values = [0i8; TOTAL_PARAMS];
        for k in 0..OUTPUT_SIZE {
            values[l1_weight_index(k, k)] = 127;
            values[l2_weight_index(k, k)] = 127;
        }
        Self { values }
    }

    /// Build from a flat slice of exactly [`TOTAL_PARAMS`] values.
    ///
    /// # Errors
    ///
    /// Returns [`WrongLength`] if the slice is not exactly 212 entries.
    pub fn from_slice(values: &[i8]) -> Result<Self, WrongLength> {
        let arr: [i8; TOTAL_PARAMS] = values.try_into().map_err(|_| WrongLength {
            expected: TOTAL_PARAMS,
            actual: values.len(),
        })?;
        Ok(Self { values: arr })
    }

    /// Build from raw bytes, reinterpreted as two's-complement `i8`.
    ///
    /// # Errors
    ///
    /// Returns [`WrongLength`] if the slice is not exactly 212 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WrongLength> {
        if bytes.len() != TOTAL_PARAMS {
            return Err(WrongLength {
                expected: TOTAL_PARAMS,
                actual: bytes.len(),
            });
        }
        let mut values = [0i8; TOTAL_PARAMS];
        for (dst, &src) in values.iter_mut().zip(bytes) {
            *dst = src as i8;
        }
        Ok(Self { values })
    }

    /// The flat parameter array.
    #[must_use]
    pub const fn values(&self) -> &[i8; TOTAL_PARAMS] {
        &self.values
    }

    /// Iterate `(address, value)` pairs in ascending address order — the
    /// exact sequence the load protocol expects.
    pub fn iter_addressed(&self) -> impl Iterator<Item = (u8, i8)> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| (i as u8, v))
    }

    /// Layer-1 weight region, 16×8 row-major.
    #[must_use]
    pub fn l1_weights(&self) -> &[i8] {
        &self.values[L1_WEIGHTS_START..L1_BIASES_START]
    }

    /// Layer-1 biases, one per hidden neuron.
    #[must_use]
    pub fn l1_biases(&self) -> &[i8] {
        &self.values[L1_BIASES_START..L2_WEIGHTS_START]
    }

    /// Layer-2 weight region, 4×16 row-major.
    #[must_use]
    pub fn l2_weights(&self) -> &[i8] {
        &self.values[L2_WEIGHTS_START..L2_BIASES_START]
    }

    /// Layer-2 biases, one per class.
    #[must_use]
    pub fn l2_biases(&self) -> &[i8] {
        &self.values[L2_BIASES_START..TOTAL_PARAMS]
    }

    /// Layer-1 weight `[neuron][input]`.
    ///
    /// # Panics
    ///
    /// Panics if `neuron >= 16` or `input >= 8`.
    #[must_use]
    pub fn l1_weight(&self, neuron: usize, input: usize) -> i8 {
        assert!(neuron < HIDDEN_SIZE && input < INPUT_SIZE);
        self.values[l1_weight_index(neuron, input)]
    }

    /// Layer-2 weight `[class][hidden]`.
    ///
    /// # Panics
    ///
    /// Panics if `class >= 4` or `hidden >= 16`.
    #[must_use]
    pub fn l2_weight(&self, class: usize, hidden: usize) -> i8 {
        assert!(class < OUTPUT_SIZE && hidden < HIDDEN_SIZE);
        self.values[l2_weight_index(class, hidden)]
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_boundaries() {
        assert_eq!(L1_WEIGHTS_START, 0);
        assert_eq!(L1_BIASES_START, HIDDEN_SIZE * INPUT_SIZE);
        assert_eq!(L2_WEIGHTS_START, L1_BIASES_START + HIDDEN_SIZE);
        assert_eq!(L2_BIASES_START, L2_WEIGHTS_START + OUTPUT_SIZE * HIDDEN_SIZE);
        assert_eq!(TOTAL_PARAMS, L2_BIASES_START + OUTPUT_SIZE);
        assert_eq!(TOTAL_PARAMS, 212);
    }

    #[test]
    fn matrix_indexing_corners() {
        assert_eq!(l1_weight_index(0, 0), 0);
        assert_eq!(l1_weight_index(1, 1), 9);
        assert_eq!(l1_weight_index(15, 7), 127);
        assert_eq!(l2_weight_index(0, 0), 144);
        assert_eq!(l2_weight_index(1, 1), 161);
        assert_eq!(l2_weight_index(3, 15), 207);
    }

    #[test]
    fn diagnostic_pattern_positions() {
        let p = ParameterSet::diagnostic();
        let expected_hot = [0usize, 9, 18, 27, 144, 161, 178, 195];
        for (i, &v) in p.values().iter().enumerate() {
            if expected_hot.contains(&i) {
                assert_eq!(v, 127, "index {i}");
            } else {
                assert_eq!(v, 0, "index {i}");
            }
        }
    }

    #[test]
    fn from_bytes_is_twos_complement() {
        let mut bytes = [0u8; TOTAL_PARAMS];
        bytes[0] = 0x7F;
        bytes[1] = 0x80;
        bytes[2] = 0xFF;
        let p = ParameterSet::from_bytes(&bytes).unwrap();
        assert_eq!(p.values()[0], 127);
        assert_eq!(p.values()[1], -128);
        assert_eq!(p.values()[2], -1);
    }

    #[test]
    fn wrong_length_is_reported() {
        let err = ParameterSet::from_bytes(&[0u8; 211]).unwrap_err();
        assert_eq!(err.expected, 212);
        assert_eq!(err.actual, 211);
        assert!(ParameterSet::from_slice(&[0i8; 213]).is_err());
    }

    #[test]
    fn addressed_iteration_is_ascending_and_complete() {
        let p = ParameterSet::diagnostic();
        let pairs: Vec<(u8, i8)> = p.iter_addressed().collect();
        assert_eq!(pairs.len(), TOTAL_PARAMS);
        for (i, &(addr, value)) in pairs.iter().enumerate() {
            assert_eq!(usize::from(addr), i);
            assert_eq!(value, p.values()[i]);
        }
    }

    #[test]
    fn region_views_cover_everything_once() {
        let p = ParameterSet::diagnostic();
        let total = p.l1_weights().len()
            + p.l1_biases().len()
            + p.l2_weights().len()
            + p.l2_biases().len();
        assert_eq!(total, TOTAL_PARAMS);
        assert_eq!(p.l1_weight(1, 1), 127);
        assert_eq!(p.l2_weight(2, 2), 127);
        assert_eq!(p.l2_weight(2, 3), 0);
    }
}
