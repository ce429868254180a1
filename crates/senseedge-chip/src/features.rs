//! The fixed feature vector computed by the extraction stage.
//!
//! Eight bytes per frame, in memory order behind the `FEATURE_DATA` port:
//!
//! | Index | Feature | Source |
//! |-------|---------|--------|
//! | 0 | band energy low | bins 1-4 |
//! | 1 | band energy mid-low | bins 5-10 |
//! | 2 | band energy mid-high | bins 11-20 |
//! | 3 | band energy high | bins 21-31 |
//! | 4 | peak frequency | argmax bin, scaled `<< 3` |
//! | 5 | peak magnitude | spectrum value at the peak bin |
//! | 6 | spectral centroid | magnitude-weighted mean bin, scaled `<< 3` |
//! | 7 | total energy | sum over all bins |
//!
//! Bin 0 (DC) is excluded from the band energies. Every feature is
//! saturated to `0..=255`.

use crate::regs::FEATURE_COUNT;

/// Feature names, in memory order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "band energy low",
    "band energy mid-low",
    "band energy mid-high",
    "band energy high",
    "peak frequency",
    "peak magnitude",
    "spectral centroid",
    "total energy",
];
