//! Silicon model for the SenseEdge vibration-analysis ASIC.
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the silicon: the Wishbone register map, packed bit-field
//! encodings, the classifier's parameter-memory layout, fault-class labels,
//! and the fixed pin assignment.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Register map — offsets, bit definitions, packed-field helpers |
//! | [`params`] | Parameter-memory layout and the 212-entry [`params::ParameterSet`] |
//! | [`class`] | Fault classes and their wire-protocol names |
//! | [`features`] | The fixed feature vector of the extraction stage |
//! | [`pins`] | Fixed pin assignment table |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod class;
pub mod features;
pub mod params;
pub mod pins;
pub mod regs;
