//! Register bus abstraction
//!
//! Unified word-access contract for the accelerator's register window,
//! implemented by the real UIO mapping and by the behavioral simulator.

use crate::error::Result;
use std::fmt::Debug;

/// Word access to the accelerator's register window.
///
/// Access is infallible by contract: the window is memory-mapped, reads and
/// writes are word-atomic, and there is no bus-fault reporting. Reads take
/// `&mut self` because several registers have read side effects (the data
/// ports auto-increment their pointer).
pub trait RegisterBus: Debug + Send {
    /// Read the 32-bit register at `offset` (bytes from the window base).
    fn read_word(&mut self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset`.
    fn write_word(&mut self, offset: usize, value: u32);
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read_word(&mut self, offset: usize) -> u32 {
        (**self).read_word(offset)
    }

    fn write_word(&mut self, offset: usize, value: u32) {
        (**self).write_word(offset, value);
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_word(&mut self, offset: usize) -> u32 {
        (**self).read_word(offset)
    }

    fn write_word(&mut self, offset: usize, value: u32) {
        (**self).write_word(offset, value);
    }
}

/// Bus selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSelection {
    /// The real register window via UIO.
    Uio,
    /// The behavioral simulator (no hardware required).
    Sim,
}

/// Open a register bus.
///
/// For [`BusSelection::Uio`], discovers the SenseEdge window and opens the
/// device at `device_index` (first one when `None`). For
/// [`BusSelection::Sim`], returns a simulator pre-seeded with demo traffic.
///
/// # Errors
///
/// Returns an error if no window is present or the index is out of range.
pub fn select_bus(
    selection: BusSelection,
    device_index: Option<usize>,
) -> Result<Box<dyn RegisterBus>> {
    use crate::backends::SimBus;
    use crate::discovery::DeviceManager;

    match selection {
        BusSelection::Uio => {
            let mgr = DeviceManager::discover()?;
            let bus = match device_index {
                Some(index) => mgr.open(index)?,
                None => mgr.open_first()?,
            };
            tracing::info!("Using UIO bus for uio{}", bus.info().index);
            Ok(Box::new(bus))
        }
        BusSelection::Sim => {
            tracing::info!("Using simulated bus (no hardware)");
            Ok(Box::new(SimBus::with_demo_signal()))
        }
    }
}
