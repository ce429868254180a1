//! Memory-mapped register access through UIO
//!
//! The kernel's UIO framework exposes the SenseEdge Wishbone window as
//! `/dev/uioN` with the register block as map 0. Mapping it gives direct
//! load/store access to the registers listed in [`senseedge_chip::regs`].

// MMIO registers are naturally word-aligned by hardware, so the pointer
// casts below cannot misalign
#![allow(clippy::cast_ptr_alignment)]

use crate::bus::RegisterBus;
use crate::discovery::UioDeviceInfo;
use crate::error::{Result, SenseEdgeError};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;

/// Memory-mapped register window
///
/// Wraps the raw mapping with bounds-checked volatile accessors and
/// unmaps on drop.
pub struct MappedRegion {
    /// Memory-mapped pointer
    ptr: *mut u8,
    /// Size of the mapping
    size: usize,
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .finish()
    }
}

// SAFETY: Send - MappedRegion owns the mapping exclusively. Moving between
// threads doesn't invalidate it (mmap'd memory is process-wide). No
// thread-local state.
unsafe impl Send for MappedRegion {}

// SAFETY: Sync - accesses are volatile word loads/stores that the bus
// serializes; a shared reference cannot split a word access.
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Map `size` bytes of a UIO device's map 0.
    ///
    /// UIO places map N at file offset `N * page_size`; map 0 is at 0.
    ///
    /// # Errors
    ///
    /// Returns `SenseEdgeError::MapFailed` if the mmap call fails.
    pub fn map(device: &File, size: usize) -> Result<Self> {
        // SAFETY: mmap necessary for MMIO - maps the register window into
        // the process address space. Invariants: (1) device is an open UIO
        // node; (2) offset 0 selects map 0; (3) ptr valid for size bytes
        // or Err. Caller guarantees: size is the map0 size from sysfs.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                device.as_fd(),
                0,
            )
            .map_err(|e| SenseEdgeError::map_failed(format!("mmap of register window: {e}")))?
        };

        tracing::debug!("Mapped register window at {:p}, size={:#x}", ptr, size);

        Ok(Self {
            ptr: ptr.cast(),
            size,
        })
    }

    /// Read a 32-bit register
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the mapped region size.
    #[must_use]
    pub fn read32(&self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size, "Register offset out of bounds");
        // SAFETY: read_volatile necessary for MMIO - hardware can change the
        // value, and reads of the data-port registers have side effects.
        // Invariants: (1) ptr from mmap in map(), valid for self.size;
        // (2) offset+4 <= size; (3) u32 aligned. Caller guarantees: offset
        // in bounds.
        unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u32>()) }
    }

    /// Write a 32-bit register
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the mapped region size.
    pub fn write32(&self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.size, "Register offset out of bounds");
        // SAFETY: write_volatile necessary for MMIO - triggers hardware side
        // effects. Invariants: (1) ptr from mmap; (2) offset+4 <= size;
        // (3) u32 aligned. Caller guarantees: offset in bounds.
        unsafe {
            std::ptr::write_volatile(self.ptr.add(offset).cast::<u32>(), value);
        }
    }

    /// Get region size
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: munmap necessary - returns the mapping before the fd
        // closes. Invariants: (1) ptr+size were previously mapped in map();
        // (2) Drop runs at most once; (3) no outstanding refs.
        unsafe {
            // Ignore error in Drop (can't propagate, would need to log)
            let _ = munmap(self.ptr.cast(), self.size);
        }
        tracing::debug!("Unmapped register window");
    }
}

/// Register bus backed by a mapped UIO device
#[derive(Debug)]
pub struct UioBus {
    region: MappedRegion,
    info: UioDeviceInfo,
    /// Keeps `/dev/uioN` open for the lifetime of the mapping
    _device: File,
}

impl UioBus {
    /// Open `/dev/uioN` for the given device and map its register window.
    ///
    /// # Errors
    ///
    /// Returns an error if the device node cannot be opened (missing node,
    /// permissions) or the window cannot be mapped.
    pub fn open(info: &UioDeviceInfo) -> Result<Self> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&info.dev_path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SenseEdgeError::device_not_found(&info.dev_path)
                } else {
                    SenseEdgeError::Io { source: e }
                }
            })?;

        let region = MappedRegion::map(&device, info.map_size)?;

        tracing::info!(
            "Opened uio{} ({}) @ {:#x}",
            info.index,
            info.name,
            info.base_addr
        );

        Ok(Self {
            region,
            info: info.clone(),
            _device: device,
        })
    }

    /// Info for the underlying device
    #[must_use]
    pub const fn info(&self) -> &UioDeviceInfo {
        &self.info
    }
}

impl RegisterBus for UioBus {
    fn read_word(&mut self, offset: usize) -> u32 {
        self.region.read32(offset)
    }

    fn write_word(&mut self, offset: usize, value: u32) {
        self.region.write32(offset, value);
    }
}
