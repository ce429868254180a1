//! Runtime discovery of the SenseEdge register window
//!
//! The platform driver exports the Wishbone window as a UIO device. This
//! module scans `/sys/class/uio` for devices whose `name` matches, reads
//! map 0's size and physical address, and hands out openable descriptions.
//! No hardcoded device nodes — pure runtime discovery.

use crate::backends::uio::UioBus;
use crate::error::{Result, SenseEdgeError};
use std::path::{Path, PathBuf};

/// UIO device name exported by the platform driver.
pub const UIO_DEVICE_NAME: &str = "senseedge";

/// Fallback map size when sysfs does not report one (one page).
const DEFAULT_MAP_SIZE: usize = 0x1000;

/// Information about one discovered register window
#[derive(Debug, Clone)]
pub struct UioDeviceInfo {
    /// UIO number N (as in `/dev/uioN`)
    pub index: usize,

    /// Device name from sysfs
    pub name: String,

    /// Character device node (`/dev/uioN`)
    pub dev_path: PathBuf,

    /// Sysfs directory (`/sys/class/uio/uioN`)
    pub sysfs_path: PathBuf,

    /// Size of map 0 in bytes
    pub map_size: usize,

    /// Physical base address of map 0
    pub base_addr: usize,
}

/// Device manager for runtime discovery and access
#[derive(Debug)]
pub struct DeviceManager {
    devices: Vec<UioDeviceInfo>,
}

impl DeviceManager {
    /// Discover all SenseEdge windows on the system.
    ///
    /// # Errors
    ///
    /// Returns `SenseEdgeError::NoDevicesFound` if no matching UIO device
    /// exists.
    pub fn discover() -> Result<Self> {
        Self::discover_named(UIO_DEVICE_NAME)
    }

    /// Discover UIO devices whose exported name matches `name` exactly.
    ///
    /// # Errors
    ///
    /// Returns `SenseEdgeError::NoDevicesFound` if nothing matches.
    pub fn discover_named(name: &str) -> Result<Self> {
        Self::scan(Path::new("/sys/class/uio"), name)
    }

    fn scan(class_root: &Path, want: &str) -> Result<Self> {
        tracing::info!("Discovering SenseEdge devices...");

        let mut devices = Vec::new();

        let Ok(entries) = std::fs::read_dir(class_root) else {
            tracing::error!("Cannot read {} (no UIO support?)", class_root.display());
            return Err(SenseEdgeError::NoDevicesFound);
        };

        for entry in entries.flatten() {
            let sysfs_path = entry.path();
            let file_name = entry.file_name();
            let Some(index) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix("uio"))
                .and_then(|n| n.parse::<usize>().ok())
            else {
                continue;
            };

            let Ok(name) = std::fs::read_to_string(sysfs_path.join("name")) else {
                continue;
            };
            let name = name.trim();
            if name != want {
                tracing::debug!("Skipping uio{index} ({name})");
                continue;
            }

            let map0 = sysfs_path.join("maps").join("map0");
            let map_size = read_hex_sysfs(&map0.join("size")).unwrap_or(DEFAULT_MAP_SIZE);
            let base_addr = read_hex_sysfs(&map0.join("addr")).unwrap_or(0);

            tracing::info!("Device uio{index}: {name} @ {base_addr:#x} ({map_size:#x} bytes)");

            devices.push(UioDeviceInfo {
                index,
                name: name.to_string(),
                dev_path: PathBuf::from(format!("/dev/uio{index}")),
                sysfs_path,
                map_size,
                base_addr,
            });
        }

        if devices.is_empty() {
            tracing::error!("No SenseEdge devices found");
            return Err(SenseEdgeError::NoDevicesFound);
        }

        // Consistent ordering regardless of readdir order
        devices.sort_by_key(|d| d.index);

        tracing::info!("Discovered {} SenseEdge device(s)", devices.len());

        Ok(Self { devices })
    }

    /// Get number of discovered devices
    #[must_use]
    pub const fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Get slice of all devices, ordered by UIO number
    #[must_use]
    pub fn devices(&self) -> &[UioDeviceInfo] {
        &self.devices
    }

    /// Get device info by list position (0 = lowest UIO number)
    ///
    /// # Errors
    ///
    /// Returns `SenseEdgeError::InvalidIndex` if out of bounds.
    pub fn device(&self, index: usize) -> Result<&UioDeviceInfo> {
        self.devices.get(index).ok_or(SenseEdgeError::InvalidIndex {
            index,
            count: self.devices.len(),
        })
    }

    /// Open and map the device at list position `index`
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the node cannot be
    /// opened or mapped.
    pub fn open(&self, index: usize) -> Result<UioBus> {
        UioBus::open(self.device(index)?)
    }

    /// Open and map the first available device
    ///
    /// # Errors
    ///
    /// Returns an error if no devices are available or the open fails.
    pub fn open_first(&self) -> Result<UioBus> {
        let info = self.devices.first().ok_or(SenseEdgeError::NoDevicesFound)?;
        UioBus::open(info)
    }
}

/// Read a hexadecimal sysfs attribute (`0x30000000` style).
fn read_hex_sysfs(path: &Path) -> Option<usize> {
    let content = std::fs::read_to_string(path).ok()?;
    let trimmed = content.trim().trim_start_matches("0x");
    usize::from_str_radix(trimmed, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FakeClassRoot {
        root: PathBuf,
    }

    impl FakeClassRoot {
        fn new(tag: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "senseedge-uio-{}-{tag}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn add_device(&self, index: usize, name: &str, size: &str, addr: &str) {
            let dev = self.root.join(format!("uio{index}"));
            let map0 = dev.join("maps").join("map0");
            fs::create_dir_all(&map0).unwrap();
            fs::write(dev.join("name"), format!("{name}\n")).unwrap();
            fs::write(map0.join("size"), format!("{size}\n")).unwrap();
            fs::write(map0.join("addr"), format!("{addr}\n")).unwrap();
        }
    }

    impl Drop for FakeClassRoot {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn scan_finds_matching_devices_only() {
        let fake = FakeClassRoot::new("match");
        fake.add_device(3, "senseedge", "0x1000", "0x30000000");
        fake.add_device(1, "some-other-ip", "0x2000", "0x40000000");

        let mgr = DeviceManager::scan(&fake.root, "senseedge").unwrap();
        assert_eq!(mgr.device_count(), 1);

        let info = mgr.device(0).unwrap();
        assert_eq!(info.index, 3);
        assert_eq!(info.name, "senseedge");
        assert_eq!(info.dev_path, PathBuf::from("/dev/uio3"));
        assert_eq!(info.map_size, 0x1000);
        assert_eq!(info.base_addr, 0x3000_0000);
    }

    #[test]
    fn scan_orders_by_uio_number() {
        let fake = FakeClassRoot::new("order");
        fake.add_device(7, "senseedge", "0x1000", "0x30000000");
        fake.add_device(2, "senseedge", "0x1000", "0x30000000");

        let mgr = DeviceManager::scan(&fake.root, "senseedge").unwrap();
        let indices: Vec<usize> = mgr.devices().iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![2, 7]);
    }

    #[test]
    fn scan_with_no_match_is_an_error() {
        let fake = FakeClassRoot::new("nomatch");
        fake.add_device(0, "some-other-ip", "0x1000", "0x0");

        let err = DeviceManager::scan(&fake.root, "senseedge").unwrap_err();
        assert!(matches!(err, SenseEdgeError::NoDevicesFound));
    }

    #[test]
    fn invalid_index_is_reported_with_count() {
        let fake = FakeClassRoot::new("index");
        fake.add_device(0, "senseedge", "0x1000", "0x30000000");

        let mgr = DeviceManager::scan(&fake.root, "senseedge").unwrap();
        match mgr.device(5) {
            Err(SenseEdgeError::InvalidIndex { index, count }) => {
                assert_eq!(index, 5);
                assert_eq!(count, 1);
            }
            other => panic!("expected InvalidIndex, got {other:?}"),
        }
    }
}
