//! Board pin setup
//!
//! Configures the seven user-IO pins for their runtime roles (ADC serial
//! link, alarm output, status LED, telemetry UART) through sysfs GPIO,
//! replacing the shell scripts a bring-up bench would otherwise need.
//!
//! Pin roles and directions come from [`senseedge_chip::pins`]; this
//! module only maps them onto a host GPIO controller at some base offset.

use anyhow::{Context, Result};
use senseedge_chip::pins::{PinAssignment, PinDirection, PIN_ASSIGNMENTS, UART_TX};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// GPIO number of user-IO pin 0 when no override is given.
pub const DEFAULT_GPIO_BASE: u32 = 0;

/// Applies one pin assignment to a host GPIO controller
pub trait PinConfigurer {
    /// Configure the pin for its role.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying controller rejects the
    /// configuration.
    fn apply(&mut self, assignment: &PinAssignment) -> Result<()>;
}

/// Drives the full pin bring-up sequence
pub struct BoardSetup {
    gpio_base: u32,
}

impl BoardSetup {
    /// Base from the `SENSEEDGE_GPIO_BASE` environment variable, falling
    /// back to [`DEFAULT_GPIO_BASE`].
    #[must_use]
    pub fn new() -> Self {
        let gpio_base = std::env::var("SENSEEDGE_GPIO_BASE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_GPIO_BASE);
        Self { gpio_base }
    }

    /// Explicit GPIO base.
    #[must_use]
    pub const fn with_base(gpio_base: u32) -> Self {
        Self { gpio_base }
    }

    /// GPIO number of user-IO pin 0
    #[must_use]
    pub const fn gpio_base(&self) -> u32 {
        self.gpio_base
    }

    /// Configure every user-IO pin, in pin order.
    ///
    /// # Errors
    ///
    /// Returns the first configuration failure, naming the pin and role.
    pub fn run(&self, configurer: &mut impl PinConfigurer) -> Result<()> {
        info!("SenseEdge board setup (GPIO base {})", self.gpio_base);

        for assignment in &PIN_ASSIGNMENTS {
            debug!(
                "Pin {}: {} ({:?})",
                assignment.pin, assignment.role, assignment.direction
            );
            configurer.apply(assignment).with_context(|| {
                format!("configuring {} (pin {})", assignment.role, assignment.pin)
            })?;
        }

        info!(
            "Board setup complete: {} pins configured",
            PIN_ASSIGNMENTS.len()
        );
        Ok(())
    }
}

impl Default for BoardSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// Sysfs GPIO controller at a base offset
///
/// User-IO pin N maps to `/sys/class/gpio/gpio{base+N}`.
pub struct SysfsGpio {
    root: PathBuf,
    base: u32,
}

impl SysfsGpio {
    /// Controller under the standard `/sys/class/gpio` tree.
    #[must_use]
    pub fn new(base: u32) -> Self {
        Self::at(Path::new("/sys/class/gpio"), base)
    }

    /// Controller under an alternate tree.
    #[must_use]
    pub fn at(root: &Path, base: u32) -> Self {
        Self {
            root: root.to_path_buf(),
            base,
        }
    }

    /// GPIO number for a user-IO pin
    #[must_use]
    pub const fn gpio_number(&self, pin: u8) -> u32 {
        self.base + pin as u32
    }

    /// GPIO number of the telemetry TX pin
    #[must_use]
    pub const fn tx_gpio(&self) -> u32 {
        self.gpio_number(UART_TX)
    }

    fn gpio_dir(&self, gpio: u32) -> PathBuf {
        self.root.join(format!("gpio{gpio}"))
    }

    /// Export a GPIO if its directory is not already present.
    fn export(&self, gpio: u32) -> Result<()> {
        if self.gpio_dir(gpio).exists() {
            debug!("gpio{gpio} already exported");
            return Ok(());
        }

        let export = self.root.join("export");
        fs::write(&export, gpio.to_string())
            .with_context(|| format!("writing {gpio} to {}", export.display()))?;

        // udev takes a moment to materialize the attribute files
        let direction = self.gpio_dir(gpio).join("direction");
        for _ in 0..50 {
            if direction.exists() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        anyhow::bail!("gpio{gpio} exported but {} never appeared", direction.display());
    }
}

const fn sysfs_direction(direction: PinDirection) -> &'static str {
    match direction {
        PinDirection::Input => "in",
        PinDirection::Output => "out",
    }
}

impl PinConfigurer for SysfsGpio {
    fn apply(&mut self, assignment: &PinAssignment) -> Result<()> {
        let gpio = self.gpio_number(assignment.pin);
        self.export(gpio)?;

        let direction = self.gpio_dir(gpio).join("direction");
        fs::write(&direction, sysfs_direction(assignment.direction))
            .with_context(|| format!("writing direction of gpio{gpio}"))?;

        debug!(
            "Pin {} -> gpio{gpio} ({})",
            assignment.pin,
            sysfs_direction(assignment.direction)
        );
        Ok(())
    }
}
