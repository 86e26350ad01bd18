//! Linux userspace I2C
//!
//! Opens an `i2c-dev` character device (e.g. `/dev/i2c-1` on a Raspberry Pi)
//! through `linux-embedded-hal`.

use std::path::Path;

pub use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
pub use linux_embedded_hal::Delay;
use linux_embedded_hal::I2cdev;

use crate::i2c::EmbeddedHalBus;

/// Default bus device on Raspberry Pi boards
pub const DEFAULT_BUS_PATH: &str = "/dev/i2c-1";

/// I2C bus backed by a Linux `i2c-dev` device
pub type LinuxBus = EmbeddedHalBus<I2cdev>;

/// Open the given `i2c-dev` device
pub fn open<P: AsRef<Path>>(path: P) -> Result<LinuxBus, LinuxI2CError> {
    I2cdev::new(path).map(EmbeddedHalBus::new)
}
