//! I2C bus abstractions
//!
//! Provides the write-only I2C master trait used by the LCD driver, plus an
//! adapter for any `embedded-hal` 1.0 I2C implementation.

/// Default 7-bit address of a PCF8574 LCD backpack
pub const PCF8574_DEFAULT_ADDR: u8 = 0x27;

/// Alternate address used by PCF8574A-based backpacks
pub const PCF8574A_DEFAULT_ADDR: u8 = 0x3F;

/// I2C bus master
///
/// Implementations are not required to be safe for concurrent use; the
/// driver funnels every write through a single thread.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, data)
    }
}

/// Adapter exposing an `embedded_hal::i2c::I2c` as an [`I2cBus`]
#[derive(Debug)]
pub struct EmbeddedHalBus<T> {
    inner: T,
}

impl<T> EmbeddedHalBus<T> {
    /// Wrap an embedded-hal I2C master
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Give back the wrapped I2C master
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> I2cBus for EmbeddedHalBus<T>
where
    T: embedded_hal::i2c::I2c,
{
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write(address, data)
    }
}
