//! Filtered encoder session over the MA600 driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use crate::{
    driver::{Ma600, NvmBlock},
    error::Error,
    filter::CircularAngleFilter,
    register::{Register, StatusRegister},
};

/// One encoder instance: a [`Ma600`] driver, a wrap-safe angle filter, and
/// the most recent filtered reading
///
/// All operations borrow the instance mutably, so sharing one encoder across
/// threads requires external serialization
#[derive(Debug)]
pub struct Encoder<SPI, D> {
    driver: Ma600<SPI, D>,
    filter: CircularAngleFilter,
    last_angle: f32,
}

impl<SPI, D, E> Encoder<SPI, D>
where
    SPI: SpiDevice<u16, Error = E>,
    D: DelayNs,
{
    /// Create a session over an already-constructed driver
    ///
    /// `alpha` is the smoothing coefficient applied to both angle
    /// components, 0 < alpha < 1
    pub fn new(driver: Ma600<SPI, D>, alpha: f32) -> Self {
        Self {
            driver,
            filter: CircularAngleFilter::new(alpha),
            last_angle: 0.0,
        }
    }

    /// Read the angle, run it through the wrap-safe filter, and cache the
    /// result
    ///
    /// On failure the error propagates unchanged; the cached angle keeps its
    /// previous value and is never substituted for the failed read
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle_degrees(&mut self) -> Result<f32, Error<E>> {
        let raw = self.driver.angle_degrees()?;
        self.last_angle = self.filter.update(raw);
        Ok(self.last_angle)
    }

    /// Read the raw 16-bit angle, bypassing the filter
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle_raw(&mut self) -> Result<u16, Error<E>> {
        self.driver.angle()
    }

    /// Last successfully filtered angle in degrees (0.0 before the first
    /// read)
    #[must_use]
    pub const fn last_angle_degrees(&self) -> f32 {
        self.last_angle
    }

    /// Change the filter coefficient without resetting its state
    pub const fn set_filter_alpha(&mut self, alpha: f32) {
        self.filter.set_alpha(alpha);
    }

    /// Make the next filtered read snap to its input
    pub const fn reset_filter(&mut self) {
        self.filter.reset();
    }

    /// Read a register value
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn read_register(&mut self, register: Register) -> Result<u8, Error<E>> {
        self.driver.read_register(register)
    }

    /// Write a volatile register
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyRegister`] for rejected read-only targets,
    /// or an error if SPI communication fails
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), Error<E>> {
        self.driver.write_register(register, value)
    }

    /// Read the status register
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn status(&mut self) -> Result<StatusRegister, Error<E>> {
        self.driver.status()
    }

    /// Store one register block to non-volatile memory and wait for
    /// completion
    ///
    /// # Errors
    ///
    /// Returns [`Error::NvmTimeout`] if the device stays busy past the
    /// default budget, or an error if SPI communication fails
    pub fn store_to_nvm(&mut self, block: NvmBlock) -> Result<(), Error<E>> {
        self.driver.store_to_nvm(block)
    }

    /// Restore all register blocks from non-volatile memory and wait for
    /// completion
    ///
    /// # Errors
    ///
    /// Returns [`Error::NvmTimeout`] if the device stays busy past the
    /// default budget, or an error if SPI communication fails
    pub fn restore_from_nvm(&mut self) -> Result<(), Error<E>> {
        self.driver.restore_from_nvm()
    }

    /// Clear the sticky error flags
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn clear_errors(&mut self) -> Result<(), Error<E>> {
        self.driver.clear_errors()
    }

    /// Poll until the NVM busy flag clears
    ///
    /// # Errors
    ///
    /// Returns [`Error::NvmTimeout`] once the budget is exhausted, or an
    /// error if SPI communication fails
    pub fn wait_nvm_ready(&mut self, timeout_ms: u32) -> Result<(), Error<E>> {
        self.driver.wait_nvm_ready(timeout_ms)
    }

    /// Access the underlying driver
    pub const fn driver(&self) -> &Ma600<SPI, D> {
        &self.driver
    }

    /// Mutably access the underlying driver
    pub fn driver_mut(&mut self) -> &mut Ma600<SPI, D> {
        &mut self.driver
    }

    /// Release the underlying driver, consuming the session
    pub fn release(self) -> Ma600<SPI, D> {
        self.driver
    }
}
