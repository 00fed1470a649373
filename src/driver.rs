//! Driver for the MA600 magnetic position sensor

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use crate::{
    command,
    error::Error,
    register::{
        self, Direction, FilterWindow, FilterWindowRegister, Register, RotationDirectionRegister,
        StatusRegister,
    },
    utils,
};

/// Interval between STATUS polls while an NVM operation is in flight
pub const NVM_POLL_INTERVAL_MS: u32 = 1;

/// Default poll budget for NVM store/restore
///
/// The device's documented worst-case commit latency is a few tens of
/// milliseconds; 100 ms leaves margin on top of that
pub const NVM_DEFAULT_TIMEOUT_MS: u32 = 100;

/// Policy applied when a write targets a documented read-only register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritePolicy {
    /// Fail with [`Error::ReadOnlyRegister`] before any bus traffic
    #[default]
    RejectReadOnly,
    /// Forward the frame to the hardware unchecked
    Forward,
}

/// NVM register block selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum NvmBlock {
    /// Registers 0 through 31
    Block0 = 0,
    /// Registers 32 through 63
    Block1 = 1,
}

/// MA600 driver instance
///
/// Owns the SPI device and the delay source used by the NVM poll loop. The
/// MA600 exchanges 16-bit words and requires chip-select to stay asserted
/// across every frame of a command, so each operation here maps to exactly
/// one `SpiDevice::transfer` call
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ma600<SPI, D> {
    spi: SPI,
    delay: D,
    write_policy: WritePolicy,
}

impl<SPI, D, E> Ma600<SPI, D>
where
    SPI: SpiDevice<u16, Error = E>,
    D: DelayNs,
{
    /// Create a new MA600 driver instance
    pub fn new(spi: SPI, delay: D) -> Self {
        Self {
            spi,
            delay,
            write_policy: WritePolicy::RejectReadOnly,
        }
    }

    /// Set the policy for writes that target read-only registers
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Release the SPI device and delay source, consuming the driver
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    /// Exchange one command's frames in a single bus transaction
    fn exchange<const W: usize>(&mut self, tx: [u16; W]) -> Result<[u16; W], Error<E>> {
        let mut rx = [0u16; W];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(Error::Communication)?;
        Ok(rx)
    }

    /// Read the 16-bit raw angle with the single-frame command
    ///
    /// The device answers within the same frame, making this the cheapest
    /// read; full scale (65536 counts) is one revolution
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle(&mut self) -> Result<u16, Error<E>> {
        let rx = self.exchange(command::read_angle())?;
        Ok(rx[0])
    }

    /// Read the 16-bit raw angle with the two-frame command
    ///
    /// The reply of interest arrives in the second frame
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle_two_frame(&mut self) -> Result<u16, Error<E>> {
        let rx = self.exchange(command::read_angle_two_frame())?;
        Ok(rx[1])
    }

    /// Angle in degrees, `[0, 360)`
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle_degrees(&mut self) -> Result<f32, Error<E>> {
        Ok(utils::raw_to_degrees(self.angle()?))
    }

    /// Read a register, returning the full 16-bit reply word
    ///
    /// The reply arrives in the second frame; only its low 8 bits carry the
    /// register value. Use [`Self::read_register`] unless the raw word is
    /// needed
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn read_register_raw(&mut self, address: u8) -> Result<u16, Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("Reading register 0x{:02X}", address);

        let rx = self.exchange(command::read_register(address))?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Received response: 0x{:04X}", rx[1]);

        Ok(rx[1])
    }

    /// Read a register value
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_register(&mut self, register: Register) -> Result<u8, Error<E>> {
        let raw = self.read_register_raw(register.address())?;
        Ok((raw & 0x00FF) as u8)
    }

    /// Write a volatile register
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyRegister`] when the target is documented
    /// read-only and the policy is [`WritePolicy::RejectReadOnly`], or an
    /// error if SPI communication fails
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), Error<E>> {
        self.write_register_raw(register.address(), value)
    }

    /// Write a register by raw address
    ///
    /// The command is fire-and-forget; the device sends no reply word
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyRegister`] when the address is documented
    /// read-only and the policy is [`WritePolicy::RejectReadOnly`], or an
    /// error if SPI communication fails
    pub fn write_register_raw(&mut self, address: u8, value: u8) -> Result<(), Error<E>> {
        if self.write_policy == WritePolicy::RejectReadOnly
            && register::address_is_read_only(address)
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejected write to read-only register 0x{:02X}", address);
            return Err(Error::ReadOnlyRegister(address));
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Writing 0x{:02X} to register 0x{:02X}", value, address);

        self.exchange(command::write_register(address, value))?;
        Ok(())
    }

    fn modify_register<R>(
        &mut self,
        register: Register,
        f: impl FnOnce(&mut u8) -> R,
    ) -> Result<R, Error<E>> {
        let mut value = self.read_register(register)?;

        let result = f(&mut value);

        self.write_register(register, value)?;

        Ok(result)
    }

    /// Read the status register
    ///
    /// The sticky error flags stay latched until [`Self::clear_errors`]
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn status(&mut self) -> Result<StatusRegister, Error<E>> {
        self.read_register(Register::Status).map(StatusRegister)
    }

    /// Read the product version identifier
    ///
    /// Expected to match [`register::PRODUCT_ID`](crate::PRODUCT_ID)
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn product_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(Register::ProductId)
    }

    /// Read the configuration suffix code
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn suffix_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(Register::SuffixId)
    }

    /// Read the 16-bit zero position
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn zero_position(&mut self) -> Result<u16, Error<E>> {
        let low = self.read_register(Register::ZeroLow)?;
        let high = self.read_register(Register::ZeroHigh)?;

        Ok((u16::from(high) << 8) | u16::from(low))
    }

    /// Set the 16-bit zero position
    ///
    /// One count is 360/65536 degrees. The value only becomes persistent
    /// after [`Self::store_to_nvm`]
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_zero_position(&mut self, value: u16) -> Result<(), Error<E>> {
        self.write_register(Register::ZeroLow, (value & 0x00FF) as u8)?;
        self.write_register(Register::ZeroHigh, (value >> 8) as u8)?;

        Ok(())
    }

    /// Set the zero position from an angle in degrees
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn set_zero_position_degrees(&mut self, degrees: f32) -> Result<(), Error<E>> {
        self.set_zero_position(utils::degrees_to_raw(degrees))
    }

    /// Read the configured rotation direction
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn rotation_direction(&mut self) -> Result<Direction, Error<E>> {
        let reg = RotationDirectionRegister(self.read_register(Register::RotationDirection)?);

        Ok(if reg.rd() {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        })
    }

    /// Set the rotation direction, preserving the register's other bits
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn set_rotation_direction(&mut self, direction: Direction) -> Result<(), Error<E>> {
        self.modify_register(Register::RotationDirection, |v: &mut u8| {
            let mut reg = RotationDirectionRegister(*v);
            reg.set_rd(matches!(direction, Direction::CounterClockwise));
            *v = reg.0;
        })
    }

    /// Read the digital filter window setting (FW[3:0])
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn filter_window(&mut self) -> Result<u8, Error<E>> {
        let reg = FilterWindowRegister(self.read_register(Register::FilterWindow)?);
        Ok(reg.fw())
    }

    /// Set the digital filter window, preserving the register's other bits
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn set_filter_window(&mut self, window: FilterWindow) -> Result<(), Error<E>> {
        self.modify_register(Register::FilterWindow, |v: &mut u8| {
            let mut reg = FilterWindowRegister(*v);
            reg.set_fw(window as u8);
            *v = reg.0;
        })
    }

    /// Store one register block to non-volatile memory
    ///
    /// Issues the store command, then polls STATUS until the NVM busy flag
    /// clears or the default budget runs out
    ///
    /// # Errors
    ///
    /// Returns [`Error::NvmTimeout`] if the busy flag does not clear within
    /// [`NVM_DEFAULT_TIMEOUT_MS`], or an error if SPI communication fails
    pub fn store_to_nvm(&mut self, block: NvmBlock) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Storing NVM block {}", block as u16);

        self.exchange(command::nvm_store(block))?;
        self.wait_nvm_ready(NVM_DEFAULT_TIMEOUT_MS)
    }

    /// Restore all register blocks from non-volatile memory
    ///
    /// # Errors
    ///
    /// Returns [`Error::NvmTimeout`] if the busy flag does not clear within
    /// [`NVM_DEFAULT_TIMEOUT_MS`], or an error if SPI communication fails
    pub fn restore_from_nvm(&mut self) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Restoring registers from NVM");

        self.exchange(command::nvm_restore())?;
        self.wait_nvm_ready(NVM_DEFAULT_TIMEOUT_MS)
    }

    /// Poll STATUS until the NVM busy flag clears
    ///
    /// Reads STATUS up to `timeout_ms / NVM_POLL_INTERVAL_MS` times with one
    /// poll interval of delay between attempts. Never reissues the command
    /// that started the NVM operation
    ///
    /// # Errors
    ///
    /// Returns [`Error::NvmTimeout`] once the poll budget is exhausted, or an
    /// error if SPI communication fails
    pub fn wait_nvm_ready(&mut self, timeout_ms: u32) -> Result<(), Error<E>> {
        let attempts = timeout_ms / NVM_POLL_INTERVAL_MS;

        for _ in 0..attempts {
            if !self.status()?.nvm_busy() {
                return Ok(());
            }
            self.delay.delay_ms(NVM_POLL_INTERVAL_MS);
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("NVM still busy after {} ms", timeout_ms);

        Err(Error::NvmTimeout)
    }

    /// Clear the sticky error flags in the status register
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn clear_errors(&mut self) -> Result<(), Error<E>> {
        self.exchange(command::clear_errors())?;
        Ok(())
    }
}
