//! Register map for the MA600 sensor.

/// Expected contents of the [`Register::ProductId`] register
pub const PRODUCT_ID: u8 = 0x3C;

/// Register addresses for the MA600
///
/// A curated map of the documented registers; the angle itself is not a
/// register but a dedicated command (see [`crate::Ma600::angle`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u8)]
pub enum Register {
    /// Zero position low byte (Z[7:0])
    ZeroLow = 0x00,
    /// Zero position high byte (Z[15:8])
    ZeroHigh = 0x01,
    /// ABZ pulse count low bits and index pulse length (PPT[2:0] + ILIP[3:0])
    AbzIlip = 0x04,
    /// ABZ pulse count high bits (PPT[11:3])
    AbzPulses = 0x05,
    /// UVW number of pole pairs
    UvwPolePairs = 0x07,
    /// PWM output frequency and error detection
    PwmConfig = 0x08,
    /// Magnetic rotation direction (RD bit)
    RotationDirection = 0x09,
    /// I/O pin drive modes (open-drain/push-pull, CIPO idle state)
    IoMode = 0x0B,
    /// ABZ hysteresis
    AbzHysteresis = 0x0C,
    /// Digital filter window (FW[3:0])
    FilterWindow = 0x0D,
    /// I/O function mapping (ABZ/UVW/SSI/PWM)
    IoMap = 0x0E,
    /// Multiturn offset low byte
    MultiturnOffsetLow = 0x12,
    /// Multiturn offset high byte
    MultiturnOffsetHigh = 0x13,
    /// Status and sticky error flags (read-only)
    Status = 0x1A,
    /// Multiturn/speed mode and SPI parity configuration
    MultiturnSpeed = 0x1C,
    /// Configuration suffix code ("-xxxx"), read-only
    SuffixId = 0x1E,
    /// Product version identifier, read-only
    ProductId = 0x1F,
}

impl Register {
    /// 8-bit address of this register
    #[must_use]
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Whether writes to this register are documented as having no effect
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        address_is_read_only(self as u8)
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

/// Read-only classification by raw address, so the write policy also covers
/// addresses outside the curated [`Register`] map
pub(crate) const fn address_is_read_only(address: u8) -> bool {
    matches!(address, 0x1A | 0x1E | 0x1F)
}

/// Magnetic rotation direction considered positive by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise (factory default)
    Clockwise,
    /// Counter-clockwise
    CounterClockwise,
}

/// Digital filter window settings (FW[3:0])
///
/// Larger windows trade cutoff frequency for effective resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u8)]
pub enum FilterWindow {
    /// No filtering; 12.3-bit resolution, 17 kHz cutoff
    Window0 = 0x0,
    /// Factory default; 12.5-bit resolution, 12 kHz cutoff
    Window5 = 0x5,
    /// 13-bit resolution, 5.8 kHz cutoff
    Window6 = 0x6,
    /// 13.5-bit resolution, 2.7 kHz cutoff
    Window7 = 0x7,
    /// 14-bit resolution, 1.3 kHz cutoff
    Window8 = 0x8,
    /// 14.3-bit resolution, 0.63 kHz cutoff
    Window9 = 0x9,
    /// 14.6-bit resolution, 0.31 kHz cutoff
    Window10 = 0xA,
    /// 14.8-bit resolution, 0.15 kHz cutoff
    Window11 = 0xB,
    /// 15-bit resolution, 0.075 kHz cutoff
    Window12 = 0xC,
}

bitfield::bitfield! {
    /// STATUS
    ///
    /// NVMB indicates an NVM operation in flight; the error flags are sticky
    /// and persist until cleared with the clear-error command
    pub struct StatusRegister(u8);
    impl Debug;
    /// NVM busy: a store or restore is still running
    pub nvm_busy, _: 7;
    /// NVM restore failed its CRC check
    pub crc_error, _: 2;
    /// A command was issued while the NVM was busy
    pub memory_error, _: 1;
    /// SPI parity error
    pub parity_error, _: 0;
}

impl StatusRegister {
    /// Check whether any sticky error flag is latched
    #[must_use]
    #[inline(always)]
    pub fn has_sticky_errors(&self) -> bool {
        self.crc_error() || self.memory_error() || self.parity_error()
    }
}

bitfield::bitfield! {
    /// Rotation direction register
    pub struct RotationDirectionRegister(u8);
    impl Debug;
    /// Rotation direction: `0` = clockwise, `1` = counter-clockwise
    pub rd, set_rd: 7;
}

bitfield::bitfield! {
    /// Filter window register
    pub struct FilterWindowRegister(u8);
    impl Debug;
    u8;
    /// Filter window control bits
    pub fw, set_fw: 3, 0;
}
