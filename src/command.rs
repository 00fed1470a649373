//! MA600 SPI command set (datasheet Table 5).
//!
//! Every command is a fixed sequence of 16-bit words that must be exchanged
//! while chip-select stays asserted. The builders here return the exact word
//! arrays; [`crate::Ma600`] sends each array through a single
//! `SpiDevice::transfer` so the whole sequence shares one bus transaction.

use crate::driver::NvmBlock;

/// Single-frame angle read; the reply arrives in the same frame.
pub(crate) const READ_ANGLE: u16 = 0x0000;
/// First frame of a register read; low byte carries the address.
pub(crate) const READ_REG_PREFIX: u16 = 0xD200;
/// First frame of a register write.
pub(crate) const WRITE_REG_HEADER: u16 = 0xEA54;
/// First frame of an NVM block store.
pub(crate) const NVM_STORE_HEADER: u16 = 0xEA55;
/// Second frame of an NVM store; low bit selects block 0 or 1.
pub(crate) const NVM_STORE_BLOCK_BASE: u16 = 0xEA00;
/// First frame of an NVM restore-all.
pub(crate) const NVM_RESTORE_HEADER: u16 = 0xEA56;
/// First frame of a clear-error-flags command.
pub(crate) const CLEAR_ERRORS_HEADER: u16 = 0xD700;
/// Dummy word clocked out while the device answers.
pub(crate) const NOP: u16 = 0x0000;

pub(crate) fn read_angle() -> [u16; 1] {
    [READ_ANGLE]
}

/// Two-frame angle read; the reply of interest is the second frame.
pub(crate) fn read_angle_two_frame() -> [u16; 2] {
    [READ_ANGLE, NOP]
}

/// Register read; the reply word arrives in the second frame, low 8 bits valid.
pub(crate) fn read_register(address: u8) -> [u16; 2] {
    [READ_REG_PREFIX | u16::from(address), NOP]
}

/// Register write; fire-and-forget, no reply word.
pub(crate) fn write_register(address: u8, value: u8) -> [u16; 3] {
    [
        WRITE_REG_HEADER,
        (u16::from(address) << 8) | u16::from(value),
        NOP,
    ]
}

/// NVM store for one register block; completion must be polled via STATUS.
pub(crate) fn nvm_store(block: NvmBlock) -> [u16; 3] {
    [NVM_STORE_HEADER, NVM_STORE_BLOCK_BASE | block as u16, NOP]
}

/// NVM restore of all register blocks; completion must be polled via STATUS.
pub(crate) fn nvm_restore() -> [u16; 2] {
    [NVM_RESTORE_HEADER, NOP]
}

pub(crate) fn clear_errors() -> [u16; 2] {
    [CLEAR_ERRORS_HEADER, NOP]
}
