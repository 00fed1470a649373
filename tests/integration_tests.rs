//! Integration tests for the MA600 driver using mocked SPI.

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use ma600::{Direction, Encoder, Error, FilterWindow, Ma600, NvmBlock, Register, WritePolicy};

/// Helper to build the expectations for one command: a single transaction
/// whose chip-select spans every frame of the word batch.
fn command_exchange(tx: &[u16], rx: &[u16]) -> [SpiTransaction<u16>; 3] {
    [
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(tx.to_vec(), rx.to_vec()),
        SpiTransaction::transaction_end(),
    ]
}

/// Expectations for one STATUS register read returning `status`.
fn status_poll(status: u8) -> [SpiTransaction<u16>; 3] {
    command_exchange(&[0xD21A, 0x0000], &[0x0000, u16::from(status)])
}

const NVM_BUSY: u8 = 0x80;

#[test]
fn reads_angle_single_frame() {
    let expectations = command_exchange(&[0x0000], &[0x1234]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let angle = sensor.angle().unwrap();
    assert_eq!(angle, 0x1234);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn reads_angle_two_frame() {
    // The reply of interest is the second frame; the first frame's reply is
    // stale and must be ignored.
    let expectations = command_exchange(&[0x0000, 0x0000], &[0xFFFF, 0x8001]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let angle = sensor.angle_two_frame().unwrap();
    assert_eq!(angle, 0x8001);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn converts_angle_to_degrees() {
    let mut expectations = Vec::new();
    expectations.extend_from_slice(&command_exchange(&[0x0000], &[0x0000]));
    expectations.extend_from_slice(&command_exchange(&[0x0000], &[0x8000]));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let zero = sensor.angle_degrees().unwrap();
    assert!(zero.abs() < 1e-4);

    let half_turn = sensor.angle_degrees().unwrap();
    assert!((half_turn - 180.0).abs() < 1e-4);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn reads_multiple_angles_sequentially() {
    let angles = [0x0000, 0x1000, 0x2000, 0x3000];
    let mut expectations = Vec::new();

    for &angle_value in &angles {
        expectations.extend_from_slice(&command_exchange(&[0x0000], &[angle_value]));
    }

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    for &expected_angle in &angles {
        let angle = sensor.angle().unwrap();
        assert_eq!(angle, expected_angle);
    }

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn reads_product_id_register() {
    // Read register: [0xD200 | addr, NOP], value in the low byte of the
    // second reply word; the upper byte must be masked off.
    let expectations = command_exchange(&[0xD21F, 0x0000], &[0x0000, 0x013C]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let id = sensor.product_id().unwrap();
    assert_eq!(id, 0x3C);
    assert_eq!(id, ma600::PRODUCT_ID);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn reads_register_raw_keeps_full_reply_word() {
    let expectations = command_exchange(&[0xD21A, 0x0000], &[0x0000, 0xAB85]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let raw = sensor.read_register_raw(0x1A).unwrap();
    assert_eq!(raw, 0xAB85);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn writes_register_with_exact_frames() {
    // Write register: [0xEA54, (addr << 8) | value, NOP], fire-and-forget.
    let expectations = command_exchange(&[0xEA54, 0x0980, 0x0000], &[0x0000, 0x0000, 0x0000]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor
        .write_register(Register::RotationDirection, 0x80)
        .unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn rejects_write_to_read_only_register() {
    // No expectations: the rejection must happen before any bus traffic.
    let spi = SpiMock::<u16>::new(&[]);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let result = sensor.write_register(Register::ProductId, 0xAA);
    assert_eq!(result, Err(Error::ReadOnlyRegister(0x1F)));

    let result = sensor.write_register_raw(0x1A, 0x00);
    assert_eq!(result, Err(Error::ReadOnlyRegister(0x1A)));

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn forwards_read_only_write_when_policy_allows() {
    let expectations = command_exchange(&[0xEA54, 0x1A05, 0x0000], &[0x0000, 0x0000, 0x0000]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new()).with_write_policy(WritePolicy::Forward);

    sensor.write_register(Register::Status, 0x05).unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn decodes_status_flags() {
    let expectations = status_poll(0x85);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let status = sensor.status().unwrap();
    assert!(status.nvm_busy());
    assert!(status.crc_error());
    assert!(!status.memory_error());
    assert!(status.parity_error());
    assert!(status.has_sticky_errors());

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn stores_nvm_block_and_polls_until_ready() {
    let mut expectations = Vec::new();
    // Store block 0: [0xEA55, 0xEA00, NOP].
    expectations.extend_from_slice(&command_exchange(
        &[0xEA55, 0xEA00, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));
    // Two polls read NVMB still set, the third reads it clear.
    expectations.extend_from_slice(&status_poll(NVM_BUSY));
    expectations.extend_from_slice(&status_poll(NVM_BUSY));
    expectations.extend_from_slice(&status_poll(0x00));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.store_to_nvm(NvmBlock::Block0).unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn stores_second_nvm_block() {
    let mut expectations = Vec::new();
    expectations.extend_from_slice(&command_exchange(
        &[0xEA55, 0xEA01, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));
    expectations.extend_from_slice(&status_poll(0x00));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.store_to_nvm(NvmBlock::Block1).unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn restores_nvm_and_polls_until_ready() {
    let mut expectations = Vec::new();
    // Restore all: [0xEA56, NOP].
    expectations.extend_from_slice(&command_exchange(&[0xEA56, 0x0000], &[0x0000, 0x0000]));
    expectations.extend_from_slice(&status_poll(NVM_BUSY));
    expectations.extend_from_slice(&status_poll(0x00));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.restore_from_nvm().unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn nvm_wait_times_out_after_budget() {
    // A 3 ms budget at the 1 ms poll interval allows exactly three status
    // reads; the device never reports idle.
    let mut expectations = Vec::new();
    for _ in 0..3 {
        expectations.extend_from_slice(&status_poll(NVM_BUSY));
    }

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    let result = sensor.wait_nvm_ready(3);
    assert_eq!(result, Err(Error::NvmTimeout));

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn nvm_wait_returns_immediately_when_idle() {
    let expectations = status_poll(0x00);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.wait_nvm_ready(100).unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn clears_error_flags() {
    let expectations = command_exchange(&[0xD700, 0x0000], &[0x0000, 0x0000]);

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.clear_errors().unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn reads_and_sets_zero_position() {
    let mut expectations = Vec::new();
    // set_zero_position(0x0E39): Z[7:0] to register 0x00, Z[15:8] to 0x01.
    expectations.extend_from_slice(&command_exchange(
        &[0xEA54, 0x0039, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));
    expectations.extend_from_slice(&command_exchange(
        &[0xEA54, 0x010E, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));
    // zero_position(): read both byte registers back.
    expectations.extend_from_slice(&command_exchange(&[0xD200, 0x0000], &[0x0000, 0x0039]));
    expectations.extend_from_slice(&command_exchange(&[0xD201, 0x0000], &[0x0000, 0x000E]));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.set_zero_position(0x0E39).unwrap();
    assert_eq!(sensor.zero_position().unwrap(), 0x0E39);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn sets_zero_position_from_degrees() {
    // 20 degrees is 20 * 65536 / 360 = 3640.9, rounding to 0x0E39.
    let mut expectations = Vec::new();
    expectations.extend_from_slice(&command_exchange(
        &[0xEA54, 0x0039, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));
    expectations.extend_from_slice(&command_exchange(
        &[0xEA54, 0x010E, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.set_zero_position_degrees(20.0).unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn sets_rotation_direction_preserving_other_bits() {
    let mut expectations = Vec::new();
    // Read-modify-write: the register already holds 0x01 in its low bits.
    expectations.extend_from_slice(&command_exchange(&[0xD209, 0x0000], &[0x0000, 0x0001]));
    expectations.extend_from_slice(&command_exchange(
        &[0xEA54, 0x0981, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor
        .set_rotation_direction(Direction::CounterClockwise)
        .unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn reads_rotation_direction() {
    let mut expectations = Vec::new();
    expectations.extend_from_slice(&command_exchange(&[0xD209, 0x0000], &[0x0000, 0x0080]));
    expectations.extend_from_slice(&command_exchange(&[0xD209, 0x0000], &[0x0000, 0x0000]));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    assert_eq!(
        sensor.rotation_direction().unwrap(),
        Direction::CounterClockwise
    );
    assert_eq!(sensor.rotation_direction().unwrap(), Direction::Clockwise);

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn sets_filter_window_preserving_other_bits() {
    let mut expectations = Vec::new();
    // The register's upper nibble holds unrelated bits that must survive.
    expectations.extend_from_slice(&command_exchange(&[0xD20D, 0x0000], &[0x0000, 0x00A5]));
    expectations.extend_from_slice(&command_exchange(
        &[0xEA54, 0x0DA8, 0x0000],
        &[0x0000, 0x0000, 0x0000],
    ));

    let spi = SpiMock::new(&expectations);
    let mut sensor = Ma600::new(spi, NoopDelay::new());

    sensor.set_filter_window(FilterWindow::Window8).unwrap();

    let (mut spi, _) = sensor.release();
    spi.done();
}

#[test]
fn encoder_filters_and_caches_angle() {
    let mut expectations = Vec::new();
    expectations.extend_from_slice(&command_exchange(&[0x0000], &[0x8000]));
    expectations.extend_from_slice(&command_exchange(&[0x0000], &[0x8000]));

    let spi = SpiMock::new(&expectations);
    let mut encoder = Encoder::new(Ma600::new(spi, NoopDelay::new()), 0.1);

    // First sample passes through the filter with no startup lag.
    let first = encoder.angle_degrees().unwrap();
    assert!((first - 180.0).abs() < 1e-3);

    let second = encoder.angle_degrees().unwrap();
    assert!((second - 180.0).abs() < 1e-3);

    assert!((encoder.last_angle_degrees() - 180.0).abs() < 1e-3);

    let (mut spi, _) = encoder.release().release();
    spi.done();
}

#[test]
fn encoder_raw_read_bypasses_filter() {
    let expectations = command_exchange(&[0x0000], &[0x4000]);

    let spi = SpiMock::new(&expectations);
    let mut encoder = Encoder::new(Ma600::new(spi, NoopDelay::new()), 0.1);

    assert_eq!(encoder.angle_raw().unwrap(), 0x4000);
    // The unfiltered path must not disturb the cached filtered angle.
    assert!(encoder.last_angle_degrees().abs() < 1e-6);

    let (mut spi, _) = encoder.release().release();
    spi.done();
}
