//! Register map and constants for CAP1188.
//! Addresses and bit positions follow the datasheet; only the registers the driver touches are listed.

use crate::data_types::LineLevel;

/// Default I2C address.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x29;

/// Number of sensor inputs (and linked LEDs) on the chip.
pub const CHANNEL_COUNT: usize = 8;

/// Register addresses.
pub mod addr {
    /// Main control (gain, standby, deep sleep, interrupt flag)
    pub const MAIN_CONTROL: u8 = 0x00;
    /// Sensor input status, one bit per channel
    pub const SENSOR_INPUT_STATUS: u8 = 0x03;
    /// Multiple touch configuration
    pub const MULTI_TOUCH_CONFIG: u8 = 0x2A;
    /// Standby configuration (averaging, sample time, cycle time)
    pub const STANDBY_CONFIG: u8 = 0x41;
    /// Sensor input LED linking, one bit per channel
    pub const SENSOR_INPUT_LINKING: u8 = 0x72;
    /// LED output control for unlinked LEDs, one bit per channel
    pub const LED_OUTPUT_CONTROL: u8 = 0x74;
}

/// Bit positions used with the single-bit helpers.
pub mod bit {
    use super::{MainControlBits, MultiTouchBits};

    /// MAIN_CONTROL bit 0: interrupt flag, must be cleared before the next status latches.
    pub const MAIN_CONTROL_INT: u8 = MainControlBits::INT.bits().trailing_zeros() as u8;
    /// MULTI_TOUCH_CONFIG bit 7: block multiple simultaneous touches.
    pub const MULTI_TOUCH_BLOCK: u8 = MultiTouchBits::MULT_BLK_EN.bits().trailing_zeros() as u8;
}

/// STANDBY_CONFIG value written at init: 8 samples averaged, shorter cycle.
pub const STANDBY_CONFIG_FAST: u8 = 0x30;

/// Default interval between two poll cycles.
pub const DEFAULT_POLLING_INTERVAL_MS: u32 = 500;

/// Delay between each step of the hardware reset.
pub const RESET_STEP_MS: u32 = 100;

/// Hardware reset as (line level, delay after) steps, run in order.
pub const RESET_SEQUENCE: [(LineLevel, u32); 3] = [
    (LineLevel::Low, RESET_STEP_MS),
    (LineLevel::High, RESET_STEP_MS),
    (LineLevel::Low, RESET_STEP_MS),
];

bitflags::bitflags! {
    /// MAIN_CONTROL register bits (0x00).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MainControlBits: u8 {
        /// Bits 7-6: Sensitivity gain.
        const GAIN1  = 1 << 7;
        const GAIN0  = 1 << 6;
        /// Bit 5: Standby mode.
        const STBY   = 1 << 5;
        /// Bit 4: Deep sleep.
        const DSLEEP = 1 << 4;
        // Bits 3-1 reserved.
        /// Bit 0: Interrupt asserted.
        const INT    = 1 << 0;
    }

    /// MULTI_TOUCH_CONFIG register bits (0x2A).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MultiTouchBits: u8 {
        /// Bit 7: Block more than B_MULT_T simultaneous touches.
        const MULT_BLK_EN = 1 << 7;
        // Bits 6-4 reserved.
        /// Bits 3-2: Number of simultaneous touches allowed before blocking.
        const B_MULT_T1   = 1 << 3;
        const B_MULT_T0   = 1 << 2;
    }
}

/// Decode SENSOR_INPUT_STATUS into per-channel touch flags (bit i -> channel i).
pub fn decode_touches(raw: u8) -> [bool; CHANNEL_COUNT] {
    core::array::from_fn(|i| (raw >> i) & 1 == 1)
}

/// Set or clear `bit` in `value`.
pub fn with_bit(value: u8, bit: u8, set: bool) -> u8 {
    if set { value | (1 << bit) } else { value & !(1 << bit) }
}
