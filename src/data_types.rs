//! Data types for CAP1188 driver.

use heapless::Vec;

use crate::registers::{
    decode_touches, CHANNEL_COUNT, DEFAULT_I2C_ADDRESS, DEFAULT_POLLING_INTERVAL_MS,
};

/// Snapshot of all 8 channels, `true` meaning touched.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Touches([bool; CHANNEL_COUNT]);

impl Touches {
    /// All channels released.
    pub const NONE: Self = Self([false; CHANNEL_COUNT]);

    /// Build a snapshot from a raw SENSOR_INPUT_STATUS byte.
    pub fn from_status(raw: u8) -> Self {
        Self(decode_touches(raw))
    }

    /// Build a snapshot from explicit channel flags.
    pub const fn from_channels(channels: [bool; CHANNEL_COUNT]) -> Self {
        Self(channels)
    }

    /// Per-channel flags, index = channel.
    pub fn channels(&self) -> [bool; CHANNEL_COUNT] {
        self.0
    }

    /// Whether `channel` is touched. Channels past 7 are never touched.
    pub fn is_touched(&self, channel: u8) -> bool {
        self.0.get(channel as usize).copied().unwrap_or(false)
    }

    /// Number of touched channels.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|t| **t).count()
    }

    /// Channels whose state differs between `self` (previous) and `next`, ascending.
    pub fn diff(&self, next: &Touches) -> Vec<ChannelChange, CHANNEL_COUNT> {
        let mut changes = Vec::new();
        for (channel, (prev, now)) in self.0.iter().zip(next.0.iter()).enumerate() {
            if prev != now {
                // At most one entry per channel, so this never overflows.
                let _ = changes.push(ChannelChange {
                    channel: channel as u8,
                    touched: *now,
                });
            }
        }
        changes
    }
}

/// A single channel transition found by a poll cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelChange {
    /// Channel index, 0..=7.
    pub channel: u8,
    /// New state of the channel.
    pub touched: bool,
}

/// Result of a poll cycle that saw at least one transition.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TouchUpdate {
    /// Transitions in ascending channel order; never empty.
    pub changes: Vec<ChannelChange, CHANNEL_COUNT>,
    /// Snapshot after the transitions.
    pub touches: Touches,
}

/// Poll loop scheduling state.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PollState {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// A poll cycle runs every polling interval.
    Polling,
}

/// Level to drive on the reset line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineLevel {
    Low,
    High,
}

/// Driver configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// 7-bit I2C address of the chip.
    pub address: u8,
    /// Time between two poll cycles.
    pub polling_interval_ms: u32,
    /// Allow several channels to report touched at once.
    pub multi_touch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_I2C_ADDRESS,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            multi_touch: true,
        }
    }
}

impl Config {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_polling_interval_ms(mut self, interval_ms: u32) -> Self {
        self.polling_interval_ms = interval_ms;
        self
    }

    pub fn with_multi_touch(mut self, enable: bool) -> Self {
        self.multi_touch = enable;
        self
    }
}
