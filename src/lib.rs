//! CAP1188 Rust Driver
//!
//! `no_std` driver for the Microchip CAP1188 8-channel capacitive touch sensor over I2C.
//! Touch state is exposed as an 8-channel snapshot ([`Touches`]) and as edge-triggered
//! [`Event`]s delivered to registered listeners. Blocking access is always available;
//! the `async` feature (on by default) adds `_async` methods, the poll loop and async reset.

#![no_std]

pub mod data_types;
pub mod delay;
pub mod driver;
pub mod error;
pub mod events;
pub mod registers;

pub use data_types::{ChannelChange, Config, PollState, TouchUpdate, Touches};
pub use driver::{Cap1188, NoResetPin};
pub use error::Error;
pub use events::{Event, Interest, Listener};
pub use registers::DEFAULT_I2C_ADDRESS;
