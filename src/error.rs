//! Error definitions for CAP1188 driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Reset line could not be driven.
    ResetPin,
    /// `reset` called on a driver built without a reset line.
    ResetNotConfigured,
    /// Channel, bit or shift outside 0..=7.
    OutOfRange,
    /// No room left in the listener registry.
    TooManyListeners,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::ResetPin => write!(f, "failed to drive reset line"),
            Error::ResetNotConfigured => write!(f, "reset requested but no reset line configured"),
            Error::OutOfRange => write!(f, "channel or bit out of range"),
            Error::TooManyListeners => write!(f, "listener registry is full"),
        }
    }
}
