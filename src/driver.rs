//! CAP1188 driver.
//! Blocking I2C helpers are always available; the `async` feature adds `_async` twins and the poll loop.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::ErrorType;

use crate::data_types::{Config, LineLevel, PollState, TouchUpdate, Touches};
use crate::delay::TimedDelay;
use crate::error::Error;
use crate::events::{Event, Interest, Listener, Listeners};
use crate::registers::{addr, bit, with_bit, CHANNEL_COUNT, RESET_SEQUENCE, STANDBY_CONFIG_FAST};

/// Placeholder reset line for drivers built without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResetPin;

impl embedded_hal::digital::ErrorType for NoResetPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// CAP1188 capacitive touch sensor.
pub struct Cap1188<'a, I2C, RST = NoResetPin> {
    i2c: I2C,
    reset_pin: Option<RST>,
    config: Config,
    last_touches: Touches,
    poll_state: PollState,
    listeners: Listeners<'a>,
}

impl<'a, I2C> Cap1188<'a, I2C, NoResetPin> {
    /// Create a new driver instance with the default configuration (address 0x29, 500 ms polling).
    pub fn new(i2c: I2C) -> Self {
        Self::with_config(i2c, Config::default())
    }

    /// Create a new driver instance with a custom configuration.
    pub fn with_config(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            reset_pin: None,
            config,
            last_touches: Touches::NONE,
            poll_state: PollState::Idle,
            listeners: Listeners::new(),
        }
    }
}

impl<'a, I2C, RST> Cap1188<'a, I2C, RST> {
    /// Attach the line wired to the chip's RESET pin; enables [`Cap1188::reset`].
    pub fn with_reset_pin<P: OutputPin>(self, pin: P) -> Cap1188<'a, I2C, P> {
        Cap1188 {
            i2c: self.i2c,
            reset_pin: Some(pin),
            config: self.config,
            last_touches: self.last_touches,
            poll_state: self.poll_state,
            listeners: self.listeners,
        }
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_reset_pin(&self) -> bool {
        self.reset_pin.is_some()
    }

    /// Touch snapshot stored by the last poll cycle that saw a change.
    pub fn last_touches(&self) -> Touches {
        self.last_touches
    }

    pub fn poll_state(&self) -> PollState {
        self.poll_state
    }

    pub fn is_polling(&self) -> bool {
        self.poll_state == PollState::Polling
    }

    /// Schedule poll cycles. Does nothing if already polling.
    pub fn start_polling(&mut self) {
        if self.poll_state == PollState::Idle {
            log::debug!("cap1188: polling every {} ms", self.config.polling_interval_ms);
            self.poll_state = PollState::Polling;
        }
    }

    /// Cancel scheduled poll cycles.
    pub fn stop_polling(&mut self) {
        if self.poll_state == PollState::Polling {
            log::debug!("cap1188: polling stopped");
            self.poll_state = PollState::Idle;
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Give back the bus and reset line.
    pub fn free(self) -> (I2C, Option<RST>) {
        (self.i2c, self.reset_pin)
    }

    fn diff_and_emit(&mut self, touches: Touches) -> Option<TouchUpdate> {
        let changes = self.last_touches.diff(&touches);
        if changes.is_empty() {
            return None;
        }
        let update = TouchUpdate { changes, touches };
        self.listeners.emit_update(&update);
        self.last_touches = touches;
        Some(update)
    }
}

impl<'a, I2C: ErrorType, RST> Cap1188<'a, I2C, RST> {
    /// Register a listener for one kind of event. `Interest::Channel(n)` needs `n < 8`.
    ///
    /// The first listener for a poll-driven event moves the driver from [`PollState::Idle`]
    /// to [`PollState::Polling`]; later ones never schedule a second loop.
    pub fn subscribe(
        &mut self,
        interest: Interest,
        listener: &'a mut dyn Listener,
    ) -> Result<(), Error<I2C::Error>> {
        if let Interest::Channel(channel) = interest {
            check_channel(channel)?;
        }
        self.listeners
            .register(interest, listener)
            .map_err(|_| Error::TooManyListeners)?;
        if interest.is_poll_driven() {
            self.start_polling();
        }
        Ok(())
    }
}

fn check_channel<E>(channel: u8) -> Result<(), Error<E>> {
    if (channel as usize) < CHANNEL_COUNT {
        Ok(())
    } else {
        Err(Error::OutOfRange)
    }
}

/// `value << shift` as a register byte; no bit may land past bit 7.
fn shifted<E>(shift: u8, value: u8) -> Result<u8, Error<E>> {
    check_channel(shift)?;
    u8::try_from(u16::from(value) << shift).map_err(|_| Error::OutOfRange)
}

fn drive<P: OutputPin>(pin: &mut P, level: LineLevel) -> Result<(), P::Error> {
    match level {
        LineLevel::Low => pin.set_low(),
        LineLevel::High => pin.set_high(),
    }
}

impl<'a, I2C> Cap1188<'a, I2C, NoResetPin>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Build a driver and initialize the chip.
    pub fn connect(i2c: I2C, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut dev = Self::with_config(i2c, config);
        dev.init()?;
        Ok(dev)
    }
}

impl<'a, I2C, RST> Cap1188<'a, I2C, RST>
where
    I2C: embedded_hal::i2c::I2c,
    RST: OutputPin,
{
    /// Initialize the chip: link every LED to its sensor, apply the multi-touch policy,
    /// speed up standby sensing.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        self.link_leds_to_sensors()?;
        self.set_multiple_touches(self.config.multi_touch)?;
        self.write_reg(addr::STANDBY_CONFIG, STANDBY_CONFIG_FAST)?;
        log::debug!("cap1188@{:#04x}: initialized", self.config.address);
        Ok(())
    }

    /// Write a single register.
    pub fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.config.address, &[reg, value])
            .map_err(Error::I2c)
    }

    /// Read a single register.
    pub fn read_reg(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.config.address, &[reg], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    /// Set or clear one bit in a register (read-modify-write).
    pub fn write_bit(&mut self, reg: u8, bit: u8, value: bool) -> Result<(), Error<I2C::Error>> {
        check_channel(bit)?;
        let cur = self.read_reg(reg)?;
        self.write_reg(reg, with_bit(cur, bit, value))
    }

    /// OR `value << shift` into a register (read-modify-write). Bits already set stay set.
    /// A value that does not fit above `shift` is [`Error::OutOfRange`].
    pub fn write_bits(&mut self, reg: u8, shift: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let bits = shifted(shift, value)?;
        let cur = self.read_reg(reg)?;
        self.write_reg(reg, cur | bits)
    }

    /// Link (or unlink) the LED of `channel` to its sensor input.
    pub fn link_led_to_sensor(&mut self, channel: u8, enable: bool) -> Result<(), Error<I2C::Error>> {
        check_channel(channel)?;
        self.write_bit(addr::SENSOR_INPUT_LINKING, channel, enable)
    }

    pub fn link_leds_to_sensors(&mut self) -> Result<(), Error<I2C::Error>> {
        for channel in 0..CHANNEL_COUNT as u8 {
            self.link_led_to_sensor(channel, true)?;
        }
        Ok(())
    }

    /// Allow or block simultaneous touches. The hardware bit means "block".
    pub fn set_multiple_touches(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_bit(addr::MULTI_TOUCH_CONFIG, bit::MULTI_TOUCH_BLOCK, !enable)
    }

    /// Drive the LED of an unlinked channel.
    pub fn set_led_output(&mut self, channel: u8, on: bool) -> Result<(), Error<I2C::Error>> {
        check_channel(channel)?;
        self.write_bit(addr::LED_OUTPUT_CONTROL, channel, on)
    }

    /// Read the state of all channels, clearing the interrupt flag when anything is touched.
    pub fn read_touches(&mut self) -> Result<Touches, Error<I2C::Error>> {
        let raw = self.read_reg(addr::SENSOR_INPUT_STATUS)?;
        if raw != 0 {
            self.write_bit(addr::MAIN_CONTROL, bit::MAIN_CONTROL_INT, false)?;
        }
        Ok(Touches::from_status(raw))
    }

    /// Run one poll cycle: read, diff against the stored snapshot, emit and return the changes.
    pub fn poll_once(&mut self) -> Result<Option<TouchUpdate>, Error<I2C::Error>> {
        let touches = self.read_touches()?;
        Ok(self.diff_and_emit(touches))
    }

    /// When polling, run one poll cycle and then wait one polling interval.
    /// A failed cycle is logged and does not stop polling. Returns whether polling is still active.
    pub fn poll_cycle<D: embedded_hal::delay::DelayNs>(&mut self, delay: &mut D) -> bool {
        if !self.is_polling() {
            return false;
        }
        if let Err(err) = self.poll_once() {
            log::warn!("cap1188@{:#04x}: poll failed: {:?}", self.config.address, err);
        }
        TimedDelay::new(&mut *delay, self.config.polling_interval_ms).wait_blocking();
        self.is_polling()
    }

    /// Pulse the reset line, re-initialize the chip and emit [`Event::Reset`].
    pub fn reset<D: embedded_hal::delay::DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I2C::Error>> {
        if self.reset_pin.is_none() {
            return Err(Error::ResetNotConfigured);
        }
        let resume = core::mem::replace(&mut self.poll_state, PollState::Idle);
        let result = self.reset_sequence(delay);
        self.poll_state = resume;
        result?;
        log::debug!("cap1188@{:#04x}: reset complete", self.config.address);
        self.listeners.emit(&Event::Reset);
        Ok(())
    }

    fn reset_sequence<D: embedded_hal::delay::DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I2C::Error>> {
        let Some(pin) = self.reset_pin.as_mut() else {
            return Err(Error::ResetNotConfigured);
        };
        for (level, wait_ms) in RESET_SEQUENCE {
            drive(pin, level).map_err(|err| {
                log::warn!("cap1188: reset line {:?} failed: {:?}", level, err);
                Error::ResetPin
            })?;
            TimedDelay::new(&mut *delay, wait_ms).wait_blocking();
        }
        self.init()
    }
}

#[cfg(feature = "async")]
impl<'a, I2C> Cap1188<'a, I2C, NoResetPin>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    /// Async version of [`connect`](Cap1188::connect).
    pub async fn connect_async(i2c: I2C, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut dev = Self::with_config(i2c, config);
        dev.init_async().await?;
        Ok(dev)
    }
}

#[cfg(feature = "async")]
impl<'a, I2C, RST> Cap1188<'a, I2C, RST>
where
    I2C: embedded_hal_async::i2c::I2c,
    RST: OutputPin,
{
    /// Async version of [`init`](Cap1188::init).
    pub async fn init_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.link_leds_to_sensors_async().await?;
        self.set_multiple_touches_async(self.config.multi_touch).await?;
        self.write_reg_async(addr::STANDBY_CONFIG, STANDBY_CONFIG_FAST).await?;
        log::debug!("cap1188@{:#04x}: initialized", self.config.address);
        Ok(())
    }

    pub async fn write_reg_async(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.config.address, &[reg, value])
            .await
            .map_err(Error::I2c)
    }

    pub async fn read_reg_async(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.config.address, &[reg], &mut buf)
            .await
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    pub async fn write_bit_async(&mut self, reg: u8, bit: u8, value: bool) -> Result<(), Error<I2C::Error>> {
        check_channel(bit)?;
        let cur = self.read_reg_async(reg).await?;
        self.write_reg_async(reg, with_bit(cur, bit, value)).await
    }

    pub async fn write_bits_async(&mut self, reg: u8, shift: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let bits = shifted(shift, value)?;
        let cur = self.read_reg_async(reg).await?;
        self.write_reg_async(reg, cur | bits).await
    }

    pub async fn link_led_to_sensor_async(&mut self, channel: u8, enable: bool) -> Result<(), Error<I2C::Error>> {
        check_channel(channel)?;
        self.write_bit_async(addr::SENSOR_INPUT_LINKING, channel, enable).await
    }

    pub async fn link_leds_to_sensors_async(&mut self) -> Result<(), Error<I2C::Error>> {
        for channel in 0..CHANNEL_COUNT as u8 {
            self.link_led_to_sensor_async(channel, true).await?;
        }
        Ok(())
    }

    pub async fn set_multiple_touches_async(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_bit_async(addr::MULTI_TOUCH_CONFIG, bit::MULTI_TOUCH_BLOCK, !enable)
            .await
    }

    pub async fn set_led_output_async(&mut self, channel: u8, on: bool) -> Result<(), Error<I2C::Error>> {
        check_channel(channel)?;
        self.write_bit_async(addr::LED_OUTPUT_CONTROL, channel, on).await
    }

    pub async fn read_touches_async(&mut self) -> Result<Touches, Error<I2C::Error>> {
        let raw = self.read_reg_async(addr::SENSOR_INPUT_STATUS).await?;
        if raw != 0 {
            self.write_bit_async(addr::MAIN_CONTROL, bit::MAIN_CONTROL_INT, false)
                .await?;
        }
        Ok(Touches::from_status(raw))
    }

    pub async fn poll_once_async(&mut self) -> Result<Option<TouchUpdate>, Error<I2C::Error>> {
        let touches = self.read_touches_async().await?;
        Ok(self.diff_and_emit(touches))
    }

    /// Poll every polling interval until `stop` is signaled or polling is stopped.
    ///
    /// Returns immediately when idle. `stop` only races the wait between cycles, an in-flight
    /// read always completes. Failed cycles are logged and polling carries on.
    pub async fn run<M, D>(&mut self, delay: &mut D, stop: &embassy_sync::signal::Signal<M, ()>)
    where
        M: embassy_sync::blocking_mutex::raw::RawMutex,
        D: embedded_hal_async::delay::DelayNs,
    {
        use embassy_futures::select::{select, Either};

        while self.is_polling() {
            if let Err(err) = self.poll_once_async().await {
                log::warn!("cap1188@{:#04x}: poll failed: {:?}", self.config.address, err);
            }
            let interval = TimedDelay::new(&mut *delay, self.config.polling_interval_ms);
            if let Either::First(()) = select(stop.wait(), interval.wait()).await {
                self.stop_polling();
            }
        }
    }

    /// Async version of [`reset`](Cap1188::reset).
    pub async fn reset_async<D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<(), Error<I2C::Error>> {
        if self.reset_pin.is_none() {
            return Err(Error::ResetNotConfigured);
        }
        let resume = core::mem::replace(&mut self.poll_state, PollState::Idle);
        let result = self.reset_sequence_async(delay).await;
        self.poll_state = resume;
        result?;
        log::debug!("cap1188@{:#04x}: reset complete", self.config.address);
        self.listeners.emit(&Event::Reset);
        Ok(())
    }

    async fn reset_sequence_async<D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<(), Error<I2C::Error>> {
        let Some(pin) = self.reset_pin.as_mut() else {
            return Err(Error::ResetNotConfigured);
        };
        for (level, wait_ms) in RESET_SEQUENCE {
            drive(pin, level).map_err(|err| {
                log::warn!("cap1188: reset line {:?} failed: {:?}", level, err);
                Error::ResetPin
            })?;
            TimedDelay::new(&mut *delay, wait_ms).wait().await;
        }
        self.init_async().await
    }
}
