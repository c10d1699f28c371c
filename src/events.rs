//! Touch events and the listener registry they are delivered through.

use heapless::Vec;

use crate::data_types::TouchUpdate;

/// Maximum number of listeners a driver can hold.
pub const MAX_LISTENERS: usize = 8;

/// Something the driver reports to its listeners.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// A poll cycle found at least one changed channel.
    Change(TouchUpdate),
    /// A channel went from released to touched.
    Touch(u8),
    /// A channel went from touched to released.
    Release(u8),
    /// A specific channel changed state.
    Channel { channel: u8, touched: bool },
    /// The hardware reset sequence completed and the chip was re-initialized.
    Reset,
}

/// Which events a listener wants.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interest {
    Change,
    Touch,
    Release,
    /// Changes of one channel only.
    Channel(u8),
    Reset,
}

impl Interest {
    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (Interest::Change, Event::Change(_)) => true,
            (Interest::Touch, Event::Touch(_)) => true,
            (Interest::Release, Event::Release(_)) => true,
            (Interest::Channel(wanted), Event::Channel { channel, .. }) => wanted == channel,
            (Interest::Reset, Event::Reset) => true,
            _ => false,
        }
    }

    /// Events of this kind only come out of poll cycles.
    pub fn is_poll_driven(&self) -> bool {
        !matches!(self, Interest::Reset)
    }
}

/// Receives driver events.
pub trait Listener {
    fn on_event(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> Listener for F {
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}

/// Registered listeners with their interest filters.
pub(crate) struct Listeners<'a> {
    entries: Vec<(Interest, &'a mut dyn Listener), MAX_LISTENERS>,
}

impl<'a> Listeners<'a> {
    pub(crate) const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Returns the listener back when the registry is full.
    pub(crate) fn register(
        &mut self,
        interest: Interest,
        listener: &'a mut dyn Listener,
    ) -> Result<(), &'a mut dyn Listener> {
        self.entries
            .push((interest, listener))
            .map_err(|(_, listener)| listener)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn emit(&mut self, event: &Event) {
        for (interest, listener) in self.entries.iter_mut() {
            if interest.matches(event) {
                listener.on_event(event);
            }
        }
    }

    /// Emit `Change`, then per changed channel a `Channel` event followed by `Touch` or `Release`.
    pub(crate) fn emit_update(&mut self, update: &TouchUpdate) {
        if self.entries.is_empty() {
            return;
        }
        self.emit(&Event::Change(update.clone()));
        for change in update.changes.iter() {
            self.emit(&Event::Channel {
                channel: change.channel,
                touched: change.touched,
            });
            if change.touched {
                self.emit(&Event::Touch(change.channel));
            } else {
                self.emit(&Event::Release(change.channel));
            }
        }
    }
}
