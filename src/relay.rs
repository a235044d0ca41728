//! Serial relay board.
//!
//! The board takes plain text commands, `RL<channel><0|1>` followed by `"\n\r"`, at 9600 baud
//! and does not answer. [`RelayBoard`] also keeps track of which channels have been handed out,
//! so two functions (e.g. battery and ignition) never drive the same relay.

use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::{
    error::{Error, Result},
    types::State,
};

/// Baud rate of the relay board.
pub const RELAY_BAUD_RATE: u32 = 9600;

/// Length of one encoded command.
pub const COMMAND_LEN: usize = 6;

const TERMINATOR: &[u8; 2] = b"\n\r";

/// One of the eight relays on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum RelayChannel {
    Relay1 = 1,
    Relay2 = 2,
    Relay3 = 3,
    Relay4 = 4,
    Relay5 = 5,
    Relay6 = 6,
    Relay7 = 7,
    Relay8 = 8,
}

impl RelayChannel {
    /// Channel number, 1 to 8.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// ASCII digit sent on the wire.
    pub fn digit(self) -> u8 {
        b'0' + self.number()
    }

    fn bit(self) -> u8 {
        1 << (self.number() - 1)
    }
}

impl TryFrom<u8> for RelayChannel {
    type Error = ();

    fn try_from(value: u8) -> core::result::Result<Self, Self::Error> {
        RelayChannel::iter()
            .find(|channel| channel.number() == value)
            .ok_or(())
    }
}

/// A single switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCommand {
    pub channel: RelayChannel,
    pub state: State,
}

impl RelayCommand {
    pub fn new(channel: RelayChannel, state: impl Into<State>) -> Self {
        Self {
            channel,
            state: state.into(),
        }
    }

    pub fn encode(&self) -> [u8; COMMAND_LEN] {
        let state = match self.state {
            State::Off => b'0',
            State::On => b'1',
        };
        [
            b'R',
            b'L',
            self.channel.digit(),
            state,
            TERMINATOR[0],
            TERMINATOR[1],
        ]
    }
}

/// Driver for the relay board over any [embedded_io::Write] interface.
pub struct RelayBoard<S: embedded_io::Write> {
    interface: S,
    /// Bit n-1 set when channel n is claimed.
    claimed: u8,
}

impl<S: embedded_io::Write> RelayBoard<S> {
    pub fn new(interface: S) -> Self {
        Self {
            interface,
            claimed: 0,
        }
    }

    /// Switch one relay. The board gives no feedback.
    pub fn switch(&mut self, channel: RelayChannel, state: impl Into<State>) -> Result<(), S::Error> {
        let command = RelayCommand::new(channel, state);
        log::debug!("Relay {} -> {:?}", channel.number(), command.state);
        self.interface
            .write_all(&command.encode())
            .map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)
    }

    /// Switch a relay given by number, 1 to 8.
    pub fn switch_number(&mut self, number: u8, state: impl Into<State>) -> Result<(), S::Error> {
        let channel = RelayChannel::try_from(number).map_err(|_| Error::InvalidRange)?;
        self.switch(channel, state)
    }

    /// Reserve `channel`. Returns `false` if it is already taken.
    pub fn claim(&mut self, channel: RelayChannel) -> bool {
        if self.is_claimed(channel) {
            return false;
        }
        self.claimed |= channel.bit();
        true
    }

    pub fn release(&mut self, channel: RelayChannel) {
        self.claimed &= !channel.bit();
    }

    pub fn is_claimed(&self, channel: RelayChannel) -> bool {
        self.claimed & channel.bit() != 0
    }

    /// Channels nobody has claimed yet, in order.
    pub fn available(&self) -> impl Iterator<Item = RelayChannel> + '_ {
        RelayChannel::iter().filter(|channel| !self.is_claimed(*channel))
    }

    pub fn into_inner(self) -> S {
        self.interface
    }
}
