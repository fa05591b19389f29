//! All sort of decoded track events.

use crate::{names::UNKNOWN_EVENT, prelude::*};
use std::borrow::Cow;

/// Represents a decoded SMF track event.
///
/// Consists of a time (in MIDI ticks) and the actual track event.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct EventRecord<'a> {
    /// How many MIDI ticks after the previous event should this event fire.
    ///
    /// If the track was decoded with [`Clock::Absolute`](enum.Clock.html#variant.Absolute), this
    /// is instead the number of ticks since the start of the track.
    pub time: u32,
    /// The type of event along with event-specific data.
    pub event: EventVariant<'a>,
}
impl EventRecord<'_> {
    #[inline]
    pub fn is_end_of_track(&self) -> bool {
        matches!(
            self.event,
            EventVariant::Meta(MetaMessage {
                payload: MetaPayload::EndOfTrack,
                ..
            })
        )
    }
}

/// Represents the different kinds of SMF events and their associated data.
///
/// It notably does *not* include the timing of the event; the `EventRecord` struct is
/// responsible for this.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventVariant<'a> {
    /// A message associated to a MIDI channel carrying musical data.
    ///
    /// Usually, the bulk of MIDI data is these kind of messages.
    Channel(ChannelMessage<'a>),
    /// A meta-message, giving extra information for correct playback, like tempo, track name,
    /// markers, etc...
    Meta(MetaMessage<'a>),
    /// A System Exclusive message or escape sequence, carried as opaque bytes.
    Sysex(SysexMessage<'a>),
}

/// A channel voice or channel mode message.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct ChannelMessage<'a> {
    /// The effective status byte, including the channel nibble.
    ///
    /// For messages using running status this is the inherited status.
    pub status: u8,
    /// The MIDI channel, the low nibble of the status.
    pub channel: u4,
    /// The operand bytes, in wire order.
    pub data: &'a [u8],
    /// Human-readable name from the event name dictionary, or `None` if the dictionary has no
    /// entry for this message.
    pub label: Option<&'a str>,
}
impl<'a> ChannelMessage<'a> {
    /// Channel messages have a known operand count that depends only on the status family.
    #[inline]
    pub fn operand_count(status: u8) -> usize {
        const LENGTH_BY_STATUS: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 1, 1, 2, 0];
        LENGTH_BY_STATUS[(status >> 4) as usize] as usize
    }

    /// The status byte with the channel nibble masked off, eg. `0x90` for note-on.
    #[inline]
    pub fn family(&self) -> u8 {
        self.status & 0xF0
    }

    /// The dictionary label, or `"Unknown event"` if there was none.
    #[inline]
    pub fn label_or_unknown(&self) -> &'a str {
        self.label.unwrap_or(UNKNOWN_EVENT)
    }

    /// Whether the event name dictionary failed to name this message.
    #[inline]
    pub fn is_resolver_miss(&self) -> bool {
        self.label.is_none()
    }

    /// Whether this is a controller message addressing one of the reserved channel mode
    /// controllers (120 to 127), such as "All Notes Off".
    #[inline]
    pub fn is_channel_mode(&self) -> bool {
        self.family() == 0xB0 && matches!(self.data.first(), Some(120..=127))
    }
}

/// A "meta message", as defined by the SMF standard.
/// These events carry metadata about the track, such as tempo, time signature, name, etc...
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct MetaMessage<'a> {
    /// The raw meta type byte following `0xFF`.
    pub subtype: u8,
    pub payload: MetaPayload<'a>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaPayload<'a> {
    /// Amount of microseconds per beat (quarter note).
    ///
    /// Usually appears at the beginning of a track, before any midi events are sent, but there
    /// are no guarantees.
    SetTempo(u24),
    /// Information about the name of the track.
    TrackName(&'a [u8]),
    /// In order of the MIDI standard: numerator, denominator as a power of two, MIDI clocks
    /// per metronome click, and notated 32nd notes per 24 MIDI clocks.
    TimeSignature {
        numerator: u8,
        denominator_power_of_two: u8,
        clocks_per_click: u8,
        notated_32nds_per_24_clocks: u8,
    },
    /// Arbitrary marker text associated to an instant.
    Marker(&'a [u8]),
    /// Obligatory at track end.
    EndOfTrack,
    /// A meta-message of a type outside the table above, or a known type whose payload is too
    /// short for its fields.
    ///
    /// The slice is the declared payload of the meta-message, skipped without interpretation.
    Unknown(&'a [u8]),
}
impl<'a> MetaPayload<'a> {
    /// The text of `TrackName` and `Marker` payloads, with invalid UTF-8 replaced.
    pub fn text(&self) -> Option<Cow<'a, str>> {
        match *self {
            MetaPayload::TrackName(text) | MetaPayload::Marker(text) => {
                Some(String::from_utf8_lossy(text))
            }
            _ => None,
        }
    }

    /// The actual time signature denominator, eg. `8` for a `6/8` signature.
    ///
    /// Returns `None` for other payloads and for denominators that do not fit in a `u32`.
    pub fn denominator(&self) -> Option<u32> {
        match *self {
            MetaPayload::TimeSignature {
                denominator_power_of_two,
                ..
            } => 1u32.checked_shl(u32::from(denominator_power_of_two)),
            _ => None,
        }
    }
}

/// A System Exclusive event (`0xF0`) or escape sequence (`0xF7`).
///
/// The payload is carried verbatim and never interpreted.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct SysexMessage<'a> {
    /// Either `0xF0` or `0xF7`.
    pub type_byte: u8,
    /// Whether the complete message begins with an implicit `0xF0` lead byte that is not part of
    /// `raw`. True for `0xF0` events, false for `0xF7` escapes.
    pub includes_lead_byte: bool,
    /// The data bytes following the length.
    pub raw: &'a [u8],
}
