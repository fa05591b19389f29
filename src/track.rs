//! Decoding the event stream of a single track chunk.

use crate::{
    chunk::RawChunk,
    event::{ChannelMessage, EventRecord, EventVariant, MetaMessage, MetaPayload, SysexMessage},
    names::{EventName, EventNameResolver},
    prelude::*,
};
use tracing::{debug, trace};

/// How event times are reported.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Clock {
    /// Ticks since the previous event in the track, as stored in the file.
    Delta,
    /// Ticks since the start of the track.
    Absolute,
}
impl Default for Clock {
    fn default() -> Clock {
        Clock::Delta
    }
}

/// Knobs for the track decoder.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct DecodeOptions {
    pub clock: Clock,
}
impl DecodeOptions {
    /// Options reporting absolute times.
    pub fn absolute() -> DecodeOptions {
        DecodeOptions {
            clock: Clock::Absolute,
        }
    }
}

/// The mutable state carried from one event to the next within a track.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct DecoderState {
    /// Offset of the next unread byte in the chunk payload.
    pub cursor_offset: usize,
    /// The last channel status byte, inherited by events that omit their status.
    ///
    /// Cleared by meta and Sysex events.
    pub running_status: Option<u8>,
    /// Sum of all delta-times decoded so far.
    pub absolute_time: u32,
}

/// An iterator of events over a single track.
///
/// Yields one `Result` per event and stops for good after the first error. Bytes following an
/// end-of-track meta event are still decoded, but an error among them just ends the iteration.
pub struct TrackDecoder<'a, R: ?Sized> {
    cursor: ByteCursor<'a>,
    tag: [u8; 4],
    names: &'a R,
    options: DecodeOptions,
    running_status: Option<u8>,
    absolute_time: u32,
    end_of_track: bool,
    done: bool,
}
impl<'a, R: EventNameResolver + ?Sized> TrackDecoder<'a, R> {
    pub fn new(payload: &'a [u8], names: &'a R) -> TrackDecoder<'a, R> {
        Self::with_options(payload, names, DecodeOptions::default())
    }

    pub fn with_options(
        payload: &'a [u8],
        names: &'a R,
        options: DecodeOptions,
    ) -> TrackDecoder<'a, R> {
        TrackDecoder {
            cursor: ByteCursor::new(payload),
            tag: *b"MTrk",
            names,
            options,
            running_status: None,
            absolute_time: 0,
            end_of_track: false,
            done: false,
        }
    }

    /// Decode the payload of a chunk, whatever its tag.
    pub fn from_chunk(
        chunk: &RawChunk<'a>,
        names: &'a R,
        options: DecodeOptions,
    ) -> TrackDecoder<'a, R> {
        TrackDecoder {
            tag: chunk.tag,
            ..Self::with_options(chunk.payload, names, options)
        }
    }

    /// A snapshot of the running state.
    pub fn state(&self) -> DecoderState {
        DecoderState {
            cursor_offset: self.cursor.position(),
            running_status: self.running_status,
            absolute_time: self.absolute_time,
        }
    }

    /// Whether an end-of-track meta event has been decoded.
    #[inline]
    pub fn reached_end_of_track(&self) -> bool {
        self.end_of_track
    }

    /// Get the remaining unread bytes.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        self.cursor.unread()
    }

    /// Decode the next event.
    ///
    /// Returns `Ok(None)` once the payload is exhausted between events.
    pub fn next_record(&mut self) -> Result<Option<EventRecord<'a>>> {
        if self.done || self.cursor.is_empty() {
            return Ok(None);
        }
        match self.read_record() {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                self.done = true;
                if self.end_of_track {
                    debug!(
                        "ignoring {} undecodable bytes after end of track: {}",
                        self.cursor.remaining(),
                        err
                    );
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Decode all remaining events, keeping whatever was decoded before an error.
    pub fn decode(mut self) -> DecodedTrack<'a> {
        let mut events = Vec::with_capacity(self.cursor.remaining() / 3);
        let error = loop {
            match self.next_record() {
                Ok(Some(record)) => events.push(record),
                Ok(None) => break None,
                Err(err) => break Some(err),
            }
        };
        DecodedTrack {
            index: 0,
            tag: self.tag,
            events,
            error,
        }
    }

    /// In case of failure the cursor might be left in the middle of an event!
    fn read_record(&mut self) -> Result<EventRecord<'a>> {
        let start = self.cursor.position();
        let delta = self.cursor.take_vlq().at(start, "event delta-time")?;
        let event = self.read_event()?;
        self.absolute_time = self.absolute_time.saturating_add(delta);
        let time = match self.options.clock {
            Clock::Delta => delta,
            Clock::Absolute => self.absolute_time,
        };
        let record = EventRecord { time, event };
        if record.is_end_of_track() {
            self.end_of_track = true;
        }
        Ok(record)
    }

    fn read_event(&mut self) -> Result<EventVariant<'a>> {
        let start = self.cursor.position();
        let head = self.cursor.peek_u8().at(start, "event status")?;
        match head {
            0x00..=0x7F => {
                //Running status! The head byte is the first operand, so leave it unread
                let status = self.running_status.ok_or(Error::new(
                    ErrorKind::NoRunningStatus,
                    start,
                    "event status",
                ))?;
                self.read_channel(status)
            }
            0x80..=0xEF => {
                self.cursor.take(1);
                self.running_status = Some(head);
                self.read_channel(head)
            }
            0xFF => {
                self.cursor.take(1);
                self.running_status = None;
                self.read_meta()
            }
            0xF0 | 0xF7 => {
                self.cursor.take(1);
                self.running_status = None;
                self.read_sysex(head)
            }
            _ => Err(Error::new(
                ErrorKind::UnsupportedStatus(head),
                start,
                "event status",
            )),
        }
    }

    fn read_channel(&mut self, status: u8) -> Result<EventVariant<'a>> {
        let start = self.cursor.position();
        let data = self
            .cursor
            .take(ChannelMessage::operand_count(status))
            .at(start, "channel message operands")?;
        let names: &'a R = self.names;
        let family = status & 0xF0;
        let name = if family == 0xB0 {
            data.first().and_then(|&controller| names.controller_label(controller))
        } else {
            names.channel_voice_label(family)
        };
        match name {
            Some(EventName { operand_count, .. }) if operand_count as usize != data.len() => trace!(
                "dictionary expects {} operands for status 0x{:02X}, found {}",
                operand_count,
                status,
                data.len()
            ),
            Some(_) => {}
            None => trace!("no name for status 0x{:02X} {:02X?}", status, data),
        }
        Ok(EventVariant::Channel(ChannelMessage {
            status,
            channel: u4::new(status),
            data,
            label: name.map(|name| name.label),
        }))
    }

    fn read_meta(&mut self) -> Result<EventVariant<'a>> {
        let start = self.cursor.position();
        let subtype = self.cursor.take_u8().at(start, "meta event type")?;
        let data = match self.cursor.take_vlq_slice() {
            Ok(data) => data,
            Err(ErrorKind::Truncated) if !is_known_meta(subtype) => bail!(Error::new(
                ErrorKind::UnknownMetaType(subtype),
                start + 1,
                "meta event payload"
            )),
            Err(kind) => bail!(Error::new(kind, start + 1, "meta event payload")),
        };
        let payload = match subtype {
            0x51 if data.len() >= 3 => {
                MetaPayload::SetTempo(u24::from_be_bytes([data[0], data[1], data[2]]))
            }
            0x03 => MetaPayload::TrackName(data),
            0x58 if data.len() >= 4 => MetaPayload::TimeSignature {
                numerator: data[0],
                denominator_power_of_two: data[1],
                clocks_per_click: data[2],
                notated_32nds_per_24_clocks: data[3],
            },
            0x06 => MetaPayload::Marker(data),
            0x2F => {
                if !data.is_empty() {
                    debug!(
                        "end of track event carries {} payload bytes, ignoring them",
                        data.len()
                    );
                }
                MetaPayload::EndOfTrack
            }
            _ => {
                debug!(
                    "skipping meta event 0x{:02X} with {} payload bytes",
                    subtype,
                    data.len()
                );
                MetaPayload::Unknown(data)
            }
        };
        Ok(EventVariant::Meta(MetaMessage { subtype, payload }))
    }

    fn read_sysex(&mut self, type_byte: u8) -> Result<EventVariant<'a>> {
        let start = self.cursor.position();
        let raw = self
            .cursor
            .take_vlq_slice()
            .at(start, "sysex payload")?;
        Ok(EventVariant::Sysex(SysexMessage {
            type_byte,
            includes_lead_byte: type_byte == 0xF0,
            raw,
        }))
    }
}
impl<'a, R: EventNameResolver + ?Sized> Iterator for TrackDecoder<'a, R> {
    type Item = Result<EventRecord<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
impl<R: EventNameResolver + ?Sized> core::iter::FusedIterator for TrackDecoder<'_, R> {}
impl<R: ?Sized> fmt::Debug for TrackDecoder<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TrackDecoder")
            .field("position", &self.cursor.position())
            .field("remaining", &self.cursor.remaining())
            .field("running_status", &self.running_status)
            .field("absolute_time", &self.absolute_time)
            .field("end_of_track", &self.end_of_track)
            .finish()
    }
}

/// Meta types with a dedicated payload kind.
fn is_known_meta(subtype: u8) -> bool {
    matches!(subtype, 0x51 | 0x03 | 0x58 | 0x06 | 0x2F)
}

/// The outcome of decoding one track chunk.
///
/// Decoding is not all-or-nothing: if the chunk is corrupted, `events` holds everything decoded
/// before the failure and `error` says where it happened.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DecodedTrack<'a> {
    /// Position of the chunk among the non-header chunks of the file.
    pub index: usize,
    /// The chunk tag, usually `MTrk`.
    pub tag: [u8; 4],
    pub events: Vec<EventRecord<'a>>,
    /// The error that stopped decoding, with its offset into the chunk payload.
    pub error: Option<Error>,
}
impl<'a> DecodedTrack<'a> {
    /// Decode a whole chunk.
    pub fn decode<R: EventNameResolver + ?Sized>(
        index: usize,
        chunk: &RawChunk<'a>,
        names: &'a R,
        options: DecodeOptions,
    ) -> DecodedTrack<'a> {
        let track = TrackDecoder::from_chunk(chunk, names, options).decode();
        if let Some(err) = &track.error {
            debug!(
                "track {} stopped after {} events: {}",
                index,
                track.events.len(),
                err
            );
        }
        DecodedTrack { index, ..track }
    }

    /// Whether the whole payload decoded without error.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the track contains an end-of-track event.
    pub fn end_of_track(&self) -> bool {
        self.events.iter().any(EventRecord::is_end_of_track)
    }

    /// Number of channel messages the event name dictionary could not name.
    pub fn resolver_misses(&self) -> usize {
        self.events
            .iter()
            .filter(|record| {
                matches!(record.event, EventVariant::Channel(msg) if msg.is_resolver_miss())
            })
            .count()
    }
}
