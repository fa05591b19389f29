//! # Overview
//!
//! `smflist` is a Standard Midi File (SMF) decoder that produces a structured listing of a
//! file: its header plus, for every track chunk, the sequence of delta-time/event pairs.
//!
//! Usage is as simple as:
//!
//! ```rust
//! use smflist::{EventNames, Smf};
//!
//! let bytes = [
//!     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
//!     b'M', b'T', b'r', b'k', 0, 0, 0, 8, 0, 0x90, 0x40, 0x7F, 0, 0xFF, 0x2F, 0,
//! ];
//! let names = EventNames::general_midi();
//! let smf = Smf::parse(&bytes, &names).unwrap();
//!
//! for track in smf.tracks.iter() {
//!     println!("track {} has {} events", track.index, track.events.len());
//! }
//! ```
//!
//! The [`Smf`](struct.Smf.html) struct is the main type in the crate.
//! See its documentation for the structure of decoded MIDI files.
//!
//! # About lifetimes
//!
//! `Smf` borrows both the raw file bytes and the event name dictionary: text and Sysex payloads
//! are slices into the file, and event labels are slices into the dictionary.
//! For this reason, the byte buffer must be loaded separately from the `Smf` structure:
//!
//! ```rust,no_run
//! use std::fs;
//! use smflist::{EventNames, Smf};
//!
//! // Load bytes and names into buffers
//! let bytes = fs::read("song.mid").unwrap();
//! let names = EventNames::load("event-names.json").unwrap();
//!
//! // Decode in a separate step
//! let smf = Smf::parse(&bytes, &names).unwrap();
//! # drop(smf);
//! ```
//!
//! # About errors
//!
//! Decoding errors are local. A failure inside a track stops decoding that track only: the events
//! read so far are kept alongside the error in [`DecodedTrack`](struct.DecodedTrack.html), and the
//! next track is decoded normally.
//! Only a missing or truncated header makes `Smf::parse` fail as a whole.
//!
//! # About features
//!
//! - The `parallel` feature (enabled by default)
//!
//!   Decodes independent tracks on multiple threads through the `rayon` dependency.
//!   Output order always follows the order of chunks in the file.
//!
//! # Lazy decoding
//!
//! [`parse`](fn.parse.html) returns the header and a [`ChunkReader`](struct.ChunkReader.html)
//! positioned after it, and [`TrackDecoder`](struct.TrackDecoder.html) is an iterator over the
//! events of a single chunk, so files can be traversed without collecting anything.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
mod error;

mod prelude {
    pub(crate) use crate::{
        cursor::ByteCursor,
        error::{Error, ErrorKind, Result, ResultExt, StdResult},
        primitive::{u15, u24, u4},
    };
    pub(crate) use core::{convert::TryFrom, fmt, ops};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let mask = !((!T::from(0)) << (range.end - range.start));
        (val >> range.start) & mask
    }
}

mod chunk;
mod cursor;
mod event;
mod names;
mod primitive;
mod riff;
mod smf;
mod track;

pub use crate::{
    chunk::{ChunkKind, ChunkReader, RawChunk},
    cursor::ByteCursor,
    error::{Error, ErrorKind, Result},
    event::{ChannelMessage, EventRecord, EventVariant, MetaMessage, MetaPayload, SysexMessage},
    names::{
        ChannelVoiceEntry, ControllerEntry, EventName, EventNameResolver, EventNames, NamesConfig,
        NamesError, UNKNOWN_EVENT,
    },
    primitive::{Format, Fps, Timing},
    smf::{decode_header, parse, HeaderInfo, Smf},
    track::{Clock, DecodeOptions, DecodedTrack, DecoderState, TrackDecoder},
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u15, u24, u4};
}
