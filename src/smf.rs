//! Specific to the SMF packaging of MIDI streams.

use crate::{
    chunk::{ChunkReader, RawChunk},
    names::EventNameResolver,
    prelude::*,
    primitive::{Format, Timing},
    riff,
    track::{DecodeOptions, DecodedTrack},
};
use tracing::{debug, warn};

/// How many payload bytes must the track chunks of a file have in order to enable
/// multithreading.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 3 * 1024;

/// A decoded Standard Midi File.
///
/// `tracks` holds one entry per non-header chunk, in file order. Errors are kept per track: a
/// corrupted track never prevents decoding the ones after it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Smf<'a> {
    pub header: HeaderInfo,
    pub tracks: Vec<DecodedTrack<'a>>,
    /// A chunk whose declared length runs past the end of the file.
    ///
    /// No chunk can be read after such a chunk, so it ends the track list.
    pub chunk_error: Option<Error>,
}
impl<'a> Smf<'a> {
    /// Decode a complete file, reporting relative delta-times.
    ///
    /// Fails only if the header chunk is missing or cut short.
    pub fn parse<R: EventNameResolver + ?Sized>(raw: &'a [u8], names: &'a R) -> Result<Smf<'a>> {
        Self::parse_with_options(raw, names, DecodeOptions::default())
    }

    pub fn parse_with_options<R: EventNameResolver + ?Sized>(
        raw: &'a [u8],
        names: &'a R,
        options: DecodeOptions,
    ) -> Result<Smf<'a>> {
        let (header, mut chunks) = parse(raw)?;
        let mut track_chunks = Vec::with_capacity(header.track_count as usize);
        let chunk_error = loop {
            let start = chunks.position();
            match chunks.next_chunk() {
                Ok(Some(chunk)) if chunk.is_header() => {
                    warn!("ignoring duplicate header chunk at byte {}", start);
                }
                Ok(Some(chunk)) => track_chunks.push(chunk),
                Ok(None) => break None,
                Err(err) => break Some(err),
            }
        };
        let tracks = decode_tracks(&track_chunks, names, options);
        if tracks.len() != header.track_count as usize {
            warn!(
                "header declares {} tracks, but the file has {}",
                header.track_count,
                tracks.len()
            );
        }
        Ok(Smf {
            header,
            tracks,
            chunk_error,
        })
    }

    /// Whether every chunk and every track decoded without error.
    pub fn is_complete(&self) -> bool {
        self.chunk_error.is_none() && self.tracks.iter().all(DecodedTrack::is_complete)
    }

    /// All errors recorded while decoding, track errors first.
    pub fn errors(&self) -> impl Iterator<Item = &Error> + '_ {
        self.tracks
            .iter()
            .filter_map(|track| track.error.as_ref())
            .chain(self.chunk_error.iter())
    }
}

fn decode_tracks<'a, R: EventNameResolver + ?Sized>(
    chunks: &[RawChunk<'a>],
    names: &'a R,
    options: DecodeOptions,
) -> Vec<DecodedTrack<'a>> {
    //Attempt to use multiple threads if possible and advantageous
    #[cfg(feature = "parallel")]
    {
        let body_len: usize = chunks.iter().map(|chunk| chunk.payload.len()).sum();
        if chunks.len() > 1 && body_len >= PARALLEL_ENABLE_THRESHOLD {
            use rayon::prelude::*;

            return chunks
                .par_iter()
                .enumerate()
                .map(|(index, chunk)| DecodedTrack::decode(index, chunk, names, options))
                .collect();
        }
    }
    //Fall back to single-threaded
    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| DecodedTrack::decode(index, chunk, names, options))
        .collect()
}

/// Read the header of a file and return a reader over the remaining chunks.
///
/// This is the lazy alternative to [`Smf::parse`](struct.Smf.html#method.parse): chunks can be
/// pulled one by one and handed to a [`TrackDecoder`](struct.TrackDecoder.html) as needed.
/// RMID files are unwrapped first.
pub fn parse(raw: &[u8]) -> Result<(HeaderInfo, ChunkReader<'_>)> {
    let raw = match raw.get(..4) {
        Some(b"RIFF") => {
            debug!("unwrapping rmid file");
            riff::unwrap(raw)?
        }
        _ => raw,
    };
    let mut chunks = ChunkReader::new(raw);
    let header = match chunks.next_chunk()? {
        Some(chunk) if chunk.is_header() => HeaderInfo::decode(chunk.payload)?,
        Some(_) | None => bail!(Error::new(ErrorKind::MissingHeader, 0, "header chunk")),
    };
    Ok((header, chunks))
}

/// The contents of the `MThd` chunk.
///
/// The fields are kept raw. [`format_kind`](#method.format_kind) and
/// [`timing`](#method.timing) interpret them.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct HeaderInfo {
    pub format: u16,
    pub track_count: u16,
    pub division: u16,
}
impl HeaderInfo {
    pub fn new(format: u16, track_count: u16, division: u16) -> HeaderInfo {
        HeaderInfo {
            format,
            track_count,
            division,
        }
    }

    /// Read the three big-endian header fields from an `MThd` payload.
    ///
    /// Payload bytes past the sixth are ignored.
    pub fn decode(payload: &[u8]) -> Result<HeaderInfo> {
        let mut raw = ByteCursor::new(payload);
        let format = raw.take_u16_be().at(0, "header format")?;
        let track_count = raw.take_u16_be().at(2, "header track count")?;
        let division = raw.take_u16_be().at(4, "header division")?;
        Ok(HeaderInfo::new(format, track_count, division))
    }

    /// The track layout, or `None` if the format code is not 0, 1 or 2.
    pub fn format_kind(&self) -> Option<Format> {
        Format::from_code(self.format)
    }

    /// The meaning of a tick, or `None` for a timecode division with a non-SMPTE frame rate.
    pub fn timing(&self) -> Option<Timing> {
        Timing::from_division(self.division)
    }
}

/// Decode an `MThd` payload. Same as [`HeaderInfo::decode`](struct.HeaderInfo.html#method.decode).
#[inline]
pub fn decode_header(payload: &[u8]) -> Result<HeaderInfo> {
    HeaderInfo::decode(payload)
}
