use thiserror::Error;

/// The type of error that occurred while decoding.
///
/// Decoding never fails on a clean end of data between chunks or events; that case is reported as
/// `None` by the relevant iterator.
/// Missing entries in the event name dictionary are not errors either, they only leave the
/// [`ChannelMessage::label`](struct.ChannelMessage.html#structfield.label) empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    /// Fewer bytes were available than a field declares.
    ///
    /// Fatal to the current chunk or track. Missing bytes are never zero-padded.
    #[error("unexpected end of data")]
    Truncated,
    /// A variable-length quantity had more than 5 groups or did not fit in 32 bits.
    #[error("variable-length quantity overflows 32 bits")]
    Overflow,
    /// A data byte appeared where a status byte was expected, but no running status was active.
    #[error("data byte with no running status active")]
    NoRunningStatus,
    /// A meta event of an unknown type whose declared payload could not be read.
    ///
    /// Unknown meta events with a readable payload are skipped over instead.
    #[error("unreadable meta event of unknown type 0x{0:02X}")]
    UnknownMetaType(u8),
    /// A system common or system realtime status, which cannot appear inside a track.
    #[error("status byte 0x{0:02X} cannot appear in a track")]
    UnsupportedStatus(u8),
    /// The file does not start with an `MThd` chunk.
    #[error("missing header chunk")]
    MissingHeader,
    /// The file starts with a `RIFF` tag but is not a well-formed RMID file.
    #[error("invalid rmid wrapper")]
    InvalidRiff,
}

/// Represents an error while decoding an SMF file.
///
/// Carries the [`ErrorKind`](enum.ErrorKind.html), the byte offset at which the failing read
/// started and a short description of what was being read.
/// Offsets are relative to the buffer being read: the whole file while reading chunks, and the
/// chunk payload while decoding track events.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("{kind} while reading {context} at byte {offset}")]
pub struct Error {
    kind: ErrorKind,
    offset: usize,
    context: &'static str,
}
impl Error {
    /// Create a new error.
    #[inline]
    pub const fn new(kind: ErrorKind, offset: usize, context: &'static str) -> Error {
        Error {
            kind,
            offset,
            context,
        }
    }

    /// More information about the error itself.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset where the failing read started.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// What was being read when the error occurred.
    #[inline]
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// Whether this error is a truncation, including unreadable unknown meta events.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Truncated | ErrorKind::UnknownMetaType(_)
        )
    }
}

/// Attach a position and description to a bare `ErrorKind`.
pub(crate) trait ResultExt<T> {
    fn at(self, offset: usize, context: &'static str) -> Result<T>;
}
impl<T> ResultExt<T> for StdResult<T, ErrorKind> {
    #[inline]
    fn at(self, offset: usize, context: &'static str) -> Result<T> {
        self.map_err(|kind| Error::new(kind, offset, context))
    }
}
impl<T> ResultExt<T> for Option<T> {
    /// `None` is read as running out of data.
    #[inline]
    fn at(self, offset: usize, context: &'static str) -> Result<T> {
        self.ok_or(Error::new(ErrorKind::Truncated, offset, context))
    }
}

/// The result type used by the decoder.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
