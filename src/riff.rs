//! There's an abomination called RMID, MIDI embedded in a RIFF file.
//! Support for these files is provided by unwrapping the input slice, stripping away the RIFF
//! wrappers around the raw SMF file.

use crate::prelude::*;

/// RIFF chunks, which unlike SMF chunks use little-endian lengths and are padded to even sizes.
struct ChunkIter<'a>(ByteCursor<'a>);
impl<'a> Iterator for ChunkIter<'a> {
    type Item = ([u8; 4], &'a [u8]);
    fn next(&mut self) -> Option<([u8; 4], &'a [u8])> {
        let id = self.0.take_array::<4>()?;
        let len = u32::from_le_bytes(self.0.take_array::<4>()?) as usize;
        let data = match self.0.take(len) {
            Some(data) => data,
            //Just use the remainder of the file
            None => self.0.take(self.0.remaining())?,
        };
        if len % 2 == 1 {
            let _pad = self.0.take(1);
        }
        Some((id, data))
    }
}

pub fn unwrap(raw: &[u8]) -> Result<&[u8]> {
    let (id, riff) = ChunkIter(ByteCursor::new(raw))
        .next()
        .ok_or(Error::new(ErrorKind::InvalidRiff, 0, "main riff chunk"))?;
    ensure!(
        &id == b"RIFF",
        Error::new(ErrorKind::InvalidRiff, 0, "main riff chunk")
    );
    let mut riff = ByteCursor::new(riff);
    let formtype = riff
        .take(4)
        .ok_or(Error::new(ErrorKind::InvalidRiff, 8, "riff form type"))?;
    ensure!(
        formtype == b"RMID",
        Error::new(ErrorKind::InvalidRiff, 8, "riff form type")
    );
    for (id, chunk) in ChunkIter(riff) {
        if &id == b"data" {
            return Ok(chunk);
        }
    }
    bail!(Error::new(ErrorKind::InvalidRiff, 12, "rmid data chunk"))
}
