//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, ShelfError};

use super::{WalEntry, HEADER_SIZE};

/// Outcome of reading one frame
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete entry with a valid checksum
    Entry(WalEntry),

    /// Clean end of file on a frame boundary
    End,

    /// The file ends inside a frame (partial write)
    Torn,

    /// A complete frame whose checksum or payload is bad
    Corrupt(String),
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last complete, valid entry
    position: u64,

    /// File length at open time
    file_len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A torn or corrupted frame
    /// is reported as `ShelfError::WalCorruption`.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.read_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Torn => Err(ShelfError::WalCorruption(format!(
                "Partial entry at offset {}",
                self.position
            ))),
            Frame::Corrupt(reason) => Err(ShelfError::WalCorruption(reason)),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn read_frame(&mut self) -> Result<Frame> {
        let mut header = [0u8; HEADER_SIZE];
        let filled = read_fully(&mut self.reader, &mut header)?;
        if filled == 0 {
            return Ok(Frame::End);
        }
        if filled < HEADER_SIZE {
            return Ok(Frame::Torn);
        }

        let (lsn, crc, len) = WalEntry::decode_header(&header)?;

        // A length pointing past EOF is a torn write, not a reason to allocate
        let frame_end = self.position + HEADER_SIZE as u64 + u64::from(len);
        if frame_end > self.file_len {
            return Ok(Frame::Torn);
        }

        let mut payload = vec![0u8; len as usize];
        match self.reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(Frame::Torn),
            Err(e) => return Err(e.into()),
        }

        match WalEntry::from_payload(lsn, crc, &payload) {
            Ok(entry) => {
                self.position = frame_end;
                Ok(Frame::Entry(entry))
            }
            Err(ShelfError::WalCorruption(reason)) => Ok(Frame::Corrupt(reason)),
            Err(e) => Err(e),
        }
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read
fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over WAL entries
///
/// Yields one error and then stops if a bad frame is found.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
