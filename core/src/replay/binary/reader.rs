//! Binary recording format reader
//!
//! Reads .ttrp recordings with automatic decompression and checksum
//! verification. Every malformed input maps to a [`LoadError`].

use byteorder::{LittleEndian, ReadBytesExt};
use lz4_flex::decompress_size_prepended;
use std::io::{self, Cursor, Read};
use xxhash_rust::xxh3::xxh3_64;

use super::{MAGIC, MAX_BLOCK_SIZE};
use crate::error::LoadError;
use crate::replay::types::*;

/// Reader for binary recording format
pub struct BinaryReader<R: Read> {
    reader: R,
}

impl<R: Read> BinaryReader<R> {
    /// Create a new binary reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read a complete recording from the input
    pub fn read_recording(&mut self) -> Result<Recording, LoadError> {
        let mut magic = [0u8; 4];
        self.reader.read_exact(&mut magic).map_err(truncated)?;
        if magic != MAGIC {
            return Err(LoadError::Corrupt(format!(
                "bad magic {:02x?} (expected {:02x?})",
                magic, MAGIC
            )));
        }

        let header = self.read_header().map_err(truncated)?;

        let stored = self.read_block().map_err(truncated)?;
        let block = if header.flags.contains(RecordingFlags::COMPRESSED_EVENTS) {
            decompress_size_prepended(&stored)
                .map_err(|e| LoadError::Corrupt(format!("event stream: {}", e)))?
        } else {
            stored
        };

        let checkpoints = if header.flags.contains(RecordingFlags::HAS_CHECKPOINTS) {
            self.read_checkpoints()?
        } else {
            Vec::new()
        };

        let expected = self.reader.read_u64::<LittleEndian>().map_err(truncated)?;
        let actual = xxh3_64(&block);
        if expected != actual {
            return Err(LoadError::Checksum { expected, actual });
        }

        let events = decode_events(&block, header.event_count)?;

        Ok(Recording {
            header,
            events,
            checkpoints,
        })
    }

    /// Read the 24-byte header
    fn read_header(&mut self) -> io::Result<RecordingHeader> {
        let sim_id = self.reader.read_u8()?;
        let flags = RecordingFlags::from_bits_truncate(self.reader.read_u8()?);

        let mut reserved = [0u8; 6];
        self.reader.read_exact(&mut reserved)?;

        let seed = self.reader.read_u64::<LittleEndian>()?;
        let event_count = self.reader.read_u64::<LittleEndian>()?;

        Ok(RecordingHeader {
            sim_id,
            flags,
            reserved,
            seed,
            event_count,
        })
    }

    /// Read a u32-length-prefixed block
    fn read_block(&mut self) -> io::Result<Vec<u8>> {
        let len = self.reader.read_u32::<LittleEndian>()? as usize;
        if len > MAX_BLOCK_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("block length {} exceeds limit", len),
            ));
        }
        let mut block = vec![0u8; len];
        self.reader.read_exact(&mut block)?;
        Ok(block)
    }

    /// Read checkpoints
    fn read_checkpoints(&mut self) -> Result<Vec<Checkpoint>, LoadError> {
        let count = self.reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        let mut checkpoints = Vec::with_capacity(count.min(1024));

        for _ in 0..count {
            let event_index = self.reader.read_u64::<LittleEndian>().map_err(truncated)?;
            let compressed = self.read_block().map_err(truncated)?;
            let state = decompress_size_prepended(&compressed)
                .map_err(|e| LoadError::Corrupt(format!("checkpoint {}: {}", event_index, e)))?;
            checkpoints.push(Checkpoint { event_index, state });
        }

        Ok(checkpoints)
    }
}

/// Rebuild the event list from the uncompressed block.
fn decode_events(block: &[u8], event_count: u64) -> Result<EventSequence, LoadError> {
    let mut cursor = Cursor::new(block);
    let mut events = EventSequence::new();
    let mut tick = 0u64;

    for index in 0..event_count {
        let delta = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
        tick = tick
            .checked_add(delta)
            .ok_or_else(|| LoadError::Corrupt(format!("tick overflow at event {}", index)))?;

        let len = cursor.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        let remaining = block.len() - cursor.position() as usize;
        if len > remaining {
            return Err(LoadError::Corrupt(format!(
                "event {} payload of {} bytes overruns stream",
                index, len
            )));
        }
        let mut payload = vec![0u8; len];
        cursor.read_exact(&mut payload).map_err(truncated)?;

        events.push(RecordedEvent { tick, payload });
    }

    if (cursor.position() as usize) != block.len() {
        return Err(LoadError::Corrupt(format!(
            "{} trailing bytes after {} events",
            block.len() - cursor.position() as usize,
            event_count
        )));
    }

    Ok(events)
}

/// Short reads and bad lengths mean the file is corrupt; other I/O errors
/// stay I/O errors.
fn truncated(e: io::Error) -> LoadError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => LoadError::Corrupt("unexpected end of data".to_string()),
        io::ErrorKind::InvalidData => LoadError::Corrupt(e.to_string()),
        _ => LoadError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::binary::writer::BinaryWriter;

    fn sample_recording(flags: RecordingFlags) -> Recording {
        let mut events = EventSequence::new();
        for i in 0..100u64 {
            // Mostly idle input compresses well
            let payload = if i % 10 == 0 { vec![0x01, 0x02] } else { vec![0x00] };
            events.push(RecordedEvent { tick: i / 2, payload });
        }

        let checkpoints = if flags.contains(RecordingFlags::HAS_CHECKPOINTS) {
            vec![Checkpoint {
                event_index: 0,
                state: vec![0xAA; 64],
            }]
        } else {
            Vec::new()
        };

        Recording {
            header: RecordingHeader {
                sim_id: 1,
                flags,
                reserved: [0; 6],
                seed: 99,
                event_count: 100,
            },
            events,
            checkpoints,
        }
    }

    fn encode(recording: &Recording) -> Vec<u8> {
        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer)
            .write_recording(recording)
            .unwrap();
        buffer
    }

    #[test]
    fn test_roundtrip_empty() {
        let recording = Recording::default();
        let parsed = BinaryReader::new(encode(&recording).as_slice())
            .read_recording()
            .unwrap();
        assert_eq!(parsed, recording);
    }

    #[test]
    fn test_roundtrip_compressed_with_checkpoints() {
        let recording =
            sample_recording(RecordingFlags::COMPRESSED_EVENTS | RecordingFlags::HAS_CHECKPOINTS);
        let buffer = encode(&recording);

        let raw = encode(&sample_recording(RecordingFlags::HAS_CHECKPOINTS));
        assert!(buffer.len() < raw.len());

        let parsed = BinaryReader::new(buffer.as_slice()).read_recording().unwrap();
        assert_eq!(parsed, recording);
        assert_eq!(parsed.events.get(10).unwrap().tick, 5);
        assert_eq!(parsed.initial_state().unwrap().state.len(), 64);
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let mut buffer = encode(&sample_recording(RecordingFlags::empty()));
        buffer[0] = b'X';
        let err = BinaryReader::new(buffer.as_slice()).read_recording().unwrap_err();
        assert!(matches!(err, LoadError::Corrupt(_)));
    }

    #[test]
    fn test_truncated_is_corrupt() {
        let buffer = encode(&sample_recording(RecordingFlags::COMPRESSED_EVENTS));
        let err = BinaryReader::new(&buffer[..buffer.len() / 2])
            .read_recording()
            .unwrap_err();
        assert!(matches!(err, LoadError::Corrupt(_)));
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let mut buffer = encode(&sample_recording(RecordingFlags::empty()));
        // First event payload starts after magic, header, block length,
        // tick delta and payload length.
        let offset = 4 + 24 + 4 + 8 + 4;
        buffer[offset] ^= 0xFF;

        let err = BinaryReader::new(buffer.as_slice()).read_recording().unwrap_err();
        assert!(matches!(err, LoadError::Checksum { .. }));
    }

    #[test]
    fn test_event_count_mismatch_is_corrupt() {
        let mut buffer = encode(&sample_recording(RecordingFlags::empty()));
        // event_count lives in the last 8 header bytes
        buffer[4 + 16..4 + 24].copy_from_slice(&50u64.to_le_bytes());

        let err = BinaryReader::new(buffer.as_slice()).read_recording().unwrap_err();
        assert!(matches!(err, LoadError::Corrupt(msg) if msg.contains("trailing bytes")));
    }
}
