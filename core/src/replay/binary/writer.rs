//! Binary recording format writer
//!
//! Writes .ttrp recordings with optional compression.

use byteorder::{LittleEndian, WriteBytesExt};
use lz4_flex::compress_prepend_size;
use std::io::{self, Write};
use xxhash_rust::xxh3::xxh3_64;

use super::MAGIC;
use crate::replay::types::*;

/// Writer for binary recording format
pub struct BinaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a complete recording to the output
    pub fn write_recording(&mut self, recording: &Recording) -> io::Result<()> {
        if recording.header.event_count != recording.events.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "header declares {} events but recording holds {}",
                    recording.header.event_count,
                    recording.events.len()
                ),
            ));
        }
        if !recording.events.is_tick_ordered() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "event ticks must be non-decreasing",
            ));
        }

        self.writer.write_all(&MAGIC)?;
        self.write_header(&recording.header)?;

        let block = encode_events(&recording.events)?;
        let checksum = xxh3_64(&block);

        if recording.header.flags.contains(RecordingFlags::COMPRESSED_EVENTS) {
            let compressed = compress_prepend_size(&block);
            self.write_block(&compressed)?;
        } else {
            self.write_block(&block)?;
        }

        if recording.header.flags.contains(RecordingFlags::HAS_CHECKPOINTS) {
            self.write_checkpoints(&recording.checkpoints)?;
        }

        self.writer.write_u64::<LittleEndian>(checksum)?;
        self.writer.flush()
    }

    /// Write the 24-byte header
    fn write_header(&mut self, header: &RecordingHeader) -> io::Result<()> {
        self.writer.write_u8(header.sim_id)?;
        self.writer.write_u8(header.flags.bits())?;
        self.writer.write_all(&header.reserved)?;
        self.writer.write_u64::<LittleEndian>(header.seed)?;
        self.writer.write_u64::<LittleEndian>(header.event_count)?;
        Ok(())
    }

    fn write_block(&mut self, block: &[u8]) -> io::Result<()> {
        self.writer.write_u32::<LittleEndian>(block_len(block.len())?)?;
        self.writer.write_all(block)
    }

    /// Write checkpoints
    fn write_checkpoints(&mut self, checkpoints: &[Checkpoint]) -> io::Result<()> {
        self.writer
            .write_u32::<LittleEndian>(block_len(checkpoints.len())?)?;

        for checkpoint in checkpoints {
            self.writer.write_u64::<LittleEndian>(checkpoint.event_index)?;
            let compressed = compress_prepend_size(&checkpoint.state);
            self.write_block(&compressed)?;
        }

        Ok(())
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Serialize events as (tick delta, payload length, payload) triples.
fn encode_events(events: &EventSequence) -> io::Result<Vec<u8>> {
    let mut block = Vec::new();
    let mut prev_tick = 0u64;

    for event in events.iter() {
        block.write_u64::<LittleEndian>(event.tick - prev_tick)?;
        block.write_u32::<LittleEndian>(block_len(event.payload.len())?)?;
        block.write_all(&event.payload)?;
        prev_tick = event.tick;
    }

    Ok(block)
}

fn block_len(len: usize) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block of {} bytes is too large", len),
        )
    })
}
