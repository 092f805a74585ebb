// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Raw frame reader for the sensor hub record stream.
//!
//! The character device delivers packed 24-byte records. [`EventReader`]
//! queues whole records in a fixed ring and carries a partial trailing record
//! over to the next fill, so a short read never splits a record.

use std::collections::VecDeque;
use std::io::{self, Read};

use log::trace;

use crate::constants::{
    EVENT_BUFFER_RECORDS, RECORD_BIAS_OFFSET, RECORD_DATA_OFFSET, RECORD_SIZE, RECORD_TAG_OFFSET,
    RECORD_TIME_OFFSET,
};
use crate::error::Result;

/// One packed record from the event stream
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawRecord([u8; RECORD_SIZE]);

impl RawRecord {
    pub fn from_bytes(bytes: [u8; RECORD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Pack field values into a record, padding bytes are zero
    pub fn new(tag: u8, primary: [i16; 3], bias: [i16; 3], timestamp: i64) -> Self {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[RECORD_TAG_OFFSET] = tag;
        for (i, v) in primary.iter().enumerate() {
            let at = RECORD_DATA_OFFSET + 2 * i;
            bytes[at..at + 2].copy_from_slice(&v.to_le_bytes());
        }
        for (i, v) in bias.iter().enumerate() {
            let at = RECORD_BIAS_OFFSET + 2 * i;
            bytes[at..at + 2].copy_from_slice(&v.to_le_bytes());
        }
        bytes[RECORD_TIME_OFFSET..RECORD_TIME_OFFSET + 8].copy_from_slice(&timestamp.to_le_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_SIZE] {
        &self.0
    }

    /// Sensor tag (byte 0)
    #[inline]
    pub fn tag(&self) -> u8 {
        self.0[RECORD_TAG_OFFSET]
    }

    /// The three primary values
    pub fn primary(&self) -> [i16; 3] {
        let mut cursor = RECORD_DATA_OFFSET;
        [
            read_i16(&self.0, &mut cursor),
            read_i16(&self.0, &mut cursor),
            read_i16(&self.0, &mut cursor),
        ]
    }

    /// The three bias/aux values
    pub fn bias(&self) -> [i16; 3] {
        let mut cursor = RECORD_BIAS_OFFSET;
        [
            read_i16(&self.0, &mut cursor),
            read_i16(&self.0, &mut cursor),
            read_i16(&self.0, &mut cursor),
        ]
    }

    /// Device timestamp in nanoseconds
    pub fn timestamp(&self) -> i64 {
        let mut cursor = RECORD_TIME_OFFSET;
        read_i64(&self.0, &mut cursor)
    }
}

impl std::fmt::Debug for RawRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRecord")
            .field("tag", &self.tag())
            .field("primary", &self.primary())
            .field("bias", &self.bias())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

/// Read an i16 (little-endian) at the cursor position and advance cursor
#[inline]
fn read_i16(msg: &[u8], cursor: &mut usize) -> i16 {
    let val = i16::from_le_bytes([msg[*cursor], msg[*cursor + 1]]);
    *cursor += 2;
    val
}

/// Read an i64 (little-endian) at the cursor position and advance cursor
#[inline]
fn read_i64(msg: &[u8], cursor: &mut usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&msg[*cursor..*cursor + 8]);
    *cursor += 8;
    i64::from_le_bytes(raw)
}

/// Ring of whole records read from a byte stream
pub struct EventReader<R> {
    source: R,
    records: VecDeque<RawRecord>,
    capacity: usize,
    /// Bytes of a record split across reads
    partial: [u8; RECORD_SIZE],
    partial_len: usize,
    scratch: Vec<u8>,
}

impl<R: Read> EventReader<R> {
    /// Reader with the default capacity of 1024 records
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, EVENT_BUFFER_RECORDS)
    }

    pub fn with_capacity(source: R, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            source,
            records: VecDeque::with_capacity(capacity),
            capacity,
            partial: [0; RECORD_SIZE],
            partial_len: 0,
            scratch: vec![0; capacity * RECORD_SIZE],
        }
    }

    /// Read from the stream into the free ring space.
    ///
    /// Returns the number of whole records newly queued. This is the only
    /// call that may block.
    pub fn fill(&mut self) -> Result<usize> {
        let free = self.capacity - self.records.len();
        if free == 0 {
            return Ok(0);
        }
        let want = free * RECORD_SIZE - self.partial_len;

        let got = loop {
            match self.source.read(&mut self.scratch[..want]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(0),
                Err(e) => return Err(e.into()),
            }
        };
        trace!("fill read {} bytes, {} carried", got, self.partial_len);

        let before = self.records.len();
        let mut offset = 0;
        while offset < got {
            let take = (RECORD_SIZE - self.partial_len).min(got - offset);
            self.partial[self.partial_len..self.partial_len + take]
                .copy_from_slice(&self.scratch[offset..offset + take]);
            self.partial_len += take;
            offset += take;
            if self.partial_len == RECORD_SIZE {
                self.records.push_back(RawRecord(self.partial));
                self.partial_len = 0;
            }
        }
        Ok(self.records.len() - before)
    }

    /// Oldest queued record, without consuming it
    pub fn read_next(&self) -> Option<RawRecord> {
        self.records.front().copied()
    }

    /// Drop the oldest queued record
    pub fn advance(&mut self) {
        self.records.pop_front();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes of an incomplete record waiting for the next fill
    pub fn pending_bytes(&self) -> usize {
        self.partial_len
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `chunk` bytes per read
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Failing(io::ErrorKind);

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }
    }

    fn stream(records: &[RawRecord]) -> Vec<u8> {
        records.iter().flat_map(|r| r.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_record_fields() {
        let record = RawRecord::new(7, [1, -2, 300], [-4, 5, 0x66], -123_456_789_012);
        assert_eq!(record.tag(), 7);
        assert_eq!(record.primary(), [1, -2, 300]);
        assert_eq!(record.bias(), [-4, 5, 0x66]);
        assert_eq!(record.timestamp(), -123_456_789_012);
        assert_eq!(&record.as_bytes()[21..], &[0, 0, 0], "Padding must stay zero");
    }

    #[test]
    fn test_record_little_endian_layout() {
        let record = RawRecord::new(0x63, [0x0102, 0, 0], [0, 0, 0], 0x0807_0605_0403_0201);
        let bytes = record.as_bytes();
        assert_eq!(bytes[0], 0x63);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(bytes[2], 0x01);
        assert_eq!(&bytes[13..21], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_fill_queues_whole_records() {
        let a = RawRecord::new(0, [1, 2, 3], [0; 3], 10);
        let b = RawRecord::new(2, [4, 5, 6], [0; 3], 20);
        let mut reader = EventReader::new(Cursor::new(stream(&[a, b])));

        assert_eq!(reader.fill().unwrap(), 2);
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read_next(), Some(a));
        // Peeking does not consume
        assert_eq!(reader.read_next(), Some(a));
        reader.advance();
        assert_eq!(reader.read_next(), Some(b));
        reader.advance();
        assert!(reader.is_empty());
        assert_eq!(reader.fill().unwrap(), 0, "EOF should read as no data");
    }

    #[test]
    fn test_partial_record_carried_across_fills() {
        let a = RawRecord::new(0, [1, 2, 3], [0; 3], 10);
        let b = RawRecord::new(1, [7, 8, 9], [1; 3], 20);
        let mut reader = EventReader::new(Trickle {
            data: stream(&[a, b]),
            pos: 0,
            chunk: 30,
        });

        assert_eq!(reader.fill().unwrap(), 1);
        assert_eq!(reader.pending_bytes(), 6);
        assert_eq!(reader.fill().unwrap(), 1);
        assert_eq!(reader.pending_bytes(), 0);
        assert_eq!(reader.read_next(), Some(a));
        reader.advance();
        assert_eq!(reader.read_next(), Some(b));
    }

    #[test]
    fn test_fill_respects_capacity() {
        let records: Vec<_> = (0..5).map(|i| RawRecord::new(0, [i; 3], [0; 3], i as i64)).collect();
        let mut reader = EventReader::with_capacity(Cursor::new(stream(&records)), 3);

        assert_eq!(reader.fill().unwrap(), 3);
        assert_eq!(reader.fill().unwrap(), 0, "Full ring must not read");
        reader.advance();
        assert_eq!(reader.fill().unwrap(), 1);
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.read_next().map(|r| r.primary()[0]), Some(1));
    }

    #[test]
    fn test_would_block_is_empty_read() {
        let mut reader = EventReader::new(Failing(io::ErrorKind::WouldBlock));
        assert_eq!(reader.fill().unwrap(), 0);
    }

    #[test]
    fn test_stream_error_propagates() {
        let mut reader = EventReader::new(Failing(io::ErrorKind::BrokenPipe));
        assert!(reader.fill().is_err());
        assert!(reader.is_empty());
    }
}
