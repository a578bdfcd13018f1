//! Versioned byte layout for moving sketches between processes.
//!
//! All integers are little-endian:
//!
//! ```text
//! magic "HLBF" | version u8 | kind u8 | body
//! bloom body:  m u64 | k u32 | ceil(m / 64) words u64
//! hll body:    p u8  | 2^p register bytes
//! ```
//!
//! The version covers the hash family seeds and the register width; any
//! change to either must bump it.

use crate::counters::HyperLogLogCounter;
use crate::error::{Result, SketchError};
use crate::filters::BloomFilter;

pub const MAGIC: [u8; 4] = *b"HLBF";
pub const SERIAL_VERSION: u8 = 1;

const HEADER_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SketchKind {
    Bloom = 1,
    HyperLogLog = 2,
}

impl SketchKind {
    fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(SketchKind::Bloom),
            2 => Ok(SketchKind::HyperLogLog),
            other => Err(SketchError::InvalidData(format!(
                "unknown sketch kind {other}"
            ))),
        }
    }
}

struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn with_header(kind: SketchKind, capacity: usize) -> Self {
        let mut bytes = Vec::with_capacity(HEADER_LEN + capacity);
        bytes.extend_from_slice(&MAGIC);
        bytes.push(SERIAL_VERSION);
        bytes.push(kind as u8);
        Writer { bytes }
    }

    fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    fn write_u32_le(&mut self, n: u32) {
        self.bytes.extend_from_slice(&n.to_le_bytes());
    }

    fn write_u64_le(&mut self, n: u64) {
        self.bytes.extend_from_slice(&n.to_le_bytes());
    }

    fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

struct Reader<'a> {
    rest: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.rest.len() < n {
            return Err(SketchError::InvalidData(format!(
                "insufficient data for {what}: need {n} bytes, have {}",
                self.rest.len()
            )));
        }
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Ok(head)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, what)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64_le(&mut self, what: &str) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn finish(self) -> Result<()> {
        if !self.rest.is_empty() {
            return Err(SketchError::InvalidData(format!(
                "{} trailing bytes after sketch body",
                self.rest.len()
            )));
        }
        Ok(())
    }
}

fn read_header(bytes: &[u8], expected: SketchKind) -> Result<Reader<'_>> {
    let mut reader = Reader { rest: bytes };
    if reader.take(4, "magic")? != MAGIC {
        return Err(SketchError::InvalidData("bad magic".to_string()));
    }
    let version = reader.read_u8("version")?;
    if version != SERIAL_VERSION {
        return Err(SketchError::InvalidData(format!(
            "unsupported serial version: expected {SERIAL_VERSION}, got {version}"
        )));
    }
    let kind = SketchKind::from_id(reader.read_u8("kind")?)?;
    if kind != expected {
        return Err(SketchError::InvalidData(format!(
            "expected {expected:?} sketch, got {kind:?}"
        )));
    }
    Ok(reader)
}

/// Reads the kind recorded in a serialized sketch header.
pub fn peek_kind(bytes: &[u8]) -> Result<SketchKind> {
    if bytes.len() < HEADER_LEN || bytes[..4] != MAGIC {
        return Err(SketchError::InvalidData("bad magic".to_string()));
    }
    SketchKind::from_id(bytes[5])
}

impl BloomFilter {
    pub fn to_bytes(&self) -> Vec<u8> {
        let words = self.bits_snapshot();
        let mut writer = Writer::with_header(SketchKind::Bloom, 12 + words.len() * 8);
        writer.write_u64_le(self.bit_count() as u64);
        writer.write_u32_le(self.hash_count() as u32);
        for word in words {
            writer.write_u64_le(word);
        }
        writer.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = read_header(bytes, SketchKind::Bloom)?;
        let m = usize::try_from(reader.read_u64_le("bit count")?)
            .map_err(|_| SketchError::InvalidData("bit count overflows usize".to_string()))?;
        let k = reader.read_u32_le("hash count")? as usize;
        if m == 0 {
            return Err(SketchError::InvalidData("bit count is zero".to_string()));
        }
        let num_words = m.div_ceil(64);
        if reader.rest.len() != num_words * 8 {
            return Err(SketchError::InvalidData(format!(
                "expected {} payload bytes for {m} bits, got {}",
                num_words * 8,
                reader.rest.len()
            )));
        }
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(reader.read_u64_le("bit words")?);
        }
        reader.finish()?;
        BloomFilter::from_parts(m, k, words)
    }
}

impl HyperLogLogCounter {
    pub fn to_bytes(&self) -> Vec<u8> {
        let registers = self.registers_snapshot();
        let mut writer = Writer::with_header(SketchKind::HyperLogLog, 1 + registers.len());
        writer.write_u8(self.precision());
        writer.write(&registers);
        writer.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = read_header(bytes, SketchKind::HyperLogLog)?;
        let precision = reader.read_u8("precision")?;
        let len = reader.rest.len();
        let registers = reader.take(len, "registers")?.to_vec();
        HyperLogLogCounter::from_registers(precision, registers)
    }
}
