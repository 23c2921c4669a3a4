//! Minimal protobuf wire-format codec.
//!
//! The build tool writes its per-target outputs (dependency manifests,
//! package manifests) as protobuf messages. Only the wire layer is needed to
//! read them: a message is a sequence of `(field number, wire type)` keys,
//! each followed by a varint, fixed-width, or length-delimited value. Unknown
//! fields are skipped so newer producers stay readable.

/// Errors produced while decoding protobuf wire data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The input ended in the middle of a value.
    #[error("truncated message at byte {offset}")]
    Truncated {
        /// Byte offset where more input was expected.
        offset: usize,
    },

    /// A varint ran longer than ten bytes.
    #[error("malformed varint at byte {offset}")]
    VarintOverflow {
        /// Byte offset of the varint.
        offset: usize,
    },

    /// The key carried a wire type this codec does not handle.
    #[error("unsupported wire type {wire_type} at byte {offset}")]
    UnsupportedWireType {
        /// The raw wire type bits.
        wire_type: u8,
        /// Byte offset of the key.
        offset: usize,
    },

    /// A key with field number zero.
    #[error("invalid field number 0 at byte {offset}")]
    InvalidFieldNumber {
        /// Byte offset of the key.
        offset: usize,
    },

    /// A string field did not contain valid UTF-8.
    #[error("invalid UTF-8 in string field at byte {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string payload.
        offset: usize,
    },
}

/// The wire types this codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Base-128 varint.
    Varint,
    /// Little-endian 8-byte value.
    Fixed64,
    /// Varint length followed by that many bytes.
    LengthDelimited,
    /// Little-endian 4-byte value.
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u8, offset: usize) -> Result<Self, WireError> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(WireError::UnsupportedWireType {
                wire_type: other,
                offset,
            }),
        }
    }

    fn bits(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

/// A forward-only cursor over one encoded message.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over an encoded message.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads an unsigned LEB128 varint.
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let start = self.pos;
        let mut value = 0u64;
        for shift in (0..70).step_by(7) {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(WireError::Truncated { offset: self.pos });
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WireError::VarintOverflow { offset: start })
    }

    /// Reads the next field key.
    pub fn read_key(&mut self) -> Result<(u32, WireType), WireError> {
        let offset = self.pos;
        let key = self.read_varint()?;
        let field = (key >> 3) as u32;
        if field == 0 {
            return Err(WireError::InvalidFieldNumber { offset });
        }
        let wire_type = WireType::from_bits((key & 0x7) as u8, offset)?;
        Ok((field, wire_type))
    }

    /// Reads a length-delimited payload and returns it as a borrowed slice.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(WireError::Truncated { offset: self.pos })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a length-delimited UTF-8 string.
    pub fn read_string(&mut self) -> Result<&'a str, WireError> {
        let offset = self.pos;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { offset })
    }

    /// Reads a varint-encoded boolean.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_varint()? != 0)
    }

    /// Skips over a value of the given wire type.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), WireError> {
        let width = match wire_type {
            WireType::Varint => return self.read_varint().map(|_| ()),
            WireType::LengthDelimited => return self.read_bytes().map(|_| ()),
            WireType::Fixed64 => 8,
            WireType::Fixed32 => 4,
        };
        if self.pos + width > self.buf.len() {
            return Err(WireError::Truncated { offset: self.pos });
        }
        self.pos += width;
        Ok(())
    }
}

/// Encodes messages in the same wire format [`WireReader`] decodes.
///
/// Used by test fixtures to produce manifest files.
#[derive(Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a varint field.
    pub fn varint(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, WireType::Varint);
        write_varint(&mut self.buf, value);
        self
    }

    /// Appends a boolean field.
    pub fn bool(&mut self, field: u32, value: bool) -> &mut Self {
        self.varint(field, u64::from(value))
    }

    /// Appends a string field.
    pub fn string(&mut self, field: u32, value: &str) -> &mut Self {
        self.bytes(field, value.as_bytes())
    }

    /// Appends a length-delimited field, e.g. an already encoded sub-message.
    pub fn bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        self.key(field, WireType::LengthDelimited);
        write_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    /// Returns the encoded message.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    fn key(&mut self, field: u32, wire_type: WireType) {
        write_varint(&mut self.buf, (u64::from(field) << 3) | wire_type.bits());
    }
}

/// Writes a varint (unsigned LEB128) to a byte buffer.
fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}
