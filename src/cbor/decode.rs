use super::value::Value;

/// Maximum nesting of arrays/maps. WebAuthn attestation objects are three
/// levels deep; anything past this is hostile input.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated input")]
    Truncated,
    #[error("unsupported type (initial byte {0:#04x})")]
    UnsupportedType(u8),
    #[error("text string is not valid UTF-8")]
    InvalidUtf8,
    #[error("declared length {declared} exceeds {remaining} remaining bytes")]
    LengthOverflow { declared: u64, remaining: usize },
    #[error("nesting exceeds {MAX_DEPTH} levels")]
    DepthExceeded,
    #[error("{0} trailing bytes after top-level value")]
    TrailingBytes(usize),
}

/// Decode a single CBOR value spanning the whole input.
///
/// Supports the subset WebAuthn uses: major types 0-5 and the simple
/// values false/true/null. Tags, indefinite lengths, and floats are
/// rejected. Every declared length is checked against the bytes actually
/// remaining before any allocation, so a short hostile prefix cannot
/// demand unbounded work.
pub fn decode(input: &[u8]) -> Result<Value, DecodeError> {
    let mut reader = Reader { input, pos: 0 };
    let value = reader.value(0)?;
    let rest = input.len() - reader.pos;
    if rest != 0 {
        return Err(DecodeError::TrailingBytes(rest));
    }
    Ok(value)
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::DepthExceeded);
        }
        let initial = self.byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            0 => Ok(Value::Unsigned(self.argument(initial, info)?)),
            1 => Ok(Value::Negative(self.argument(initial, info)?)),
            2 => {
                let len = self.length(initial, info)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            3 => {
                let len = self.length(initial, info)?;
                let raw = self.take(len)?;
                let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
                Ok(Value::Text(text.to_string()))
            }
            4 => {
                let count = self.count(initial, info, 1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            5 => {
                let count = self.count(initial, info, 2)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = self.value(depth + 1)?;
                    let val = self.value(depth + 1)?;
                    entries.push((key, val));
                }
                Ok(Value::Map(entries))
            }
            7 => match info {
                20 => Ok(Value::Bool(false)),
                21 => Ok(Value::Bool(true)),
                22 => Ok(Value::Null),
                _ => Err(DecodeError::UnsupportedType(initial)),
            },
            // Major 6 (tags) and anything else WebAuthn never emits.
            _ => Err(DecodeError::UnsupportedType(initial)),
        }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self.input.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&[u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        let slice = self.input.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    /// Read the additional-info argument: inline below 24, else a
    /// 1/2/4/8-byte big-endian value.
    fn argument(&mut self, initial: u8, info: u8) -> Result<u64, DecodeError> {
        match info {
            0..=23 => Ok(info as u64),
            24 => Ok(self.byte()? as u64),
            25 => {
                let raw = self.take(2)?;
                Ok(u16::from_be_bytes(raw.try_into().unwrap()) as u64)
            }
            26 => {
                let raw = self.take(4)?;
                Ok(u32::from_be_bytes(raw.try_into().unwrap()) as u64)
            }
            27 => {
                let raw = self.take(8)?;
                Ok(u64::from_be_bytes(raw.try_into().unwrap()))
            }
            // 28-30 reserved, 31 indefinite — neither appears in WebAuthn.
            _ => Err(DecodeError::UnsupportedType(initial)),
        }
    }

    /// Byte-string/text length, bounded by the input still unread.
    fn length(&mut self, initial: u8, info: u8) -> Result<usize, DecodeError> {
        let declared = self.argument(initial, info)?;
        let remaining = self.input.len() - self.pos;
        if declared > remaining as u64 {
            return Err(DecodeError::LengthOverflow { declared, remaining });
        }
        Ok(declared as usize)
    }

    /// Array/map element count; every element costs at least
    /// `min_bytes_each` bytes of input, which bounds the allocation.
    fn count(&mut self, initial: u8, info: u8, min_bytes_each: u64) -> Result<usize, DecodeError> {
        let declared = self.argument(initial, info)?;
        let remaining = self.input.len() - self.pos;
        if declared.saturating_mul(min_bytes_each) > remaining as u64 {
            return Err(DecodeError::LengthOverflow { declared, remaining });
        }
        Ok(declared as usize)
    }
}
