//! Companion message channel
//!
//! Messages to and from the companion device are small key-value
//! dictionaries with a fixed wire layout:
//!
//! ```text
//! u8 count | count * ( u32 key (LE) | u8 type | u16 length (LE) | value )
//! ```
//!
//! Integers are little-endian and 1, 2 or 4 bytes wide. C strings carry
//! their NUL terminator inside `length`.

/// Capacity of the inbox buffer
pub const INBOX_SIZE: usize = 256;
/// Capacity of the outbox buffer
pub const OUTBOX_SIZE: usize = 64;

const HEADER_LEN: usize = 1;
const TUPLE_HEADER_LEN: usize = 7;

/// Raw inbound message as handed over by the transport
pub type InboxPayload = heapless::Vec<u8, INBOX_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DictError {
    #[error("message is truncated")]
    Truncated,
    #[error("unknown tuple type {0}")]
    UnknownType(u8),
    #[error("key {key} has invalid length {len}")]
    InvalidLength { key: u32, len: u16 },
    #[error("key {key} is not valid UTF-8")]
    InvalidUtf8 { key: u32 },
    #[error("message buffer is full")]
    BufferFull,
    #[error("too many tuples in one message")]
    TooManyTuples,
}

/// Why a message did not make it across the companion link
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeliveryError {
    #[error("send timed out")]
    SendTimeout,
    #[error("send rejected by the companion")]
    SendRejected,
    #[error("companion not connected")]
    NotConnected,
    #[error("outbox busy")]
    Busy,
    #[error("message does not fit the buffer")]
    BufferOverflow,
    #[error("channel closed")]
    Closed,
}

/// Sending half of the companion channel.
///
/// A successful `send` only means the payload was queued; delivery is
/// reported later through the outbox sent/failed events.
pub trait Outbox {
    fn send(&mut self, payload: &[u8]) -> Result<(), DeliveryError>;
}

impl<T: Outbox + ?Sized> Outbox for &mut T {
    fn send(&mut self, payload: &[u8]) -> Result<(), DeliveryError> {
        (**self).send(payload)
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TupleType {
    ByteArray = 0,
    CString = 1,
    UInt = 2,
    Int = 3,
}

impl TryFrom<u8> for TupleType {
    type Error = DictError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ByteArray),
            1 => Ok(Self::CString),
            2 => Ok(Self::UInt),
            3 => Ok(Self::Int),
            other => Err(DictError::UnknownType(other)),
        }
    }
}

/// Decoded value of one dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleValue<'a> {
    ByteArray(&'a [u8]),
    CString(&'a str),
    UInt(u32),
    Int(i32),
}

impl TupleValue<'_> {
    /// Integer view of the value, for either signedness
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Int(value) => Some(value),
            Self::UInt(value) => i32::try_from(value).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Self::CString(value) => Some(value),
            _ => None,
        }
    }
}

/// One dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuple<'a> {
    pub key: u32,
    pub value: TupleValue<'a>,
}

/// Read-only view over an encoded dictionary
#[derive(Debug, Clone, Copy)]
pub struct Dictionary<'a> {
    count: u8,
    body: &'a [u8],
}

impl<'a> Dictionary<'a> {
    /// Check the header; entries are decoded lazily by [`Dictionary::iter`].
    pub fn new(data: &'a [u8]) -> Result<Self, DictError> {
        match data.split_first() {
            Some((&count, body)) => Ok(Self { count, body }),
            None => Err(DictError::Truncated),
        }
    }

    /// Number of entries announced in the header
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> TupleIter<'a> {
        TupleIter {
            remaining: self.count,
            data: self.body,
        }
    }
}

impl<'a> IntoIterator for &Dictionary<'a> {
    type Item = Result<Tuple<'a>, DictError>;
    type IntoIter = TupleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over dictionary entries, stops after the first error
pub struct TupleIter<'a> {
    remaining: u8,
    data: &'a [u8],
}

impl<'a> TupleIter<'a> {
    fn decode(&mut self) -> Result<Tuple<'a>, DictError> {
        if self.data.len() < TUPLE_HEADER_LEN {
            return Err(DictError::Truncated);
        }
        let (header, rest) = self.data.split_at(TUPLE_HEADER_LEN);
        let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let kind = TupleType::try_from(header[4])?;
        let len = u16::from_le_bytes([header[5], header[6]]);
        if rest.len() < len as usize {
            return Err(DictError::Truncated);
        }
        let (raw, rest) = rest.split_at(len as usize);

        let value = match kind {
            TupleType::ByteArray => TupleValue::ByteArray(raw),
            TupleType::CString => {
                // Everything after the first NUL is padding
                let text = raw.split(|&b| b == 0).next().unwrap_or(raw);
                let text =
                    core::str::from_utf8(text).map_err(|_| DictError::InvalidUtf8 { key })?;
                TupleValue::CString(text)
            }
            TupleType::UInt => TupleValue::UInt(match *raw {
                [b0] => b0 as u32,
                [b0, b1] => u16::from_le_bytes([b0, b1]) as u32,
                [b0, b1, b2, b3] => u32::from_le_bytes([b0, b1, b2, b3]),
                _ => return Err(DictError::InvalidLength { key, len }),
            }),
            TupleType::Int => TupleValue::Int(match *raw {
                [b0] => b0 as i8 as i32,
                [b0, b1] => i16::from_le_bytes([b0, b1]) as i32,
                [b0, b1, b2, b3] => i32::from_le_bytes([b0, b1, b2, b3]),
                _ => return Err(DictError::InvalidLength { key, len }),
            }),
        };

        self.data = rest;
        Ok(Tuple { key, value })
    }
}

impl<'a> Iterator for TupleIter<'a> {
    type Item = Result<Tuple<'a>, DictError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.decode() {
            Ok(tuple) => {
                self.remaining -= 1;
                Some(Ok(tuple))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Encodes a dictionary into a caller-provided buffer
pub struct DictionaryWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    count: u8,
}

impl<'a> DictionaryWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Result<Self, DictError> {
        if buf.len() < HEADER_LEN {
            return Err(DictError::BufferFull);
        }
        buf[0] = 0;
        Ok(Self {
            buf,
            len: HEADER_LEN,
            count: 0,
        })
    }

    fn write_tuple(&mut self, key: u32, kind: TupleType, parts: &[&[u8]]) -> Result<(), DictError> {
        let value_len: usize = parts.iter().map(|part| part.len()).sum();
        let len = u16::try_from(value_len).map_err(|_| DictError::BufferFull)?;
        let count = self.count.checked_add(1).ok_or(DictError::TooManyTuples)?;
        let end = self.len + TUPLE_HEADER_LEN + value_len;
        if end > self.buf.len() {
            return Err(DictError::BufferFull);
        }

        let mut pos = self.len;
        self.buf[pos..pos + 4].copy_from_slice(&key.to_le_bytes());
        self.buf[pos + 4] = kind as u8;
        self.buf[pos + 5..pos + 7].copy_from_slice(&len.to_le_bytes());
        pos += TUPLE_HEADER_LEN;
        for part in parts {
            self.buf[pos..pos + part.len()].copy_from_slice(part);
            pos += part.len();
        }

        self.len = end;
        self.count = count;
        self.buf[0] = count;
        Ok(())
    }

    pub fn write_uint8(&mut self, key: u32, value: u8) -> Result<(), DictError> {
        self.write_tuple(key, TupleType::UInt, &[&[value]])
    }

    pub fn write_uint32(&mut self, key: u32, value: u32) -> Result<(), DictError> {
        self.write_tuple(key, TupleType::UInt, &[&value.to_le_bytes()])
    }

    pub fn write_int32(&mut self, key: u32, value: i32) -> Result<(), DictError> {
        self.write_tuple(key, TupleType::Int, &[&value.to_le_bytes()])
    }

    /// Write a string, NUL terminator included
    pub fn write_cstring(&mut self, key: u32, value: &str) -> Result<(), DictError> {
        self.write_tuple(key, TupleType::CString, &[value.as_bytes(), &[0]])
    }

    pub fn write_data(&mut self, key: u32, value: &[u8]) -> Result<(), DictError> {
        self.write_tuple(key, TupleType::ByteArray, &[value])
    }

    /// Encoded bytes written so far
    pub fn finish(self) -> &'a [u8] {
        let len = self.len;
        let buf: &'a [u8] = self.buf;
        &buf[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_weather_request() {
        let mut buf = [0u8; OUTBOX_SIZE];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        writer.write_uint8(0, 0).unwrap();
        assert_eq!(writer.finish(), &[1, 0, 0, 0, 0, 2, 1, 0, 0]);
    }

    #[test]
    fn decodes_weather_report() {
        let mut buf = [0u8; OUTBOX_SIZE];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        writer.write_int32(0, -4).unwrap();
        writer.write_cstring(1, "Snow").unwrap();
        let data = writer.finish();

        let dict = Dictionary::new(data).unwrap();
        assert_eq!(dict.len(), 2);
        let tuples: Vec<_> = dict.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            tuples,
            vec![
                Tuple { key: 0, value: TupleValue::Int(-4) },
                Tuple { key: 1, value: TupleValue::CString("Snow") },
            ]
        );
    }

    #[test]
    fn narrow_integers_are_widened() {
        // key 7, int, 2 bytes, -300
        let data = [1, 7, 0, 0, 0, 3, 2, 0, 0xd4, 0xfe];
        let dict = Dictionary::new(&data).unwrap();
        let tuple = dict.iter().next().unwrap().unwrap();
        assert_eq!(tuple.value.as_i32(), Some(-300));

        // key 7, uint, 1 byte, 200
        let data = [1, 7, 0, 0, 0, 2, 1, 0, 200];
        let dict = Dictionary::new(&data).unwrap();
        assert_eq!(dict.iter().next().unwrap().unwrap().value, TupleValue::UInt(200));
    }

    #[test]
    fn truncated_message_stops_iteration() {
        let data = [2, 0, 0, 0, 0, 3, 4, 0, 72, 0, 0, 0, 1, 0, 0];
        let dict = Dictionary::new(&data).unwrap();
        let mut iter = dict.iter();
        assert_eq!(iter.next().unwrap().unwrap().value, TupleValue::Int(72));
        assert_eq!(iter.next(), Some(Err(DictError::Truncated)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn rejects_bad_type_and_width() {
        let data = [1, 0, 0, 0, 0, 9, 1, 0, 0];
        let dict = Dictionary::new(&data).unwrap();
        assert_eq!(dict.iter().next(), Some(Err(DictError::UnknownType(9))));

        let data = [1, 5, 0, 0, 0, 3, 3, 0, 1, 2, 3];
        let dict = Dictionary::new(&data).unwrap();
        assert_eq!(
            dict.iter().next(),
            Some(Err(DictError::InvalidLength { key: 5, len: 3 }))
        );
    }

    #[test]
    fn empty_buffer_is_truncated() {
        assert!(matches!(Dictionary::new(&[]), Err(DictError::Truncated)));
    }

    #[test]
    fn writer_reports_full_buffer() {
        let mut buf = [0u8; 12];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        assert_eq!(writer.write_cstring(1, "Thunderstorms"), Err(DictError::BufferFull));
        writer.write_uint8(0, 0).unwrap();
        assert_eq!(writer.finish().len(), 9);
    }
}
