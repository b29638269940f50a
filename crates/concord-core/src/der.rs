//! Minimal DER codec for ring sections and key bags
//!
//! Only the handful of value shapes a ring needs are supported:
//! ```text
//! TAG     VALUE
//! ──────────────────────────────────────────────────────
//! 0x01    BOOLEAN
//! 0x02    INTEGER (signed, 1-8 content bytes)
//! 0x04    OCTET STRING
//! 0x0C    UTF8String
//! 0x30    SEQUENCE of values
//! 0x31    dictionary: SET of SEQUENCE { UTF8String key, value }
//! 0xA1    string set: [1] constructed, UTF8String members
//! ```
//!
//! Encoding is canonical: dictionary keys and set members are emitted in
//! ascending order, lengths and integers use their minimal form. The decoder
//! rejects anything the encoder would not have produced.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::MAX_DER_DEPTH;

pub const TAG_BOOLEAN: u8 = 0x01;
pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_UTF8_STRING: u8 = 0x0C;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_DICTIONARY: u8 = 0x31;
pub const TAG_STRING_SET: u8 = 0xA1;

/// A decoded DER value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerValue {
    Boolean(bool),
    Integer(i64),
    Bytes(Vec<u8>),
    String(String),
    StringSet(BTreeSet<String>),
    Dictionary(BTreeMap<String, DerValue>),
    Sequence(Vec<DerValue>),
}

impl DerValue {
    /// Human-readable name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DerValue::Boolean(_) => "boolean",
            DerValue::Integer(_) => "integer",
            DerValue::Bytes(_) => "bytes",
            DerValue::String(_) => "string",
            DerValue::StringSet(_) => "string set",
            DerValue::Dictionary(_) => "dictionary",
            DerValue::Sequence(_) => "sequence",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DerValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DerValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DerValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_string_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            DerValue::StringSet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, DerValue>> {
        match self {
            DerValue::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Serialize to canonical DER
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Append the canonical DER encoding to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            DerValue::Boolean(b) => {
                write_header(out, TAG_BOOLEAN, 1);
                out.push(if *b { 0xFF } else { 0x00 });
            }
            DerValue::Integer(v) => {
                let bytes = v.to_be_bytes();
                let start = minimal_integer_start(&bytes);
                write_header(out, TAG_INTEGER, bytes.len() - start);
                out.extend_from_slice(&bytes[start..]);
            }
            DerValue::Bytes(b) => {
                write_header(out, TAG_OCTET_STRING, b.len());
                out.extend_from_slice(b);
            }
            DerValue::String(s) => encode_string(out, s),
            DerValue::StringSet(set) => {
                let mut content = Vec::new();
                for member in set {
                    encode_string(&mut content, member);
                }
                write_header(out, TAG_STRING_SET, content.len());
                out.extend_from_slice(&content);
            }
            DerValue::Dictionary(map) => {
                let mut content = Vec::new();
                for (key, value) in map {
                    let mut entry = Vec::new();
                    encode_string(&mut entry, key);
                    value.encode_into(&mut entry);
                    write_header(&mut content, TAG_SEQUENCE, entry.len());
                    content.extend_from_slice(&entry);
                }
                write_header(out, TAG_DICTIONARY, content.len());
                out.extend_from_slice(&content);
            }
            DerValue::Sequence(items) => {
                let mut content = Vec::new();
                for item in items {
                    item.encode_into(&mut content);
                }
                write_header(out, TAG_SEQUENCE, content.len());
                out.extend_from_slice(&content);
            }
        }
    }
}

fn encode_string(out: &mut Vec<u8>, s: &str) {
    write_header(out, TAG_UTF8_STRING, s.len());
    out.extend_from_slice(s.as_bytes());
}

fn write_header(out: &mut Vec<u8>, tag: u8, len: usize) {
    out.push(tag);
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
}

/// Index of the first byte of the minimal two's complement form
fn minimal_integer_start(bytes: &[u8; 8]) -> usize {
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    start
}

/// Split one TLV off the front of `input`: (tag, content, rest)
fn read_tlv(input: &[u8]) -> Result<(u8, &[u8], &[u8])> {
    let (&tag, after_tag) = input
        .split_first()
        .ok_or_else(|| Error::Decode("unexpected end of input".to_string()))?;
    let (&first, mut rest) = after_tag
        .split_first()
        .ok_or_else(|| Error::Decode("missing length".to_string()))?;

    let len = if first < 0x80 {
        first as usize
    } else if first == 0x80 {
        return Err(Error::Decode("indefinite length not allowed".to_string()));
    } else {
        let count = (first & 0x7F) as usize;
        if count > std::mem::size_of::<usize>() || count > rest.len() {
            return Err(Error::Decode(format!("bad length of length: {}", count)));
        }
        let (len_bytes, after_len) = rest.split_at(count);
        if len_bytes[0] == 0 {
            return Err(Error::Decode("non-minimal length".to_string()));
        }
        let len = len_bytes
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        if len < 0x80 {
            return Err(Error::Decode("non-minimal length".to_string()));
        }
        rest = after_len;
        len
    };

    if len > rest.len() {
        return Err(Error::Decode(format!(
            "length {} exceeds remaining {} bytes",
            len,
            rest.len()
        )));
    }
    let (content, rest) = rest.split_at(len);
    Ok((tag, content, rest))
}

fn decode_string(content: &[u8]) -> Result<String> {
    String::from_utf8(content.to_vec()).map_err(|e| Error::Decode(e.to_string()))
}

fn decode_integer(content: &[u8]) -> Result<i64> {
    if content.is_empty() || content.len() > 8 {
        return Err(Error::Decode(format!(
            "integer of {} bytes",
            content.len()
        )));
    }
    if content.len() > 1
        && ((content[0] == 0x00 && content[1] & 0x80 == 0)
            || (content[0] == 0xFF && content[1] & 0x80 != 0))
    {
        return Err(Error::Decode("non-minimal integer".to_string()));
    }
    let init: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(init, |acc, b| (acc << 8) | *b as i64))
}

fn decode_value(input: &[u8], depth: usize) -> Result<(DerValue, &[u8])> {
    if depth > MAX_DER_DEPTH {
        return Err(Error::Decode(format!(
            "nesting deeper than {}",
            MAX_DER_DEPTH
        )));
    }
    let (tag, content, rest) = read_tlv(input)?;
    let value = match tag {
        TAG_BOOLEAN => match content {
            [0xFF] => DerValue::Boolean(true),
            [0x00] => DerValue::Boolean(false),
            _ => return Err(Error::Decode("invalid boolean".to_string())),
        },
        TAG_INTEGER => DerValue::Integer(decode_integer(content)?),
        TAG_OCTET_STRING => DerValue::Bytes(content.to_vec()),
        TAG_UTF8_STRING => DerValue::String(decode_string(content)?),
        TAG_SEQUENCE => {
            let mut items = Vec::new();
            let mut remaining = content;
            while !remaining.is_empty() {
                let (item, next) = decode_value(remaining, depth + 1)?;
                items.push(item);
                remaining = next;
            }
            DerValue::Sequence(items)
        }
        TAG_DICTIONARY => {
            let mut map = BTreeMap::new();
            let mut remaining = content;
            while !remaining.is_empty() {
                let (entry_tag, entry, next) = read_tlv(remaining)?;
                if entry_tag != TAG_SEQUENCE {
                    return Err(Error::Decode(format!(
                        "dictionary entry has tag {:#04x}",
                        entry_tag
                    )));
                }
                let (key_tag, key, after_key) = read_tlv(entry)?;
                if key_tag != TAG_UTF8_STRING {
                    return Err(Error::Decode("dictionary key is not a string".to_string()));
                }
                let key = decode_string(key)?;
                let (value, trailing) = decode_value(after_key, depth + 1)?;
                if !trailing.is_empty() {
                    return Err(Error::Decode(format!(
                        "dictionary entry {} has extra elements",
                        key
                    )));
                }
                if let Some((last, _)) = map.last_key_value() {
                    if *last >= key {
                        return Err(Error::Decode(format!(
                            "dictionary key {} out of order or duplicated",
                            key
                        )));
                    }
                }
                map.insert(key, value);
                remaining = next;
            }
            DerValue::Dictionary(map)
        }
        TAG_STRING_SET => {
            let mut set = BTreeSet::new();
            let mut remaining = content;
            while !remaining.is_empty() {
                let (member_tag, member, next) = read_tlv(remaining)?;
                if member_tag != TAG_UTF8_STRING {
                    return Err(Error::Decode("set member is not a string".to_string()));
                }
                let member = decode_string(member)?;
                if let Some(last) = set.last() {
                    if *last >= member {
                        return Err(Error::Decode(format!(
                            "set member {} out of order or duplicated",
                            member
                        )));
                    }
                }
                set.insert(member);
                remaining = next;
            }
            DerValue::StringSet(set)
        }
        other => {
            return Err(Error::Decode(format!("unsupported tag {:#04x}", other)));
        }
    };
    Ok((value, rest))
}

/// Decode the first value in `input`, returning it with the unread remainder
pub fn decode_one(input: &[u8]) -> Result<(DerValue, &[u8])> {
    decode_value(input, 0)
}

/// Decode exactly one value; trailing bytes are an error
pub fn decode_exact(input: &[u8]) -> Result<DerValue> {
    let (value, rest) = decode_one(input)?;
    if !rest.is_empty() {
        return Err(Error::TrailingBytes(rest.len()));
    }
    Ok(value)
}
