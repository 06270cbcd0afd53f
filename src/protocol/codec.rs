//! Batch codec
//!
//! Encoding and decoding of length-prefixed slot sequences.
//!
//! ```text
//! ┌────────┬─────────┬────────┬────┬────────┬─────────┐
//! │ Len(4) │ Payload │ Len(4) │ .. │ Len(4) │ Payload │
//! └────────┴─────────┴────────┴────┴────────┴─────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{IkvError, Result};

/// Slot header size: 4 bytes signed length
pub const SLOT_HEADER_SIZE: usize = 4;

/// Length marking an absent value
pub const NULL_LENGTH: i32 = -1;

// =============================================================================
// Encoding
// =============================================================================

/// Encode items as consecutive `len (i32 LE) + bytes` slots
///
/// Items longer than `i32::MAX` cannot be represented and are rejected.
pub fn encode_items<I, T>(items: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut buf = BytesMut::new();
    for item in items {
        let item = item.as_ref();
        let len = i32::try_from(item.len()).map_err(|_| {
            IkvError::EngineCall(format!("item of {} bytes exceeds slot limit", item.len()))
        })?;

        buf.reserve(SLOT_HEADER_SIZE + item.len());
        buf.put_i32_le(len);
        buf.put_slice(item);
    }
    Ok(buf.to_vec())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode slots into optional byte values
///
/// The declared lengths must exactly partition `buffer`; a truncated header,
/// a length below -1, or a length running past the end is a decode error.
pub fn decode_items_as_bytes(buffer: &[u8]) -> Result<Vec<Option<Vec<u8>>>> {
    let mut cursor = buffer;
    let mut items = Vec::new();

    while cursor.has_remaining() {
        let offset = buffer.len() - cursor.remaining();

        if cursor.remaining() < SLOT_HEADER_SIZE {
            return Err(IkvError::Decode(format!(
                "truncated slot header at offset {}: {} trailing byte(s)",
                offset,
                cursor.remaining()
            )));
        }

        let len = cursor.get_i32_le();
        match len {
            NULL_LENGTH => items.push(None),
            0 => items.push(Some(Vec::new())),
            len if len > 0 => {
                let len = len as usize;
                if len > cursor.remaining() {
                    return Err(IkvError::Decode(format!(
                        "slot at offset {} declares {} bytes, {} remaining",
                        offset,
                        len,
                        cursor.remaining()
                    )));
                }
                items.push(Some(cursor[..len].to_vec()));
                cursor.advance(len);
            }
            len => {
                return Err(IkvError::Decode(format!(
                    "invalid slot length {} at offset {}",
                    len, offset
                )))
            }
        }
    }

    Ok(items)
}

/// Decode slots into optional UTF-8 strings
pub fn decode_items_as_text(buffer: &[u8]) -> Result<Vec<Option<String>>> {
    decode_items_as_bytes(buffer)?
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            item.map(|bytes| {
                String::from_utf8(bytes).map_err(|e| {
                    IkvError::Decode(format!("slot {} is not valid UTF-8: {}", idx, e))
                })
            })
            .transpose()
        })
        .collect()
}
