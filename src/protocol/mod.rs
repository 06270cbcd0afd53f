//! Protocol Module
//!
//! Defines the wire format for batched lookups across the FFI boundary.
//!
//! ## Slot Format
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ Len (4, i32) │         Payload (Len)       │
//! └──────────────┴─────────────────────────────┘
//! ```
//! Little-endian signed length, no separators, no trailing data.
//!
//! ### Length Sentinels (responses)
//! - -1: no value (null), 4 bytes consumed
//! -  0: empty but present value, 4 bytes consumed
//! - >0: payload length, 4 + Len bytes consumed
//!
//! ## Request Layout
//! A batched call sends two buffers: all primary keys (byte keys first, then
//! text keys as UTF-8, each in input order) and all field names. The response
//! holds one slot per `(key, field)` pair in row-major order: keys outer,
//! field names inner. This alignment is not self-describing.

mod batch;
mod codec;

pub use batch::BatchRequest;
pub use codec::{
    decode_items_as_bytes, decode_items_as_text, encode_items, NULL_LENGTH, SLOT_HEADER_SIZE,
};
