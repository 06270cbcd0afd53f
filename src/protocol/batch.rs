//! Batched lookup requests
//!
//! Represents a multi-key, multi-field read and the order its response
//! slots arrive in.

use crate::error::Result;

use super::encode_items;

/// Keys and field names for one batched native call
///
/// Keys are stored flattened to bytes in wire order: byte keys first, then
/// text keys, each group in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    keys: Vec<Vec<u8>>,
    field_names: Vec<String>,
}

impl BatchRequest {
    pub fn new<B, T, F>(
        byte_keys: impl IntoIterator<Item = B>,
        text_keys: impl IntoIterator<Item = T>,
        field_names: impl IntoIterator<Item = F>,
    ) -> Self
    where
        B: AsRef<[u8]>,
        T: AsRef<str>,
        F: AsRef<str>,
    {
        let mut keys: Vec<Vec<u8>> = byte_keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        keys.extend(text_keys.into_iter().map(|k| k.as_ref().as_bytes().to_vec()));

        Self {
            keys,
            field_names: field_names
                .into_iter()
                .map(|f| f.as_ref().to_string())
                .collect(),
        }
    }

    /// Primary keys in wire order
    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of response slots: keys × field names
    pub fn slot_count(&self) -> usize {
        self.keys.len() * self.field_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }

    /// `(key, field)` pairs in response order (keys outer, fields inner)
    pub fn slots(&self) -> impl Iterator<Item = (&[u8], &str)> + '_ {
        self.keys.iter().flat_map(move |key| {
            self.field_names
                .iter()
                .map(move |field| (key.as_slice(), field.as_str()))
        })
    }

    /// Encoded primary keys buffer
    pub fn encode_keys(&self) -> Result<Vec<u8>> {
        encode_items(&self.keys)
    }

    /// Encoded field names buffer
    pub fn encode_field_names(&self) -> Result<Vec<u8>> {
        encode_items(self.field_names.iter().map(|f| f.as_bytes()))
    }
}
