//! Value codecs for the disk tier.
//!
//! A codec turns a value into the bytes of one cache file and back. Decoding
//! failures are reported as `None` so the disk tier can treat them as misses.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

/// Serializes values to and from their on-disk form. Must round-trip exactly.
pub trait Codec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Option<V>;
}

// == JSON Codec ==
/// serde_json codec for any serializable value.
pub struct JsonCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> JsonCodec<V> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for JsonCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Codec<V> for JsonCodec<V>
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Option<V> {
        serde_json::from_slice(bytes).ok()
    }
}

// == Bytes Codec ==
/// Identity codec: the value is the file contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        Some(bytes.to_vec())
    }
}
