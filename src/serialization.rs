use serde::{de::DeserializeOwned, Serialize};

use crate::errors::SGError;

/// Serialization format options for sparse grid data.
///
/// Each format has both compressed (Lz4) and uncompressed variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializationFormat
{
    /// JSON format - human readable, larger size
    Json,
    /// JSON format with LZ4 compression
    JsonLz4,
    /// bincode format - compact binary
    Bincode,
    /// bincode format with LZ4 compression
    #[default]
    BincodeLz4,
}

impl SerializationFormat
{
    /// Returns true if this format uses LZ4 compression
    pub fn is_compressed(&self) -> bool
    {
        matches!(self, SerializationFormat::JsonLz4 | SerializationFormat::BincodeLz4)
    }
}

fn serialize_serde<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, SGError>
{
    match format
    {
        SerializationFormat::Json | SerializationFormat::JsonLz4 =>
        {
            serde_json::to_vec(data).map_err(|e| SGError::SerializationFailed(e.to_string()))
        },
        SerializationFormat::Bincode | SerializationFormat::BincodeLz4 =>
        {
            bincode::serde::encode_to_vec(data, bincode::config::standard()).map_err(|e| SGError::SerializationFailed(e.to_string()))
        },
    }
}

fn deserialize_serde<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, SGError>
{
    match format
    {
        SerializationFormat::Json | SerializationFormat::JsonLz4 =>
        {
            serde_json::from_slice(data).map_err(|e| SGError::DeserializationFailed(e.to_string()))
        },
        SerializationFormat::Bincode | SerializationFormat::BincodeLz4 =>
        {
            bincode::serde::decode_from_slice(data, bincode::config::standard()).map(|(value, _)| value)
                .map_err(|e| SGError::DeserializationFailed(e.to_string()))
        },
    }
}

/// Serialize data to bytes using the specified format.
/// Applies LZ4 compression if the format variant ends with Lz4.
pub fn serialize<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, SGError>
{
    let bytes = serialize_serde(data, format)?;
    if format.is_compressed()
    {
        let compressed = lz4_flex::compress_prepend_size(&bytes);
        log::trace!("compressed {} bytes to {}", bytes.len(), compressed.len());
        Ok(compressed)
    }
    else
    {
        Ok(bytes)
    }
}

/// Deserialize data from bytes using the specified format.
/// Applies LZ4 decompression if the format variant ends with Lz4.
pub fn deserialize<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, SGError>
{
    if format.is_compressed()
    {
        let decompressed = lz4_flex::decompress_size_prepended(data).map_err(|_| SGError::LZ4DecompressionFailed)?;
        deserialize_serde(&decompressed, format)
    }
    else
    {
        deserialize_serde(data, format)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct TestData
    {
        values: Vec<f64>,
        name: String,
    }

    #[test]
    fn check_all_formats()
    {
        let data = TestData { values: vec![1.0, 2.5, -3.0], name: "surplus".to_string() };
        for format in [SerializationFormat::Json, SerializationFormat::JsonLz4, SerializationFormat::Bincode, SerializationFormat::BincodeLz4]
        {
            let bytes = serialize(&data, format).expect("serialization failed");
            let result: TestData = deserialize(&bytes, format).expect("deserialization failed");
            assert_eq!(data, result);
        }
    }

    #[test]
    fn check_corrupt_lz4()
    {
        let result: Result<TestData, SGError> = deserialize(&[1, 2], SerializationFormat::BincodeLz4);
        assert_eq!(result, Err(SGError::LZ4DecompressionFailed));
    }
}
