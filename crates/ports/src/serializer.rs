//! Value codec port.
//!
//! Serializers work on [`serde_json::Value`] so the trait stays object-safe;
//! typed conversion happens at the call site with `serde`.

use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::PortsError;
use crate::store::ReadStream;

/// A lazily decoded stream of records.
pub type RecordStream = BoxStream<'static, Result<Value, PortsError>>;

/// Encodes single values and record sequences.
///
/// A record sequence is a concatenation of individually encoded records, so
/// a writer can append records one at a time and observe how many bytes it
/// has produced so far.
pub trait Serializer: Send + Sync {
    /// Stable identifier of the encoding (e.g. `"json"`).
    fn id(&self) -> &str;

    /// Encode a single value.
    fn serialize(&self, value: &Value) -> Result<Bytes, PortsError>;

    /// Decode a single value.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, PortsError>;

    /// Append one encoded record of a sequence to `out`.
    fn encode_record(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), PortsError>;

    /// Lazily decode the records of a sequence from `stream`.
    fn decode_records(&self, stream: ReadStream) -> RecordStream;
}
