//! JSON implementation of the [`Serializer`] port.
//!
//! Single values are plain JSON documents. Sequences are JSON Lines: one
//! compact document per record, each terminated by `\n`.

use bytes::Bytes;
use cumulus_ports::{PortsError, ReadStream, RecordStream, Serializer};
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;

/// Serializer producing JSON documents and JSON Lines record streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn id(&self) -> &str {
        "json"
    }

    fn serialize(&self, value: &Value) -> Result<Bytes, PortsError> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, PortsError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode_record(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), PortsError> {
        serde_json::to_writer(&mut *out, value)?;
        out.push(b'\n');
        Ok(())
    }

    fn decode_records(&self, stream: ReadStream) -> RecordStream {
        LinesStream::new(BufReader::new(stream).lines())
            .filter_map(|line| async move {
                match line {
                    Ok(line) if line.trim().is_empty() => None,
                    Ok(line) => Some(serde_json::from_str::<Value>(&line).map_err(PortsError::from)),
                    Err(err) => Some(Err(PortsError::from(err))),
                }
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn single_value_roundtrip() {
        let value = json!({"a": [1, 2, 3]});
        let bytes = JsonSerializer.serialize(&value).unwrap();
        assert_eq!(JsonSerializer.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn records_are_newline_terminated() {
        let mut out = Vec::new();
        JsonSerializer.encode_record(&json!("x"), &mut out).unwrap();
        JsonSerializer.encode_record(&json!(2), &mut out).unwrap();
        assert_eq!(out, b"\"x\"\n2\n");
    }

    #[tokio::test]
    async fn decode_records_reads_json_lines() {
        let data: &'static [u8] = b"1\n\"two\"\n{\"three\":3}\n";
        let records: Vec<Value> = JsonSerializer
            .decode_records(Box::pin(data))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(records, vec![json!(1), json!("two"), json!({"three": 3})]);
    }

    #[tokio::test]
    async fn decode_records_reports_bad_record() {
        let data: &'static [u8] = b"1\n{oops\n";
        let results: Vec<_> = JsonSerializer.decode_records(Box::pin(data)).collect().await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(PortsError::Serialization(_))));
    }
}
