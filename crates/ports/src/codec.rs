//! Type descriptor (un)pickling port.

use cumulus_core::TypeDescriptor;

use crate::error::PortsError;

/// Converts between a [`TypeDescriptor`] and the string stored in
/// [`ProcessInfo::return_type`](cumulus_execution::ProcessInfo::return_type).
pub trait TypeCodec: Send + Sync {
    /// Pickle a descriptor.
    fn encode(&self, descriptor: &TypeDescriptor) -> Result<String, PortsError>;

    /// Unpickle a descriptor.
    fn decode(&self, pickled: &str) -> Result<TypeDescriptor, PortsError>;
}

/// Pickles descriptors as JSON strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTypeCodec;

impl TypeCodec for JsonTypeCodec {
    fn encode(&self, descriptor: &TypeDescriptor) -> Result<String, PortsError> {
        Ok(serde_json::to_string(descriptor)?)
    }

    fn decode(&self, pickled: &str) -> Result<TypeDescriptor, PortsError> {
        Ok(serde_json::from_str(pickled)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_codec_roundtrip() {
        let codec = JsonTypeCodec;
        let ty = TypeDescriptor::of::<Vec<String>>();
        let pickled = codec.encode(&ty).unwrap();
        assert_eq!(codec.decode(&pickled).unwrap(), ty);
    }

    #[test]
    fn json_codec_rejects_garbage() {
        let err = JsonTypeCodec.decode("{not a type").unwrap_err();
        assert!(matches!(err, PortsError::Serialization(_)));
    }
}
