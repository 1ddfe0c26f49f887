//! Conversion between gRPC metadata and [`CallMetadata`]

use auth_core::CallMetadata;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, KeyAndValueRef, MetadataMap};
use tonic::Status;

/// Project the ASCII entries of a gRPC metadata map
///
/// Binary (`-bin`) entries and values that are not visible ASCII are skipped;
/// credentials never travel in either.
pub fn to_call_metadata(map: &MetadataMap) -> CallMetadata {
    map.iter()
        .filter_map(|entry| match entry {
            KeyAndValueRef::Ascii(key, value) => {
                value.to_str().ok().map(|value| (key.as_str(), value))
            }
            KeyAndValueRef::Binary(_, _) => None,
        })
        .collect()
}

/// Write `metadata` into an outgoing gRPC metadata map
///
/// Keys present in `metadata` replace any existing values in `map`.
pub fn apply_call_metadata(metadata: &CallMetadata, map: &mut MetadataMap) -> Result<(), Status> {
    for (key, _) in metadata.iter() {
        map.remove(key);
    }

    for (key, value) in metadata.iter() {
        let name = AsciiMetadataKey::from_bytes(key.as_bytes())
            .map_err(|_| Status::internal(format!("invalid metadata key: {key}")))?;
        let value = AsciiMetadataValue::try_from(value)
            .map_err(|_| Status::internal(format!("invalid metadata value for {key}")))?;
        map.append(name, value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    #[test]
    fn test_to_call_metadata() {
        let mut map = MetadataMap::new();
        map.insert("authorization", MetadataValue::from_static("Bearer abc"));
        map.insert("x-request-id", MetadataValue::from_static("r-1"));
        map.insert_bin("trace-bin", tonic::metadata::MetadataValue::from_bytes(b"\x00\x01"));

        let metadata = to_call_metadata(&map);
        assert_eq!(metadata.authorization(), Some("Bearer abc"));
        assert_eq!(metadata.get("x-request-id"), Some("r-1"));
        assert!(metadata.get("trace-bin").is_none());
    }

    #[test]
    fn test_apply_replaces_existing_authorization() {
        let mut map = MetadataMap::new();
        map.insert("authorization", MetadataValue::from_static("stale"));
        map.insert("x-request-id", MetadataValue::from_static("r-1"));

        apply_call_metadata(&CallMetadata::with_authorization("A"), &mut map).unwrap();

        let values: Vec<_> = map
            .get_all("authorization")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["A"]);
        assert!(map.get("x-request-id").is_some());
    }

    #[test]
    fn test_apply_rejects_non_ascii_values() {
        let mut map = MetadataMap::new();
        let result = apply_call_metadata(&CallMetadata::with_authorization("caf\u{e9}"), &mut map);
        assert_eq!(result.unwrap_err().code(), tonic::Code::Internal);
    }
}
