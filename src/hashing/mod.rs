/// Computes the content-addressed document id: lowercase hex of the BLAKE3
/// hash of the raw file bytes. Identical files always map to the same id, so
/// re-ingesting a corpus is idempotent at the document level.
#[inline]
pub fn doc_id_for_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for index point ids. 64 bits is plenty for corpora of millions of
/// chunks (birthday-bound collision probability ~n²/2^65); a collision would
/// overwrite one point in the index, never corrupt exported rows, since row
/// provenance travels in the payload rather than the id.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Derives the deterministic index point id for a chunk id.
///
/// Deterministic ids make re-ingestion an upsert in place instead of an
/// accumulation of duplicates.
#[inline]
pub fn point_id_for_chunk(chunk_id: &str) -> u64 {
    hash_to_u64(chunk_id.as_bytes())
}

/// Formats a `(doc, ordinal)` pair into a chunk id string.
#[inline]
pub fn chunk_id(doc_id: &str, ordinal: usize) -> String {
    format!("{}:{:04}", doc_id, ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_doc_id_determinism() {
        let bytes = b"annual security audit report, fiscal year 2025";

        let id1 = doc_id_for_bytes(bytes);
        let id2 = doc_id_for_bytes(bytes);

        assert_eq!(id1, id2);
    }

    #[test]
    fn test_doc_id_is_hex_of_full_digest() {
        let id = doc_id_for_bytes(b"x");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_doc_id_uniqueness() {
        let inputs = [
            b"report-a".as_slice(),
            b"report-b".as_slice(),
            b"REPORT-A".as_slice(),
            b"report-a ".as_slice(),
        ];

        let ids: Vec<_> = inputs.iter().map(|i| doc_id_for_bytes(i)).collect();
        let unique: HashSet<_> = ids.iter().collect();

        assert_eq!(unique.len(), inputs.len());
    }

    #[test]
    fn test_hash_to_u64_determinism() {
        let data = b"chunk-fingerprint-data";

        assert_eq!(hash_to_u64(data), hash_to_u64(data));
    }

    #[test]
    fn test_point_id_uniqueness_across_ordinals() {
        let doc = doc_id_for_bytes(b"doc");
        let ids: Vec<_> = (0..100)
            .map(|i| point_id_for_chunk(&chunk_id(&doc, i)))
            .collect();
        let unique: HashSet<_> = ids.iter().collect();

        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_chunk_id_format() {
        assert_eq!(chunk_id("abc", 7), "abc:0007");
        assert_eq!(chunk_id("abc", 12345), "abc:12345");
    }
}
