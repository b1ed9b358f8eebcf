// File: fitroom-core/src/services/content_key.rs
//
// Deterministic dedup keys for outfits and try-ons. Order and duplicates in the
// garment list never change a key; occasion casing and surrounding whitespace don't either.

use std::collections::BTreeSet;
use sha2::{Digest, Sha256};

/// Trimmed, lowercased occasion. This is what gets stored on the outfit.
pub fn canonical_occasion(occasion: &str) -> String {
    occasion.trim().to_lowercase()
}

/// Deduplicated, lexicographically sorted identifiers.
pub fn canonical_ids<S: AsRef<str>>(ids: &[S]) -> Vec<&str> {
    ids.iter()
        .map(AsRef::as_ref)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// SHA-256 (lowercase hex) of `owner:id1,id2,...[:context]`.
pub fn derive_content_key<S: AsRef<str>>(owner: &str, ids: &[S], context: Option<&str>) -> String {
    let mut material = format!("{}:{}", owner, canonical_ids(ids).join(","));
    if let Some(context) = context {
        material.push(':');
        material.push_str(context);
    }
    format!("{:x}", Sha256::digest(material.as_bytes()))
}

/// Key over avatar, garment set and canonical occasion.
pub fn derive_outfit_key<S: AsRef<str>>(avatar_id: &str, garment_ids: &[S], occasion: &str) -> String {
    derive_content_key(avatar_id, garment_ids, Some(&canonical_occasion(occasion)))
}

/// Key over avatar and garment set only, shared by every occasion.
pub fn derive_tryon_key<S: AsRef<str>>(avatar_id: &str, garment_ids: &[S]) -> String {
    derive_content_key(avatar_id, garment_ids, None)
}
