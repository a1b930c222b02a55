//! Deterministic object identifiers.
//!
//! Xcode wants a 96-bit identifier per object. They are derived from the
//! project name, the object name and the object's position in a pre-order
//! walk, so regenerating an unchanged graph yields byte-identical output.

use std::collections::HashMap;

use sha1::{Digest, Sha1};

use crate::xcode::object::{ObjectArena, ObjectId};

/// Assign an identifier to every object reachable from `root`.
///
/// The walk visits children in insertion order and shares one counter
/// across the whole tree. `seed` is normally the project name.
pub fn assign_ids(arena: &mut ObjectArena, root: ObjectId, seed: &str) {
    let order = arena.walk(root);
    for (counter, obj) in order.into_iter().enumerate() {
        let id = object_id(seed, &arena.name(obj), counter);
        arena.set_id(obj, id);
    }
}

/// Identifier of the object named `name` visited at position `counter`.
pub fn object_id(seed: &str, name: &str, counter: usize) -> String {
    let digest = Sha1::digest(format!("{} {} {}", seed, name, counter).as_bytes());

    let mut folded = [0u32; 3];
    for (i, word) in digest.chunks_exact(4).enumerate() {
        let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        folded[i % 3] ^= word;
    }

    let mut bytes = [0u8; 12];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(folded) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    hex::encode_upper(bytes)
}

/// Identifiers shared by more than one object reachable from `root`.
///
/// The folding is not collision free; this is only used to detect the
/// problem, never to repair it.
pub fn find_duplicate_ids(arena: &ObjectArena, root: ObjectId) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for obj in arena.walk(root) {
        if let Some(id) = arena.id(obj) {
            *seen.entry(id).or_default() += 1;
        }
    }
    let mut duplicates: Vec<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect();
    duplicates.sort();
    duplicates
}
