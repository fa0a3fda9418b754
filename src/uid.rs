//! Deterministic object identifiers.
//!
//! Xcode identifies every object with 24 hex characters. They are derived here
//! from a SHA-1 digest of the object's category and identifier, so that
//! regenerating a project never changes the ids of untouched objects. Schemes
//! and user data persisted by Xcode refer to these ids.

use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use uuid::Uuid;

pub const STABLE_ID_LEN: usize = 24;

/// Shared by every generation pass of a run.
#[derive(Default)]
pub struct IdGenerator {
  cache: Mutex<HashMap<String, String>>
}

impl IdGenerator {
  pub fn new() -> Self {
    IdGenerator::default()
  }

  pub fn stable_id(&self, category: &str, identifier: &str) -> String {
    let key = [category, "/", identifier].concat();
    let mut cache = self.cache.lock();
    if let Some(id) = cache.get(&key) {
      return id.clone();
    }
    let guid = digest_guid(&key).simple().to_string().to_uppercase();
    let id   = guid[7..7 + STABLE_ID_LEN].to_string();
    cache.insert(key, id.clone());
    id
  }

  /// An uppercase hyphenated GUID derived from `seed`, for Visual Studio files.
  pub fn guid(&self, seed: &str) -> String {
    digest_guid(seed).hyphenated().to_string().to_uppercase()
  }

  pub fn len(&self) -> usize {
    self.cache.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn digest_guid(s: &str) -> Uuid {
  let digest = Sha1::digest(s.as_bytes());
  let mut bytes = [0u8; 16];
  bytes.copy_from_slice(&digest[..16]);
  Uuid::from_bytes_le(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn ids_are_stable() {
    let a = IdGenerator::new();
    let b = IdGenerator::new();
    let id = a.stable_id("PBXFileReference", "/src/main.cpp");
    assert_eq!(id.len(), STABLE_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    assert_eq!(id, a.stable_id("PBXFileReference", "/src/main.cpp"));
    assert_eq!(id, b.stable_id("PBXFileReference", "/src/main.cpp"));
    assert_ne!(id, a.stable_id("PBXGroup", "/src/main.cpp"));
    assert_eq!(a.len(), 2);
  }

  #[test]
  fn no_collisions() {
    let ids = IdGenerator::new();
    let mut seen = HashSet::new();
    for i in 0..10_000 {
      let category = ["PBXBuildFile", "PBXGroup", "PBXNativeTarget"][i % 3];
      assert!(seen.insert(ids.stable_id(category, &format!("item{}", i))));
    }
  }

  #[test]
  fn shared_between_threads() {
    let ids = IdGenerator::new();
    let expected = ids.stable_id("PBXProject", "hello");
    std::thread::scope(|s| {
      for _ in 0..4 {
        s.spawn(|| assert_eq!(ids.stable_id("PBXProject", "hello"), expected));
      }
    });
    assert_eq!(ids.len(), 1);
  }

  #[test]
  fn guids_are_formatted() {
    let ids  = IdGenerator::new();
    let guid = ids.guid("hello.vcxproj");
    assert_eq!(guid.len(), 36);
    assert_eq!(guid, ids.guid("hello.vcxproj"));
    assert_eq!(guid.matches('-').count(), 4);
  }
}
