//! Hashing utilities for resolution fingerprints.

use sha2::{Digest, Sha256};

/// A hasher for building fingerprints from multiple components.
///
/// Components are separated so that `("ab", "c")` and `("a", "bc")`
/// produce different fingerprints.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Create a new fingerprint builder.
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Add multiple strings.
    pub fn update_strs<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for s in items {
            self.update_str(s);
        }
        self
    }

    /// Add an optional string component.
    pub fn update_opt(&mut self, opt: Option<&str>) -> &mut Self {
        match opt {
            Some(s) => {
                self.hasher.update(b"\x01");
                self.update_str(s);
            }
            None => {
                self.hasher.update(b"\x00");
            }
        }
        self
    }

    /// Add a boolean component.
    pub fn update_bool(&mut self, b: bool) -> &mut Self {
        self.hasher.update([b as u8]);
        self
    }

    /// Add raw bytes (e.g. a manifest's contents).
    pub fn update_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.hasher
            .update((data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fingerprint_is_sha256_of_nothing() {
        assert_eq!(
            Fingerprint::new().finish(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_component_boundaries() {
        let a = {
            let mut fp = Fingerprint::new();
            fp.update_str("ab").update_str("c");
            fp.finish()
        };
        let b = {
            let mut fp = Fingerprint::new();
            fp.update_str("a").update_str("bc");
            fp.finish()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_optional_presence_matters() {
        let none = {
            let mut fp = Fingerprint::new();
            fp.update_opt(None);
            fp.finish()
        };
        let empty = {
            let mut fp = Fingerprint::new();
            fp.update_opt(Some(""));
            fp.finish()
        };
        assert_ne!(none, empty);
        assert_eq!(none.len(), 64);
    }
}
