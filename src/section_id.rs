//! Deterministic element identifiers for the sections of a rendered page.

use std::fmt;

use md5::{Digest, Md5};

const HASH_HEX_LEN: usize = 8;

/// Identifier of one error block in a rendered page.
///
/// The identifier is built from the block's position in the chain and a short
/// md5 digest of the error's message, file and line, so rendering the same
/// error twice yields the same identifiers. Every addressable section of the
/// block derives its element id from this one.
///
/// ```
/// use debugpage::SectionId;
///
/// let id = SectionId::new(0, "Division by zero", "/app/calc.rs", 10);
/// assert!(id.as_str().starts_with("exception-0-"));
/// assert_eq!(id.message(), format!("{id}-message"));
/// assert_eq!(id, SectionId::new(0, "Division by zero", "/app/calc.rs", 10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionId(String);

impl SectionId {
    /// Builds the identifier for the error at `position` of its chain.
    pub fn new(position: usize, message: &str, file: &str, line: u32) -> Self {
        let mut hasher = Md5::new();
        hasher.update(message.as_bytes());
        hasher.update(file.as_bytes());
        hasher.update(line.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(format!("exception-{position}-{}", &digest[..HASH_HEX_LEN]))
    }

    /// The identifier itself.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn part(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.0)
    }

    /// Element id of the message section.
    pub fn message(&self) -> String {
        self.part("message")
    }

    /// Element id of the location section.
    pub fn location(&self) -> String {
        self.part("location")
    }

    /// Element id of the code snippet section.
    pub fn code(&self) -> String {
        self.part("code")
    }

    /// Element id of the stack trace section.
    pub fn trace(&self) -> String {
        self.part("trace")
    }

    /// Element id of the hidden Markdown rendition.
    pub fn all(&self) -> String {
        self.part("all")
    }

    /// Element id of the details panel of frame `index`.
    pub fn frame(&self, index: usize) -> String {
        format!("{}-frame-{index}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_section_id_is_deterministic() {
        let a = SectionId::new(1, "boom", "/app/main.rs", 3);
        let b = SectionId::new(1, "boom", "/app/main.rs", 3);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), "exception-1-".len() + HASH_HEX_LEN);
    }

    #[test]
    fn test_section_id_depends_on_content() {
        let base = SectionId::new(0, "boom", "/app/main.rs", 3);
        assert_ne!(base, SectionId::new(0, "boom!", "/app/main.rs", 3));
        assert_ne!(base, SectionId::new(0, "boom", "/app/lib.rs", 3));
        assert_ne!(base, SectionId::new(0, "boom", "/app/main.rs", 4));
        assert_ne!(base, SectionId::new(1, "boom", "/app/main.rs", 3));
    }

    #[test]
    fn test_section_id_spot_check_collisions() {
        let mut seen = HashSet::new();
        for i in 0..1000u32 {
            let message = format!("error number {i}");
            let file = format!("/app/src/module_{}.rs", i % 7);
            let id = SectionId::new(0, &message, &file, i % 13);
            assert!(seen.insert(id), "collision for input {i}");
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_section_parts() {
        let id = SectionId::new(0, "m", "f", 1);
        assert_eq!(id.frame(2), format!("{id}-frame-2"));
        assert_eq!(id.trace(), format!("{id}-trace"));
        assert_eq!(id.all(), format!("{id}-all"));
        assert_eq!(id.code(), format!("{id}-code"));
        assert_eq!(id.location(), format!("{id}-location"));
    }
}
