//! Hierarchical NDN names.
//!
//! A name is an ordered sequence of opaque binary components. Names
//! are value types: derivation methods such as [`Name::append`]
//! return a new instance and never mutate the receiver.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::packets::tlv_types;
use crate::tlv::TlvError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    components: Vec<Vec<u8>>,
}

impl Name {
    /// Create an empty name (the root, "/").
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Create a name from a URI path such as `/hello/world`. A
    /// leading slash is optional; empty segments are skipped.
    pub fn from_uri(uri: &str) -> Self {
        let components = uri
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| part.as_bytes().to_vec())
            .collect();
        Self { components }
    }

    /// Return a new name with one more component appended.
    pub fn append(&self, component: impl Into<Vec<u8>>) -> Self {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }

    /// Return a new name with a UTF-8 component appended.
    pub fn append_str(&self, component: &str) -> Self {
        self.append(component.as_bytes().to_vec())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Get a component by index.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.components.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.components.iter().map(Vec::as_slice)
    }

    /// Check whether this name is a prefix of `other`.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// Return the prefix with the given number of components.
    pub fn get_prefix(&self, length: usize) -> Name {
        Self {
            components: self.components.iter().take(length).cloned().collect(),
        }
    }

    /// Canonical comparison: component-wise, where each component
    /// pair is ordered first by length, then by byte contents; a
    /// strict prefix sorts before the longer name.
    pub fn compare(&self, other: &Name) -> Ordering {
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            let by_component = a.len().cmp(&b.len()).then_with(|| a.cmp(b));
            if by_component != Ordering::Equal {
                return by_component;
            }
        }
        self.len().cmp(&other.len())
    }

    /// URI representation; the empty name renders as "/".
    pub fn to_uri(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }
        let mut uri = String::new();
        for component in &self.components {
            uri.push('/');
            uri.push_str(&String::from_utf8_lossy(component));
        }
        uri
    }

    /// Encode as a Name TLV block: one child element per component.
    pub fn wire_encode(&self) -> Block {
        Block::from_value(tlv_types::NAME, &self.encode_value())
    }

    /// The concatenated component TLVs, without the Name header.
    pub fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::new();
        for component in &self.components {
            value.extend_from_slice(Block::from_value(tlv_types::NAME_COMPONENT, component).wire());
        }
        value
    }

    /// Decode from a Name TLV block.
    pub fn wire_decode(block: &Block) -> Result<Self, TlvError> {
        if block.tlv_type() != tlv_types::NAME {
            return Err(TlvError::UnexpectedType {
                expected: tlv_types::NAME,
                actual: block.tlv_type(),
            });
        }
        let mut components = Vec::new();
        for element in block.elements() {
            let element = element?;
            if element.tlv_type() != tlv_types::NAME_COMPONENT {
                return Err(TlvError::UnexpectedType {
                    expected: tlv_types::NAME_COMPONENT,
                    actual: element.tlv_type(),
                });
            }
            components.push(element.value().to_vec());
        }
        Ok(Self { components })
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Self {
        Self::from_uri(uri)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri() {
        let name = Name::from_uri("/hello/world/test");
        assert_eq!(name.len(), 3);
        assert_eq!(name.get(0), Some(&b"hello"[..]));
        assert_eq!(name.get(2), Some(&b"test"[..]));
        // leading slash is optional
        assert_eq!(Name::from_uri("hello/world/test"), name);
    }

    #[test]
    fn test_to_uri() {
        assert_eq!(Name::from_uri("/hello/world").to_uri(), "/hello/world");
        assert_eq!(Name::new().to_uri(), "/");
    }

    #[test]
    fn test_append_does_not_mutate() {
        let base = Name::from_uri("/a");
        let derived = base.append_str("b");
        assert_eq!(base.len(), 1);
        assert_eq!(derived.to_uri(), "/a/b");
    }

    #[test]
    fn test_prefix() {
        let name = Name::from_uri("/a/b/c");
        assert!(Name::from_uri("/a/b").is_prefix_of(&name));
        assert!(!Name::from_uri("/a/c").is_prefix_of(&name));
        assert_eq!(name.get_prefix(2), Name::from_uri("/a/b"));
    }

    #[test]
    fn test_canonical_component_order() {
        // shorter component sorts first even when lexicographically later
        assert_eq!(
            Name::from_uri("/z").compare(&Name::from_uri("/aa")),
            Ordering::Less
        );
        // equal lengths fall back to byte contents
        assert_eq!(
            Name::from_uri("/ab").compare(&Name::from_uri("/ac")),
            Ordering::Less
        );
        // strict prefix sorts first
        assert_eq!(
            Name::from_uri("/a/b").compare(&Name::from_uri("/a/b/c")),
            Ordering::Less
        );
        assert_eq!(
            Name::from_uri("/a/b").compare(&Name::from_uri("/a/b")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_wire_round_trip() {
        let name = Name::from_uri("/local/ndn/prefix");
        let block = name.wire_encode();
        assert_eq!(
            block.wire(),
            &[
                0x07, 0x14, // Name
                0x08, 0x05, b'l', b'o', b'c', b'a', b'l', //
                0x08, 0x03, b'n', b'd', b'n', //
                0x08, 0x06, b'p', b'r', b'e', b'f', b'i', b'x',
            ]
        );
        assert_eq!(Name::wire_decode(&block).unwrap(), name);
    }

    #[test]
    fn test_wire_decode_rejects_wrong_types() {
        let not_a_name = Block::from_value(0x15, b"");
        assert!(matches!(
            Name::wire_decode(&not_a_name),
            Err(TlvError::UnexpectedType { expected: 0x07, .. })
        ));

        let bad_component = Block::from_elements(0x07, &[Block::from_value(0x09, b"x")]);
        assert!(matches!(
            Name::wire_decode(&bad_component),
            Err(TlvError::UnexpectedType { expected: 0x08, .. })
        ));
    }
}
