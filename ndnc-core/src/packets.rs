//! NDN packet data model: Data, Interest, MetaInfo and the signature
//! structures, with TLV wire encoding.
//!
//! `Data::wire_encode` memoizes its result; every field setter clears
//! the cached encoding, so a cached wire is always the exact encoding
//! of the current field values. `wire_decode` enforces the canonical
//! child order (Name, MetaInfo, Content, SignatureInfo,
//! SignatureValue) and fails atomically: on error no partially
//! populated packet is returned.

use std::time::Duration;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::name::Name;
use crate::tlv::{self, TlvError};

/// TLV type constants for NDN packets
pub mod tlv_types {
    pub const INTEREST: u32 = 0x05;
    pub const DATA: u32 = 0x06;
    pub const NAME: u32 = 0x07;
    pub const NAME_COMPONENT: u32 = 0x08;
    pub const NONCE: u32 = 0x0A;
    pub const INTEREST_LIFETIME: u32 = 0x0C;
    pub const META_INFO: u32 = 0x14;
    pub const CONTENT: u32 = 0x15;
    pub const SIGNATURE_INFO: u32 = 0x16;
    pub const SIGNATURE_VALUE: u32 = 0x17;
    pub const CONTENT_TYPE: u32 = 0x18;
    pub const FRESHNESS_PERIOD: u32 = 0x19;
    pub const SIGNATURE_TYPE: u32 = 0x1B;
    pub const KEY_LOCATOR: u32 = 0x1C;
    pub const KEY_DIGEST: u32 = 0x1D;
    pub const LINK_PREFERENCE: u32 = 0x1E;
    pub const LINK_DELEGATION: u32 = 0x1F;
    pub const HOP_LIMIT: u32 = 0x22;
}

/// Errors raised while assembling or parsing a packet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("unexpected outer TLV type {0:#x}")]
    WrongOuterType(u32),
    #[error("missing required {0} field")]
    MissingField(&'static str),
    #[error("unexpected TLV type {0:#x} in {1}")]
    UnexpectedField(u32, &'static str),
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

/// Content type carried in MetaInfo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Blob,
    Link,
    Key,
    Nack,
    Other(u64),
}

impl ContentType {
    pub fn to_u64(self) -> u64 {
        match self {
            ContentType::Blob => 0,
            ContentType::Link => 1,
            ContentType::Key => 2,
            ContentType::Nack => 3,
            ContentType::Other(value) => value,
        }
    }

    pub fn from_u64(value: u64) -> Self {
        match value {
            0 => ContentType::Blob,
            1 => ContentType::Link,
            2 => ContentType::Key,
            3 => ContentType::Nack,
            other => ContentType::Other(other),
        }
    }
}

/// MetaInfo for Data packets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub content_type: ContentType,
    pub freshness_period: Option<Duration>,
}

impl MetaInfo {
    fn is_default(&self) -> bool {
        *self == MetaInfo::default()
    }

    fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::new();
        if self.content_type != ContentType::Blob {
            let inner = tlv::encode_nonneg_integer(self.content_type.to_u64());
            value.extend_from_slice(Block::from_value(tlv_types::CONTENT_TYPE, &inner).wire());
        }
        if let Some(freshness) = self.freshness_period {
            let inner = tlv::encode_nonneg_integer(freshness.as_millis() as u64);
            value.extend_from_slice(Block::from_value(tlv_types::FRESHNESS_PERIOD, &inner).wire());
        }
        value
    }

    fn decode(block: &Block) -> Result<Self, PacketError> {
        let mut meta_info = MetaInfo::default();
        let mut elements = block.elements_vec()?.into_iter().peekable();
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::CONTENT_TYPE)
        {
            let inner = elements.next().unwrap();
            meta_info.content_type = ContentType::from_u64(tlv::decode_nonneg_integer(inner.value())?);
        }
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::FRESHNESS_PERIOD)
        {
            let inner = elements.next().unwrap();
            let millis = tlv::decode_nonneg_integer(inner.value())?;
            meta_info.freshness_period = Some(Duration::from_millis(millis));
        }
        if let Some(extra) = elements.next() {
            return Err(PacketError::UnexpectedField(extra.tlv_type(), "MetaInfo"));
        }
        Ok(meta_info)
    }
}

/// Key locator for signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyLocator {
    Name(Name),
    KeyDigest(Vec<u8>),
}

impl KeyLocator {
    fn encode_value(&self) -> Vec<u8> {
        match self {
            KeyLocator::Name(name) => name.wire_encode().to_vec(),
            KeyLocator::KeyDigest(digest) => {
                Block::from_value(tlv_types::KEY_DIGEST, digest).to_vec()
            }
        }
    }

    fn decode(block: &Block) -> Result<Self, PacketError> {
        let inner = Block::from_buffer(block.value())?;
        match inner.tlv_type() {
            tlv_types::NAME => Ok(KeyLocator::Name(Name::wire_decode(&inner)?)),
            tlv_types::KEY_DIGEST => Ok(KeyLocator::KeyDigest(inner.value().to_vec())),
            other => Err(PacketError::UnexpectedField(other, "KeyLocator")),
        }
    }
}

/// Signature information carried before the signature value. The
/// signature type is kept at its full decoded width so unknown
/// algorithm numbers survive decoding without truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature_type: u64,
    pub key_locator: Option<KeyLocator>,
}

impl SignatureInfo {
    pub fn new(signature_type: u64) -> Self {
        Self {
            signature_type,
            key_locator: None,
        }
    }

    pub fn with_key_locator(mut self, key_locator: KeyLocator) -> Self {
        self.key_locator = Some(key_locator);
        self
    }

    fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::new();
        let signature_type = tlv::encode_nonneg_integer(self.signature_type);
        value.extend_from_slice(
            Block::from_value(tlv_types::SIGNATURE_TYPE, &signature_type).wire(),
        );
        if let Some(key_locator) = &self.key_locator {
            value.extend_from_slice(
                Block::from_value(tlv_types::KEY_LOCATOR, &key_locator.encode_value()).wire(),
            );
        }
        value
    }

    fn decode(block: &Block) -> Result<Self, PacketError> {
        let mut elements = block.elements_vec()?.into_iter().peekable();
        let type_block = elements
            .next()
            .filter(|b| b.tlv_type() == tlv_types::SIGNATURE_TYPE)
            .ok_or(PacketError::MissingField("SignatureType"))?;
        let signature_type = tlv::decode_nonneg_integer(type_block.value())?;

        let mut key_locator = None;
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::KEY_LOCATOR)
        {
            key_locator = Some(KeyLocator::decode(&elements.next().unwrap())?);
        }
        if let Some(extra) = elements.next() {
            return Err(PacketError::UnexpectedField(
                extra.tlv_type(),
                "SignatureInfo",
            ));
        }
        Ok(Self {
            signature_type,
            key_locator,
        })
    }
}

/// Data packet
#[derive(Debug, Clone)]
pub struct Data {
    name: Name,
    meta_info: MetaInfo,
    content: Vec<u8>,
    signature_info: Option<SignatureInfo>,
    signature_value: Option<Vec<u8>>,
    wire: Option<Block>,
}

// Equality is over the logical fields; whether an encoding happens to
// be memoized does not make two packets different.
impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.meta_info == other.meta_info
            && self.content == other.content
            && self.signature_info == other.signature_info
            && self.signature_value == other.signature_value
    }
}

impl Eq for Data {}

impl Data {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            meta_info: MetaInfo::default(),
            content: Vec::new(),
            signature_info: None,
            signature_value: None,
            wire: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn signature_info(&self) -> Option<&SignatureInfo> {
        self.signature_info.as_ref()
    }

    pub fn signature_value(&self) -> Option<&[u8]> {
        self.signature_value.as_deref()
    }

    /// True when a memoized wire encoding is present.
    pub fn has_wire(&self) -> bool {
        self.wire.is_some()
    }

    pub fn set_name(&mut self, name: Name) {
        self.name = name;
        self.invalidate_wire();
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.meta_info.content_type = content_type;
        self.invalidate_wire();
    }

    pub fn set_freshness_period(&mut self, freshness_period: Option<Duration>) {
        self.meta_info.freshness_period = freshness_period;
        self.invalidate_wire();
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.invalidate_wire();
    }

    pub fn set_signature_info(&mut self, signature_info: SignatureInfo) {
        self.signature_info = Some(signature_info);
        self.invalidate_wire();
    }

    pub fn set_signature_value(&mut self, signature_value: Vec<u8>) {
        self.signature_value = Some(signature_value);
        self.invalidate_wire();
    }

    // Mutation makes any cached encoding stale; dropping it here is
    // the single auditable invalidation point.
    fn invalidate_wire(&mut self) {
        self.wire = None;
    }

    /// The byte span a signature is computed over: the encoding of
    /// every field preceding SignatureValue. Requires SignatureInfo
    /// to be assigned.
    pub fn signed_region(&self) -> Result<Vec<u8>, PacketError> {
        let signature_info = self
            .signature_info
            .as_ref()
            .ok_or(PacketError::MissingField("SignatureInfo"))?;

        let mut region = Vec::new();
        region.extend_from_slice(self.name.wire_encode().wire());
        if !self.meta_info.is_default() {
            region.extend_from_slice(
                Block::from_value(tlv_types::META_INFO, &self.meta_info.encode_value()).wire(),
            );
        }
        if !self.content.is_empty() {
            region.extend_from_slice(Block::from_value(tlv_types::CONTENT, &self.content).wire());
        }
        region.extend_from_slice(
            Block::from_value(tlv_types::SIGNATURE_INFO, &signature_info.encode_value()).wire(),
        );
        Ok(region)
    }

    /// Serialize into a Data TLV block, memoizing the result. A
    /// second call without intervening mutation returns the cached
    /// encoding unchanged.
    pub fn wire_encode(&mut self) -> Result<Block, PacketError> {
        if let Some(wire) = &self.wire {
            return Ok(wire.clone());
        }
        let signature_value = self
            .signature_value
            .as_ref()
            .ok_or(PacketError::MissingField("SignatureValue"))?;

        let mut value = self.signed_region()?;
        value.extend_from_slice(Block::from_value(tlv_types::SIGNATURE_VALUE, signature_value).wire());
        let wire = Block::from_value(tlv_types::DATA, &value);
        trace!("encoded Data {} ({} bytes)", self.name, wire.size());
        self.wire = Some(wire.clone());
        Ok(wire)
    }

    /// Parse a Data packet, requiring the canonical child order. The
    /// decoded packet adopts `block` as its cached wire encoding.
    pub fn wire_decode(block: &Block) -> Result<Self, PacketError> {
        if block.tlv_type() != tlv_types::DATA {
            return Err(PacketError::WrongOuterType(block.tlv_type()));
        }
        let mut elements = block.elements_vec()?.into_iter().peekable();

        let name_block = elements
            .next()
            .filter(|b| b.tlv_type() == tlv_types::NAME)
            .ok_or(PacketError::MissingField("Name"))?;
        let name = Name::wire_decode(&name_block)?;

        let mut meta_info = MetaInfo::default();
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::META_INFO)
        {
            meta_info = MetaInfo::decode(&elements.next().unwrap())?;
        }

        let mut content = Vec::new();
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::CONTENT)
        {
            content = elements.next().unwrap().value().to_vec();
        }

        let sig_info_block = elements
            .next()
            .ok_or(PacketError::MissingField("SignatureInfo"))?;
        if sig_info_block.tlv_type() != tlv_types::SIGNATURE_INFO {
            return Err(PacketError::UnexpectedField(sig_info_block.tlv_type(), "Data"));
        }
        let signature_info = SignatureInfo::decode(&sig_info_block)?;

        let sig_value_block = elements
            .next()
            .ok_or(PacketError::MissingField("SignatureValue"))?;
        if sig_value_block.tlv_type() != tlv_types::SIGNATURE_VALUE {
            return Err(PacketError::UnexpectedField(sig_value_block.tlv_type(), "Data"));
        }
        let signature_value = sig_value_block.value().to_vec();

        if let Some(extra) = elements.next() {
            return Err(PacketError::UnexpectedField(extra.tlv_type(), "Data"));
        }

        Ok(Self {
            name,
            meta_info,
            content,
            signature_info: Some(signature_info),
            signature_value: Some(signature_value),
            wire: Some(block.clone()),
        })
    }
}

/// Interest packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    pub nonce: Option<u32>,
    pub lifetime: Option<Duration>,
    pub hop_limit: Option<u8>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            nonce: None,
            lifetime: None,
            hop_limit: None,
        }
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn with_hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = Some(hop_limit);
        self
    }

    /// An Interest is satisfiable by any Data whose name it prefixes.
    pub fn matches_data(&self, data_name: &Name) -> bool {
        self.name.is_prefix_of(data_name)
    }

    pub fn wire_encode(&self) -> Block {
        let mut value = Vec::new();
        value.extend_from_slice(self.name.wire_encode().wire());
        if let Some(nonce) = self.nonce {
            value.extend_from_slice(Block::from_value(tlv_types::NONCE, &nonce.to_be_bytes()).wire());
        }
        if let Some(lifetime) = self.lifetime {
            let inner = tlv::encode_nonneg_integer(lifetime.as_millis() as u64);
            value.extend_from_slice(Block::from_value(tlv_types::INTEREST_LIFETIME, &inner).wire());
        }
        if let Some(hop_limit) = self.hop_limit {
            value.extend_from_slice(Block::from_value(tlv_types::HOP_LIMIT, &[hop_limit]).wire());
        }
        Block::from_value(tlv_types::INTEREST, &value)
    }

    pub fn wire_decode(block: &Block) -> Result<Self, PacketError> {
        if block.tlv_type() != tlv_types::INTEREST {
            return Err(PacketError::WrongOuterType(block.tlv_type()));
        }
        let mut elements = block.elements_vec()?.into_iter().peekable();

        let name_block = elements
            .next()
            .filter(|b| b.tlv_type() == tlv_types::NAME)
            .ok_or(PacketError::MissingField("Name"))?;
        let mut interest = Interest::new(Name::wire_decode(&name_block)?);

        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::NONCE)
        {
            let nonce = elements.next().unwrap();
            let bytes: [u8; 4] = nonce
                .value()
                .try_into()
                .map_err(|_| PacketError::UnexpectedField(tlv_types::NONCE, "Interest"))?;
            interest.nonce = Some(u32::from_be_bytes(bytes));
        }
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::INTEREST_LIFETIME)
        {
            let lifetime = elements.next().unwrap();
            let millis = tlv::decode_nonneg_integer(lifetime.value())?;
            interest.lifetime = Some(Duration::from_millis(millis));
        }
        if elements
            .peek()
            .is_some_and(|b| b.tlv_type() == tlv_types::HOP_LIMIT)
        {
            let hop_limit = elements.next().unwrap();
            let [byte] = hop_limit.value() else {
                return Err(PacketError::UnexpectedField(tlv_types::HOP_LIMIT, "Interest"));
            };
            interest.hop_limit = Some(*byte);
        }
        if let Some(extra) = elements.next() {
            return Err(PacketError::UnexpectedField(extra.tlv_type(), "Interest"));
        }
        Ok(interest)
    }
}
