//! Link objects: signed Data packets whose content is an ordered set
//! of (preference, name) delegations redirecting consumers toward
//! alternate prefixes.
//!
//! The delegation set is totally ordered by (preference ascending,
//! name ascending in canonical order) and carries set semantics:
//! inserting an already-present (preference, name) pair is a no-op.
//! That order is also the wire order, so decode followed by re-encode
//! is byte-stable.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::name::Name;
use crate::packets::{tlv_types, ContentType, Data, PacketError};
use crate::tlv::{self, TlvError};

/// Structural violations specific to Link objects
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("incorrect content type for Link")]
    IncorrectContentType,
    #[error("delegation is missing the preference field")]
    MissingPreference,
    #[error("delegation is missing the name field")]
    MissingName,
    #[error("Link carries no delegations")]
    EmptyDelegationList,
    #[error("unexpected TLV type {0:#x} in Link content")]
    UnexpectedField(u32),
    #[error(transparent)]
    Packet(#[from] PacketError),
}

impl From<TlvError> for LinkError {
    fn from(e: TlvError) -> Self {
        LinkError::Packet(PacketError::Tlv(e))
    }
}

/// One forwarding alternative: lower preference means higher priority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Delegation {
    pub preference: u64,
    pub name: Name,
}

impl Delegation {
    pub fn new(preference: u64, name: Name) -> Self {
        Self { preference, name }
    }

    fn encode(&self) -> Block {
        let mut value = Vec::new();
        let preference = tlv::encode_nonneg_integer(self.preference);
        value.extend_from_slice(Block::from_value(tlv_types::LINK_PREFERENCE, &preference).wire());
        value.extend_from_slice(self.name.wire_encode().wire());
        Block::from_value(tlv_types::LINK_DELEGATION, &value)
    }

    /// Parse one LinkDelegation group: a LinkPreference child followed
    /// by a Name child, both required, in that order.
    fn decode(block: &Block) -> Result<Self, LinkError> {
        let mut elements = block.elements();

        let preference_block = elements
            .next()
            .transpose()?
            .filter(|b| b.tlv_type() == tlv_types::LINK_PREFERENCE)
            .ok_or(LinkError::MissingPreference)?;
        let preference = tlv::decode_nonneg_integer(preference_block.value())?;

        let name_block = elements
            .next()
            .transpose()?
            .filter(|b| b.tlv_type() == tlv_types::NAME)
            .ok_or(LinkError::MissingName)?;
        let name = Name::wire_decode(&name_block)?;

        Ok(Self { preference, name })
    }
}

/// Ordered set of delegations, kept sorted by (preference, name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSet {
    entries: Vec<Delegation>,
}

impl DelegationSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert keeping the total order; returns false (no-op) when the
    /// exact (preference, name) pair is already present.
    pub fn insert(&mut self, delegation: Delegation) -> bool {
        match self.entries.binary_search(&delegation) {
            Ok(_) => false,
            Err(position) => {
                self.entries.insert(position, delegation);
                true
            }
        }
    }

    /// Remove the first entry in iteration order whose name matches,
    /// regardless of preference; returns false if no entry matches.
    pub fn remove_by_name(&mut self, name: &Name) -> bool {
        match self.entries.iter().position(|d| &d.name == name) {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Delegation> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Delegation> {
        self.entries.iter()
    }

    /// Serialize as a sequence of LinkDelegation TLVs in set order.
    pub fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::new();
        for delegation in &self.entries {
            value.extend_from_slice(delegation.encode().wire());
        }
        value
    }

    /// Parse a Link content payload. At least one well-formed
    /// delegation must be present.
    pub fn decode_value(content: &[u8]) -> Result<Self, LinkError> {
        let wrapper = Block::from_value(tlv_types::CONTENT, content);
        let mut set = DelegationSet::new();
        for element in wrapper.elements() {
            let element = element?;
            if element.tlv_type() != tlv_types::LINK_DELEGATION {
                return Err(LinkError::UnexpectedField(element.tlv_type()));
            }
            set.insert(Delegation::decode(&element)?);
        }
        if set.is_empty() {
            return Err(LinkError::EmptyDelegationList);
        }
        Ok(set)
    }
}

impl<'a> IntoIterator for &'a DelegationSet {
    type Item = &'a Delegation;
    type IntoIter = std::slice::Iter<'a, Delegation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A Link: a Data packet constrained to carry a delegation set as its
/// content, with the Link content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    data: Data,
    delegations: DelegationSet,
}

impl Link {
    /// Build a Link from a name and (preference, name) pairs. Pairs
    /// are deduplicated and stored in canonical order regardless of
    /// the order given.
    pub fn new(name: Name, pairs: impl IntoIterator<Item = (u64, Name)>) -> Self {
        let mut delegations = DelegationSet::new();
        for (preference, delegation_name) in pairs {
            delegations.insert(Delegation::new(preference, delegation_name));
        }
        let mut data = Data::new(name);
        data.set_content_type(ContentType::Link);
        data.set_content(delegations.encode_value());
        Self { data, delegations }
    }

    pub fn name(&self) -> &Name {
        self.data.name()
    }

    pub fn delegations(&self) -> &DelegationSet {
        &self.delegations
    }

    /// The underlying Data packet (for signing and transport).
    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Data {
        &mut self.data
    }

    /// Insert a delegation; re-serializes the content on change,
    /// which also discards any cached wire encoding and signature.
    pub fn add_delegation(&mut self, preference: u64, name: Name) -> bool {
        let inserted = self.delegations.insert(Delegation::new(preference, name));
        if inserted {
            self.data.set_content(self.delegations.encode_value());
        }
        inserted
    }

    /// Remove the (at most one, first in order) delegation with the
    /// given name; no-op when absent.
    pub fn remove_delegation(&mut self, name: &Name) -> bool {
        let removed = self.delegations.remove_by_name(name);
        if removed {
            self.data.set_content(self.delegations.encode_value());
        }
        removed
    }

    /// Encode to the wire. The packet must have been signed first.
    pub fn wire_encode(&mut self) -> Result<Block, PacketError> {
        self.data.wire_encode()
    }

    /// Decode and validate a Link from a Data TLV block. Fails
    /// atomically: on any structural violation no Link is produced.
    pub fn wire_decode(block: &Block) -> Result<Self, LinkError> {
        let data = Data::wire_decode(block)?;
        if data.meta_info().content_type != ContentType::Link {
            return Err(LinkError::IncorrectContentType);
        }
        let delegations = DelegationSet::decode_value(data.content())?;
        debug!(
            "decoded Link {} with {} delegations",
            data.name(),
            delegations.len()
        );
        Ok(Self { data, delegations })
    }

    /// Count the top-level LinkDelegation groups in a Link's content
    /// without materializing names, for callers that only need the
    /// cardinality.
    pub fn count_delegations_from_wire(block: &Block) -> Result<usize, LinkError> {
        if block.tlv_type() != tlv_types::DATA {
            return Err(PacketError::WrongOuterType(block.tlv_type()).into());
        }
        let mut content = None;
        for element in block.elements() {
            let element = element?;
            if element.tlv_type() == tlv_types::CONTENT {
                content = Some(element);
                break;
            }
        }
        let content = content.ok_or(PacketError::MissingField("Content"))?;
        let mut count = 0;
        for element in content.elements() {
            if element?.tlv_type() == tlv_types::LINK_DELEGATION {
                count += 1;
            }
        }
        Ok(count)
    }
}
