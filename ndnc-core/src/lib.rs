//! NDN client protocol core: NDN-TLV codec, Block/Name data model,
//! Data/Interest/Link packets, and the signing seam.

pub mod block;
pub mod link;
pub mod name;
pub mod packets;
pub mod signature;
pub mod tlv;

pub use block::Block;
pub use link::{Delegation, DelegationSet, Link, LinkError};
pub use name::Name;
pub use packets::{
    tlv_types, ContentType, Data, Interest, KeyLocator, MetaInfo, PacketError, SignatureInfo,
};
pub use signature::{DigestSha256Signer, SignError, SignatureType, Signer};
pub use tlv::TlvError;
