//! Network Layer
//!
//! Wire shapes and the allowlisted JSON codec. The socket listener itself
//! lives with the transport and only ever talks to peers through
//! [`encode`] and [`decode`].

pub mod codec;
pub mod protocol;

pub use codec::{decode, decode_slice, encode, CodecError, WireRegistry, WireValue};
pub use protocol::{
    ClientStatus, NetworkItem, NetworkPlayer, NetworkSlot, Permission, SlotType, Version,
};
