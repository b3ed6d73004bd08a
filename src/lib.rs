//! A packet crafting and parsing library for Ethernet, VLAN, ARP, IPv4, IPv6, TCP and UDP.
//!
//! A [`Packet`] wraps a single contiguous byte buffer and an ordered chain of typed protocol
//! layers over it. Three workflows are supported: parsing a captured frame into a chain of typed
//! views (`Packet::from_raw`), constructing a packet by appending or inserting typed layers
//! (`Packet::add_layer`, `Packet::insert_layer`), and finalizing a packet — computing length
//! fields, checksums and next-protocol indicators — before it is transmitted or compared
//! (`Packet::compute_calculate_fields`).
//!
//! This crate performs no I/O, no fragment or stream reassembly, and no routing. It hands back
//! byte images; what a caller does with them (send them over a socket, write them to a capture
//! file, diff them against a reference) is outside its scope.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(feature = "alloc", not(feature = "std")))]
#[macro_use]
extern crate alloc;

/// Re-exports `Vec`/`String`/`format!` from whichever of `alloc`/`std` is active, so the rest of
/// the crate can stay agnostic to the `std` feature the way the crate this one is modeled on does.
mod no_std_prelude {
    #[cfg(feature = "std")]
    pub use std::{format, string::String, vec, vec::Vec};
    #[cfg(all(feature = "alloc", not(feature = "std")))]
    pub use alloc::{format, string::String, vec, vec::Vec};
}

pub mod address;
pub mod buffer;
pub mod checksum;
pub mod error;
pub mod packet;
pub mod tag;
pub mod wire;

pub use address::{Ipv4Address, Ipv6Address, MacAddress};
pub use buffer::{RawBuffer, Timestamp};
pub use checksum::internet_checksum;
pub use error::{Error, Result};
pub use packet::{DetachedLayer, LayerHandle, Packet};
pub use tag::ProtocolTag;
