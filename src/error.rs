//! Crate-wide error type.
//!
//! These variants explicitly do not capture checksum mismatches or other protocol-level
//! anomalies in captured traffic; parsing tolerates those (see `Truncated`, `MalformedOption`) and
//! reports them only through the shape of the resulting layer chain. They capture misuse of the
//! `Packet` API itself.

use core::fmt;

use crate::address::AddrParseError;

/// A shortened result type for the operations in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// An error returned by a `Packet` operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// Attaching a layer that already belongs to a packet, or inserting relative to a layer
    /// owned by a different packet.
    OwnershipConflict,

    /// Removing or looking up a layer that is not part of this packet's chain.
    NotFound,

    /// A lower-level address-parse failure, folded in via `From`.
    AddrParse(AddrParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OwnershipConflict => f.write_str("layer is already attached to a different packet"),
            Error::NotFound => f.write_str("layer is not part of this packet"),
            Error::AddrParse(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

impl From<AddrParseError> for Error {
    fn from(inner: AddrParseError) -> Self {
        Error::AddrParse(inner)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
