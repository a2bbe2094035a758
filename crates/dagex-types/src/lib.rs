//! Foundation types for dagex.
//!
//! Every other dagex crate depends on `dagex-types`. It carries the small
//! vocabulary shared by the retrieval, storage and presentation layers.
//!
//! # Key Types
//!
//! - [`Codec`] -- the multicodec of a CID, as the resolver sees it
//! - [`ProviderAddress`] -- the storage provider a retrieval is made from
//! - [`DealId`] -- identifier of a retrieval or storage deal
//! - [`TokenAmount`] -- an attoFIL amount, displayed in FIL
//! - [`size_str`] -- byte counts in binary units

pub mod address;
pub mod codec;
pub mod deal;
pub mod error;
pub mod token;
pub mod units;

pub use address::ProviderAddress;
pub use cid::Cid;
pub use codec::{parse_cid, Codec};
pub use deal::DealId;
pub use error::{TypeError, TypeResult};
pub use token::TokenAmount;
pub use units::size_str;
