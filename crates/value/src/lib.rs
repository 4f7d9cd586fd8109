//! # Value
//!
//! The typed-cell data model shared by every crate in this workspace: the
//! [`Value`]/[`Tuple`] types the join core moves around (§3), the fixed
//! byte serialization and murmur3 hash used for key routing (§4.1), the
//! schema/column-mapping types realizing the host's "Input arrays" contract
//! (§6), and the [`JoinError`] kinds every crate raises (§7).

mod error;
mod hash;
mod schema;
mod value;

pub use error::{JoinError, JoinResult};
pub use hash::{concat_key_bytes, hash_key_bytes, murmur3_32, SEED_PRIMARY, SEED_SECONDARY};
pub use schema::{AttributeDesc, Cell, ColumnSource, DimensionDesc, InputArray, JoinLayout, Schema, SideLayout};
pub use value::{compare_keys, keys_equal, Tuple, TypeId, Value};
