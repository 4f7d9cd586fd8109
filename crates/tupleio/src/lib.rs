//! # Tupleio
//!
//! Converts between the host's chunked arrays and the flat tuple sequences
//! the rest of the core operates on (§4.5), externally sorts those
//! sequences on `(hash, keys)` with tempfile spill (§4.6), and provides a
//! random-access cursor over an already-sorted sequence (§4.7).
//!
//! Same codec-plus-spill-file-plus-merge shape as any on-disk segment
//! writer/reader, just for join-intermediate tuples instead of committed
//! key-value segments.

mod codec;
mod cursor;
mod partition;
mod reader;
mod sort;
mod writer;

pub use cursor::SortedCursor;
pub use partition::hash_partition_target;
pub use reader::TupleReader;
pub use sort::ExternalSorter;
pub use writer::{TupleWriter, WriterMode, WrittenRow};
