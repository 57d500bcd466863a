//! Command implementations behind the `pyget` binary.

mod decode;
mod find;
mod inspect;
mod list;
mod source;

pub use decode::decode;
pub use find::{FindOptions, find, format_package};
pub use inspect::inspect;
pub use list::list;
pub use source::{source_add, source_list, source_remove};
