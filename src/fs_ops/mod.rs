//! Filesystem operations: modularized.

mod atomic;
mod copy;
mod io_copy;
mod metadata;
mod tree;
mod util;

pub use atomic::try_atomic_move;
pub use copy::copy_file;
pub use metadata::preserve_metadata;
pub use tree::copy_tree;
pub use util::{path_exists, remove_all};
