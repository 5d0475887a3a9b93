//! Data-driven binary decision tree
//!
//! A trained tree is stored as a flat table of [`Node`]s addressed by index,
//! instead of being compiled into branch code:
//!
//! ```text
//!   idx  node
//!   0    split  f[27] <= 24.434164 ? 1 : 2
//!   1    leaf   class 2
//!   2    leaf   class 5
//! ```
//!
//! Tables are immutable once validated and can live in read-only memory.

pub mod node;
pub mod table;

pub use node::{Node, NodeKind};
pub use table::NodeTable;
