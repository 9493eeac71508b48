//! # blk-core
//!
//! Parser, serializer and path-addressing layer for **BLK**, a hierarchical,
//! typed text format of `key:type=value` entries and `key{ ... }` blocks.
//!
//! ## Quick start
//!
//! ```rust
//! use blk_core::{parse, path, serialize, set_value_at, value_at, Value};
//!
//! let mut tree = parse("block{\n x:r=1.5\n}\n").unwrap();
//! assert!(set_value_at(&mut tree, &path!["block", "x"], Value::Real(2.0)));
//! assert_eq!(value_at(&tree, &path!["block", "x"]), Some(&Value::Real(2.0)));
//! assert_eq!(serialize(&tree).unwrap(), "block{\n  x:r=2\n}");
//! ```
//!
//! ## Modules
//!
//! - [`parser`] — BLK text → [`Tree`]
//! - [`serializer`] — [`Tree`] → BLK text
//! - [`path`] — lookup, search and in-place mutation by [`Path`]
//! - [`json`] — one-way JSON export
//! - [`types`] — value model
//! - [`error`] — error type

pub mod error;
pub mod json;
pub mod parser;
pub mod path;
pub mod serializer;
pub mod types;

pub use error::{BlkError, Result};
pub use json::{to_json, to_json_string};
pub use parser::{parse, parse_prefix, parse_value, ParseOptions, Parser, DEFAULT_MAX_DEPTH};
pub use path::{
    closest_parent_key, closest_parent_path, entry_at, entry_at_mut, find_path_of_key,
    find_path_of_value, find_value_of_key, set_value_at, value_at, value_at_mut, Scope,
};
pub use serializer::{render_value, serialize};
pub use types::{Block, Entry, Matrix, Path, PathStyle, Point, Segment, Tree, Value};
