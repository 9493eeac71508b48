//! Path-based lookup, search and mutation over a parsed tree.
//!
//! A [`Path`] is a list of key and index segments. A key segment selects the
//! first entry with that key in the current block; an index segment selects
//! the entry at that position regardless of key. Every segment except the
//! last must land on a block.
//!
//! Nothing here fails: a path that does not resolve is `None` (or `false` for
//! [`set_value_at`]), because callers routinely probe paths that may or may
//! not exist in a given document.
//!
//! Mutation happens in place through `&mut Tree`. Taking a snapshot before a
//! series of edits is an explicit `tree.clone()`.

use crate::types::{Block, Entry, Path, PathStyle, Segment, Tree, Value};
use tracing::debug;

/// Restricts [`find_value_of_key`] to part of the tree.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'p> {
    /// Search below entries with this key.
    Key(&'p str),
    /// Search below the block this path addresses.
    Path(&'p Path),
}

/// The value the path addresses.
///
/// ```
/// use blk_core::{parse, path, value_at, Value};
///
/// let tree = parse("block{\n x:r=1.5\n}\n").unwrap();
/// assert_eq!(value_at(&tree, &path!["block", "x"]), Some(&Value::Real(1.5)));
/// assert_eq!(value_at(&tree, &path!["block", "y"]), None);
/// ```
pub fn value_at<'a>(tree: &'a Tree, path: &Path) -> Option<&'a Value> {
    entry_at(tree, path).map(|entry| &entry.value)
}

pub fn value_at_mut<'a>(tree: &'a mut Tree, path: &Path) -> Option<&'a mut Value> {
    entry_at_mut(tree, path).map(|entry| &mut entry.value)
}

/// The entry the path terminates on, whether its value is a block or not.
pub fn entry_at<'a>(tree: &'a Tree, path: &Path) -> Option<&'a Entry> {
    let (last, prefix) = path.segments().split_last()?;
    step(block_at(tree, prefix)?, last)
}

pub fn entry_at_mut<'a>(tree: &'a mut Tree, path: &Path) -> Option<&'a mut Entry> {
    let (last, prefix) = path.segments().split_last()?;
    step_mut(block_at_mut(tree, prefix)?, last)
}

/// Replace the value at `path` in place.
///
/// Returns `false` and leaves the tree untouched when the path does not
/// resolve. A key segment never creates a missing entry.
pub fn set_value_at(tree: &mut Tree, path: &Path, value: Value) -> bool {
    match entry_at_mut(tree, path) {
        Some(entry) => {
            entry.value = value;
            true
        }
        None => {
            debug!(path = %path, "path did not resolve, tree left unchanged");
            false
        }
    }
}

/// Depth-first, pre-order search for the first entry whose value equals
/// `target`.
///
/// With a `scope` key, only entries below an entry with that key can match:
/// its direct children are compared first, each followed by an unscoped
/// search of that child's subtree. `style` chooses whether the returned path
/// uses keys or positions.
pub fn find_path_of_value(
    tree: &Tree,
    target: &Value,
    scope: Option<&str>,
    style: PathStyle,
) -> Option<Path> {
    search_value(tree, target, scope, style, &Path::new())
}

fn search_value(
    block: &Block,
    target: &Value,
    scope: Option<&str>,
    style: PathStyle,
    prefix: &Path,
) -> Option<Path> {
    for (idx, entry) in block.iter().enumerate() {
        match scope {
            Some(parent) if entry.key == parent => {
                let Value::Block(children) = &entry.value else {
                    continue;
                };
                let here = prefix.join(segment(style, idx, entry));
                for (sub_idx, child) in children.iter().enumerate() {
                    let child_path = here.join(segment(style, sub_idx, child));
                    if child.value == *target {
                        return Some(child_path);
                    }
                    if let Value::Block(grandchildren) = &child.value {
                        let found = search_value(grandchildren, target, None, style, &child_path);
                        if found.is_some() {
                            return found;
                        }
                    }
                }
            }
            None if entry.value == *target => {
                return Some(prefix.join(segment(style, idx, entry)));
            }
            _ => {
                if let Value::Block(child) = &entry.value {
                    let here = prefix.join(segment(style, idx, entry));
                    let found = search_value(child, target, scope, style, &here);
                    if found.is_some() {
                        return found;
                    }
                }
            }
        }
    }
    None
}

/// Depth-first, pre-order search for the first entry named `key`.
pub fn find_path_of_key(tree: &Tree, key: &str, style: PathStyle) -> Option<Path> {
    search_key(tree, key, style, &Path::new())
}

fn search_key(block: &Block, key: &str, style: PathStyle, prefix: &Path) -> Option<Path> {
    for (idx, entry) in block.iter().enumerate() {
        let here = prefix.join(segment(style, idx, entry));
        if entry.key == key {
            return Some(here);
        }
        if let Value::Block(child) = &entry.value {
            let found = search_key(child, key, style, &here);
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

/// Key of the block that directly contains the first entry named `key`.
///
/// `None` when there is no such entry or when the first one sits at the root,
/// which has no key.
pub fn closest_parent_key<'a>(tree: &'a Tree, key: &str) -> Option<&'a str> {
    fn search<'a>(block: &'a Block, key: &str, parent: Option<&'a str>) -> Option<Option<&'a str>> {
        for entry in block {
            if entry.key == key {
                return Some(parent);
            }
            if let Value::Block(child) = &entry.value {
                if let Some(found) = search(child, key, Some(entry.key.as_str())) {
                    return Some(found);
                }
            }
        }
        None
    }

    search(tree, key, None).flatten()
}

/// Path of the block containing the entry at `path`: the path minus its last
/// segment, provided that prefix is non-empty and addresses a block.
pub fn closest_parent_path(tree: &Tree, path: &Path) -> Option<Path> {
    let parent = path.parent()?;
    if parent.is_empty() {
        return None;
    }
    block_at(tree, parent.segments()).map(|_| parent)
}

/// Value of the first entry named `key`, in pre-order, optionally restricted
/// to a [`Scope`].
pub fn find_value_of_key<'a>(tree: &'a Tree, key: &str, scope: Option<Scope<'_>>) -> Option<&'a Value> {
    match scope {
        None => first_with_key(tree, key),
        Some(Scope::Path(path)) => first_with_key(block_at(tree, path.segments())?, key),
        Some(Scope::Key(parent)) => first_under_parent(tree, key, parent),
    }
}

fn first_with_key<'a>(block: &'a Block, key: &str) -> Option<&'a Value> {
    for entry in block {
        if entry.key == key {
            return Some(&entry.value);
        }
        if let Value::Block(child) = &entry.value {
            let found = first_with_key(child, key);
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn first_under_parent<'a>(block: &'a Block, key: &str, parent: &str) -> Option<&'a Value> {
    for entry in block {
        if let Value::Block(child) = &entry.value {
            let found = if entry.key == parent {
                first_with_key(child, key)
            } else {
                first_under_parent(child, key, parent)
            };
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn segment(style: PathStyle, idx: usize, entry: &Entry) -> Segment {
    match style {
        PathStyle::Keys => Segment::Key(entry.key.clone()),
        PathStyle::Indices => Segment::Index(idx),
    }
}

fn step<'a>(block: &'a Block, segment: &Segment) -> Option<&'a Entry> {
    match segment {
        Segment::Key(key) => block.iter().find(|e| e.key == *key),
        Segment::Index(idx) => block.entries.get(*idx),
    }
}

fn step_mut<'a>(block: &'a mut Block, segment: &Segment) -> Option<&'a mut Entry> {
    match segment {
        Segment::Key(key) => block.entries.iter_mut().find(|e| e.key == *key),
        Segment::Index(idx) => block.entries.get_mut(*idx),
    }
}

/// The block reached by walking `segments`; every step must land on a block.
fn block_at<'a>(tree: &'a Tree, segments: &[Segment]) -> Option<&'a Block> {
    segments
        .iter()
        .try_fold(tree, |block, seg| step(block, seg)?.value.as_block())
}

fn block_at_mut<'a>(tree: &'a mut Tree, segments: &[Segment]) -> Option<&'a mut Block> {
    let mut block = tree;
    for seg in segments {
        block = step_mut(block, seg)?.value.as_block_mut()?;
    }
    Some(block)
}
