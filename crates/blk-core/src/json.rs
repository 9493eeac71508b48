//! JSON export of a parsed tree, for inspection and for tools that only read JSON.
//!
//! Blocks become JSON objects in document order. Because BLK keys may repeat,
//! all values sharing a key within one block are grouped into a JSON array
//! under the first occurrence's position. Points and matrices become arrays.
//! The mapping is one-way: type tags and duplicate-key interleaving are lost.

use crate::error::Result;
use crate::types::{Block, Matrix, Tree, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Real(x) => serializer.serialize_f64(*x),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Point(p) => serializer.collect_seq(p.as_slice()),
            Value::Matrix(Matrix::Flat(xs)) => serializer.collect_seq(xs),
            Value::Matrix(Matrix::Rows(rows)) => serializer.collect_seq(rows),
            Value::Block(block) => block.serialize(serializer),
        }
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut groups: Vec<(&str, Vec<&Value>)> = Vec::new();
        for entry in self {
            match groups.iter_mut().find(|(key, _)| *key == entry.key) {
                Some((_, values)) => values.push(&entry.value),
                None => groups.push((&entry.key, vec![&entry.value])),
            }
        }

        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (key, values) in &groups {
            match values.as_slice() {
                [single] => map.serialize_entry(key, single)?,
                many => map.serialize_entry(key, many)?,
            }
        }
        map.end()
    }
}

/// Convert a tree into a `serde_json::Value`.
///
/// ```
/// use blk_core::{parse, to_json};
///
/// let tree = parse("unit{\n name:t=\"tank\"\n}\nunit{\n name:t=\"plane\"\n}").unwrap();
/// let json = to_json(&tree).unwrap();
/// assert_eq!(json["unit"][1]["name"], "plane");
/// ```
pub fn to_json(tree: &Tree) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(tree)?)
}

/// Render a tree as JSON text, pretty-printed when `pretty` is set.
pub fn to_json_string(tree: &Tree, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(tree)?
    } else {
        serde_json::to_string(tree)?
    };
    Ok(text)
}
