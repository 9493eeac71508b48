//! BLK serializer — renders an entry tree back into BLK source text.
//!
//! The type tag of each entry is chosen from the value's variant. Output is
//! canonical: one entry per line, two spaces of indentation per nesting level,
//! no trailing newline. Anything the parser produces serializes back to text
//! that parses to an equal tree.
//!
//! # Example
//! ```
//! use blk_core::{serialize, Block, Value};
//!
//! let tree = Block::new().with("a", Value::Bool(true));
//! assert_eq!(serialize(&tree).unwrap(), "a:b=yes");
//! ```

use crate::error::{BlkError, Result};
use crate::types::{is_identifier, Block, Matrix, Tree, Value};
use tracing::debug;

/// Serialize a tree into BLK text.
pub fn serialize(tree: &Tree) -> Result<String> {
    debug!(entries = tree.len(), "serializing BLK document");
    let mut out = String::new();
    write_block(tree, 0, &mut out)?;
    Ok(out)
}

/// Render a single non-block value as its `<type>=<value>` text, e.g. `r=1.5`.
pub fn render_value(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_scalar("<value>", value, &mut out)?;
    Ok(out)
}

/// Emit the entries of a block at `depth`, separated by newlines.
fn write_block(block: &Block, depth: usize, out: &mut String) -> Result<()> {
    let indent = make_indent(depth);
    for (i, entry) in block.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !is_identifier(&entry.key) {
            return Err(BlkError::UnsupportedValue {
                key: entry.key.clone(),
                reason: "key is not an identifier".to_string(),
            });
        }
        out.push_str(&indent);
        out.push_str(&entry.key);
        match &entry.value {
            Value::Block(child) => {
                out.push_str("{\n");
                write_block(child, depth + 1, out)?;
                out.push('\n');
                out.push_str(&indent);
                out.push('}');
            }
            value => {
                out.push(':');
                write_scalar(&entry.key, value, out)?;
            }
        }
    }
    Ok(())
}

fn write_scalar(key: &str, value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Bool(b) => {
            out.push_str("b=");
            out.push_str(if *b { "yes" } else { "no" });
        }
        Value::Real(x) => {
            out.push_str("r=");
            out.push_str(&format_real(*x));
        }
        Value::Str(s) => {
            // Quoted strings have no escape syntax.
            if s.contains('"') {
                return Err(BlkError::UnsupportedValue {
                    key: key.to_string(),
                    reason: "string contains a double quote".to_string(),
                });
            }
            out.push_str("t=\"");
            out.push_str(s);
            out.push('"');
        }
        Value::Int(n) => {
            out.push_str("i=");
            out.push_str(&n.to_string());
        }
        Value::Point(p) => {
            out.push('p');
            out.push_str(&p.arity().to_string());
            out.push('=');
            out.push_str(&join_reals(p.as_slice()));
        }
        Value::Matrix(Matrix::Flat(xs)) => {
            out.push_str("m=[");
            out.push_str(&join_reals(xs));
            out.push(']');
        }
        Value::Matrix(Matrix::Rows(rows)) => {
            out.push_str("m=[");
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push('[');
                out.push_str(&join_reals(row));
                out.push(']');
            }
            out.push(']');
        }
        Value::Block(_) => {
            return Err(BlkError::UnsupportedValue {
                key: key.to_string(),
                reason: "a block has no inline value form".to_string(),
            });
        }
    }
    Ok(())
}

fn join_reals(xs: &[f64]) -> String {
    xs.iter()
        .map(|x| format_real(*x))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a float the way BLK files write them:
/// - integral values without a fractional part (`5`, not `5.0`)
/// - otherwise the shortest decimal that parses back to the same value
/// - negative zero as `0`
fn format_real(x: f64) -> String {
    let x = if x == 0.0 { 0.0 } else { x };
    if x.fract() == 0.0 && x.abs() < (i64::MAX as f64) {
        return (x as i64).to_string();
    }
    format!("{x}")
}

/// Generate a 2-space-per-level indentation string.
fn make_indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_real_drops_integral_fraction() {
        assert_eq!(format_real(5.0), "5");
        assert_eq!(format_real(-3.0), "-3");
        assert_eq!(format_real(-0.0), "0");
        assert_eq!(format_real(1.25), "1.25");
    }

    #[test]
    fn format_real_avoids_exponents() {
        assert_eq!(format_real(0.0001), "0.0001");
        assert_eq!(format_real(1e20), "100000000000000000000");
    }

    #[test]
    fn indent_is_two_spaces_per_level() {
        assert_eq!(make_indent(0), "");
        assert_eq!(make_indent(3), "      ");
    }
}
