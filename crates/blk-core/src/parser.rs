//! BLK parser — converts BLK source text into an ordered entry tree.
//!
//! The parser is a single left-to-right character scan driven by an explicit
//! state machine. Nested blocks do not recurse: `{` pushes a frame holding the
//! parent's partial entry list and `}` pops it, so nesting depth costs heap
//! rather than call stack and is bounded by [`ParseOptions::max_depth`].
//!
//! # Grammar
//!
//! ```text
//! block      := entry*
//! entry      := ident ':' type '=' value terminator
//!             | ident whitespace* '{' block '}'
//! type       := 'i' | 'r' | 't' | 'b' | 'm' | 'p2' | 'p3' | 'p4'
//! terminator := ';' | '\n' | '}'
//! ```
//!
//! # Quirks kept on purpose
//!
//! - A value whose first significant character is `"` is read as a raw string
//!   up to the next `"` and stored as [`Value::Str`] whatever its declared type,
//!   so `n:i="5"` holds the string `5`.
//! - A nested block still open at end of input is closed there instead of
//!   failing. This is logged at `warn` because it can hide a truncated file.
//! - A `}` at the top level ends the document; [`parse_prefix`] reports how
//!   much input was consumed up to and including it. [`parse`] rejects any
//!   non-whitespace input after such a brace.

use crate::error::{BlkError, Result};
use crate::types::{is_ident_char, Block, Entry, Matrix, Point, Tree, Value};
use tracing::{debug, trace, warn};

/// Nesting limit used by [`parse`] and [`Parser::new`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of simultaneously open blocks. Exceeding it fails with
    /// [`BlkError::DepthExceeded`].
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Reusable parser carrying its [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a whole document.
    ///
    /// A stray top-level `}` is only accepted as the last significant
    /// character. Anything after it fails with [`BlkError::Grammar`] at the
    /// brace.
    pub fn parse(&self, text: &str) -> Result<Tree> {
        let (tree, consumed) = self.parse_prefix(text)?;
        if text[consumed..].trim().is_empty() {
            return Ok(tree);
        }
        let offset = consumed - 1;
        let (line, column) = locate(text, offset);
        Err(BlkError::Grammar {
            offset,
            line,
            column,
            ch: '}',
            state: State::IdentNext.describe(),
        })
    }

    /// Parse a document and also return the number of bytes consumed. This is
    /// `text.len()` unless a stray top-level `}` ended the document early.
    pub fn parse_prefix(&self, text: &str) -> Result<(Tree, usize)> {
        debug!(bytes = text.len(), "parsing BLK document");
        let (tree, consumed) = Scanner::new(text, self.options).run()?;
        debug!(entries = tree.len(), consumed, "parsed BLK document");
        Ok((tree, consumed))
    }

    /// Parse a standalone `<type>=<value>` literal such as `r=2.5`,
    /// `p3=1,2,3` or `t="hello"`.
    pub fn parse_value(&self, literal: &str) -> Result<Value> {
        let source = format!("value:{literal}");
        let (mut tree, consumed) = self.parse_prefix(&source)?;
        match tree.entries.pop() {
            Some(entry) if tree.is_empty() && consumed == source.len() => Ok(entry.value),
            _ => Err(BlkError::InvalidLiteral(literal.to_string())),
        }
    }
}

/// Parse a BLK document with default options.
///
/// ```
/// use blk_core::{parse, Value};
///
/// let tree = parse("a:i=5\n").unwrap();
/// assert_eq!(tree.get("a"), Some(&Value::Int(5)));
/// ```
pub fn parse(text: &str) -> Result<Tree> {
    Parser::new().parse(text)
}

/// Parse with default options, returning the tree and the consumed byte length.
pub fn parse_prefix(text: &str) -> Result<(Tree, usize)> {
    Parser::new().parse_prefix(text)
}

/// Parse a `<type>=<value>` literal with default options.
pub fn parse_value(literal: &str) -> Result<Value> {
    Parser::new().parse_value(literal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    IdentNext,
    Ident,
    BlockNext,
    TypeNext,
    Type,
    EqualsNext,
    ValueNext,
    Value,
    Quoted,
}

impl State {
    fn describe(self) -> &'static str {
        match self {
            State::IdentNext => "awaiting identifier",
            State::Ident => "reading identifier",
            State::BlockNext => "awaiting '{'",
            State::TypeNext => "awaiting type",
            State::Type => "reading type",
            State::EqualsNext => "awaiting '='",
            State::ValueNext => "awaiting value",
            State::Value => "reading value",
            State::Quoted => "reading quoted string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeTag {
    Int,
    Real,
    Text,
    Bool,
    Matrix,
    P2,
    P3,
    P4,
}

impl TypeTag {
    fn parse(tag: &str) -> Result<Self> {
        Ok(match tag {
            "i" => TypeTag::Int,
            "r" => TypeTag::Real,
            "t" => TypeTag::Text,
            "b" => TypeTag::Bool,
            "m" => TypeTag::Matrix,
            "p2" => TypeTag::P2,
            "p3" => TypeTag::P3,
            "p4" => TypeTag::P4,
            other => return Err(BlkError::UnknownTypeTag(other.to_string())),
        })
    }

    fn as_str(self) -> &'static str {
        match self {
            TypeTag::Int => "i",
            TypeTag::Real => "r",
            TypeTag::Text => "t",
            TypeTag::Bool => "b",
            TypeTag::Matrix => "m",
            TypeTag::P2 => "p2",
            TypeTag::P3 => "p3",
            TypeTag::P4 => "p4",
        }
    }

    /// Convert a raw lexeme according to this tag.
    fn convert(self, raw: &str) -> Result<Value> {
        match self {
            TypeTag::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid_number(self, raw)),
            TypeTag::Real => parse_float(self, raw).map(Value::Real),
            TypeTag::Text => Ok(Value::Str(raw.trim_end_matches('\r').to_string())),
            TypeTag::Bool => match raw.trim() {
                "yes" | "true" => Ok(Value::Bool(true)),
                "no" | "false" => Ok(Value::Bool(false)),
                other => Err(BlkError::InvalidBooleanLiteral(other.to_string())),
            },
            TypeTag::Matrix => parse_matrix(raw).map(Value::Matrix),
            TypeTag::P2 => parse_point(self, raw, 2),
            TypeTag::P3 => parse_point(self, raw, 3),
            TypeTag::P4 => parse_point(self, raw, 4),
        }
    }
}

fn parse_point(tag: TypeTag, raw: &str, expected: usize) -> Result<Value> {
    let xs = raw
        .split(',')
        .map(|x| parse_float(tag, x))
        .collect::<Result<Vec<f64>>>()?;
    let mismatch = || BlkError::PointArityMismatch {
        expected,
        actual: xs.len(),
    };
    if xs.len() != expected {
        return Err(mismatch());
    }
    Point::from_slice(&xs).map(Value::Point).ok_or_else(mismatch)
}

fn parse_float(tag: TypeTag, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| invalid_number(tag, raw))
}

fn invalid_number(tag: TypeTag, raw: &str) -> BlkError {
    BlkError::InvalidNumber {
        tag: tag.as_str(),
        token: raw.trim().to_string(),
    }
}

/// Parse a matrix lexeme.
///
/// Accepted shapes: `[[a,b] [c,d] ...]` (rows), `[a,b,c]` and `a,b,c` (flat).
/// Rows are found by single-level bracket matching, so a row that itself
/// contains brackets is rejected rather than flattened.
fn parse_matrix(raw: &str) -> Result<Matrix> {
    let m = raw.trim();
    match m.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) if inner.contains('[') => extract_rows(inner, raw).map(Matrix::Rows),
        Some(inner) => parse_flat(inner, raw).map(Matrix::Flat),
        None => parse_flat(m, raw).map(Matrix::Flat),
    }
}

fn parse_flat(s: &str, raw: &str) -> Result<Vec<f64>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|x| {
            x.trim()
                .parse::<f64>()
                .map_err(|_| BlkError::InvalidMatrix(raw.trim().to_string()))
        })
        .collect()
}

fn extract_rows(inner: &str, raw: &str) -> Result<Vec<Vec<f64>>> {
    let malformed = || BlkError::InvalidMatrix(raw.trim().to_string());
    let mut rows = Vec::new();
    let mut rest = inner;
    loop {
        // Groups may be separated by whitespace and/or commas.
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        let body = rest.strip_prefix('[').ok_or_else(malformed)?;
        let end = body.find(']').ok_or_else(malformed)?;
        rows.push(parse_flat(&body[..end], raw)?);
        rest = &body[end + 1..];
    }
    Ok(rows)
}

/// An enclosing block whose body is currently being scanned.
struct Frame {
    key: String,
    entries: Vec<Entry>,
}

struct Scanner<'a> {
    text: &'a str,
    options: ParseOptions,
    state: State,
    buf: String,
    key: String,
    tag: TypeTag,
    quote_start: usize,
    entries: Vec<Entry>,
    stack: Vec<Frame>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, options: ParseOptions) -> Self {
        Self {
            text,
            options,
            state: State::IdentNext,
            buf: String::new(),
            key: String::new(),
            tag: TypeTag::Text,
            quote_start: 0,
            entries: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Result<(Tree, usize)> {
        let text = self.text;
        for (i, ch) in text.char_indices() {
            match self.state {
                State::IdentNext => {
                    if is_ident_char(ch) {
                        self.buf.clear();
                        self.buf.push(ch);
                        self.state = State::Ident;
                    } else if ch == '}' {
                        if !self.close_block() {
                            return Ok((Block::from(self.entries), i + 1));
                        }
                    } else if !(ch.is_whitespace() || ch == ';') {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::Ident => {
                    if ch == ':' {
                        self.key = std::mem::take(&mut self.buf);
                        self.state = State::TypeNext;
                    } else if ch == '{' {
                        self.key = std::mem::take(&mut self.buf);
                        self.open_block(i)?;
                    } else if ch.is_whitespace() {
                        self.key = std::mem::take(&mut self.buf);
                        self.state = State::BlockNext;
                    } else if is_ident_char(ch) {
                        self.buf.push(ch);
                    } else {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::BlockNext => {
                    if ch == '{' {
                        self.open_block(i)?;
                    } else if !ch.is_whitespace() {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::TypeNext => {
                    if ch.is_ascii_alphabetic() {
                        self.buf.clear();
                        self.buf.push(ch);
                        self.state = State::Type;
                    } else if !ch.is_whitespace() {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::Type => {
                    if ch.is_ascii_alphanumeric() {
                        self.buf.push(ch);
                    } else if ch == '=' {
                        self.tag = TypeTag::parse(&self.buf)?;
                        self.state = State::ValueNext;
                    } else if ch.is_whitespace() {
                        self.tag = TypeTag::parse(&self.buf)?;
                        self.state = State::EqualsNext;
                    } else {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::EqualsNext => {
                    if ch == '=' {
                        self.state = State::ValueNext;
                    } else if !ch.is_whitespace() {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::ValueNext => {
                    if ch == '"' {
                        self.buf.clear();
                        self.quote_start = i;
                        self.state = State::Quoted;
                    } else if ch.is_alphanumeric() || matches!(ch, '[' | '+' | '-') {
                        self.buf.clear();
                        self.buf.push(ch);
                        self.state = State::Value;
                    } else if !ch.is_whitespace() {
                        return Err(self.unexpected(i, ch));
                    }
                }
                State::Quoted => {
                    if ch == '"' {
                        // Stored verbatim; the declared type is not applied.
                        let value = Value::Str(std::mem::take(&mut self.buf));
                        self.push_entry(value);
                        self.state = State::IdentNext;
                    } else {
                        self.buf.push(ch);
                    }
                }
                State::Value => {
                    if matches!(ch, ';' | '\n' | '"') {
                        self.finish_value()?;
                        self.state = State::IdentNext;
                    } else if ch == '}' {
                        self.finish_value()?;
                        self.state = State::IdentNext;
                        if !self.close_block() {
                            return Ok((Block::from(self.entries), i + 1));
                        }
                    } else if ch.is_alphanumeric()
                        || ch.is_whitespace()
                        || matches!(ch, '_' | '/' | '[' | ']' | '.' | ',' | '+' | '-')
                    {
                        self.buf.push(ch);
                    } else {
                        return Err(self.unexpected(i, ch));
                    }
                }
            }
        }

        self.finish_input()
    }

    fn finish_input(mut self) -> Result<(Tree, usize)> {
        let end = self.text.len();
        match self.state {
            State::IdentNext => {}
            State::Value => self.finish_value()?,
            State::Quoted => {
                let (line, column) = locate(self.text, self.quote_start);
                return Err(BlkError::UnterminatedString { line, column });
            }
            state => {
                let (line, column) = locate(self.text, end);
                return Err(BlkError::UnexpectedEof {
                    line,
                    column,
                    state: state.describe(),
                });
            }
        }

        while let Some(frame) = self.stack.last() {
            warn!(
                key = %frame.key,
                depth = self.stack.len(),
                "block not closed before end of input, closing it there"
            );
            self.close_block();
        }
        Ok((Block::from(self.entries), end))
    }

    /// Enter the body of a block named by `self.key`. `offset` is the `{`.
    fn open_block(&mut self, offset: usize) -> Result<()> {
        if self.stack.len() >= self.options.max_depth {
            let (line, _) = locate(self.text, offset);
            return Err(BlkError::DepthExceeded {
                limit: self.options.max_depth,
                line,
            });
        }
        let parent = std::mem::take(&mut self.entries);
        self.stack.push(Frame {
            key: std::mem::take(&mut self.key),
            entries: parent,
        });
        self.state = State::IdentNext;
        Ok(())
    }

    /// Close the innermost open block and append it to its parent. Returns
    /// false when no block is open, i.e. the `}` belongs to the caller.
    fn close_block(&mut self) -> bool {
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        let body = std::mem::replace(&mut self.entries, frame.entries);
        trace!(key = %frame.key, depth = self.stack.len() + 1, entries = body.len(), "closed block");
        self.entries.push(Entry {
            key: frame.key,
            value: Value::Block(Block::from(body)),
        });
        true
    }

    fn finish_value(&mut self) -> Result<()> {
        let raw = std::mem::take(&mut self.buf);
        let value = self.tag.convert(&raw)?;
        self.push_entry(value);
        Ok(())
    }

    fn push_entry(&mut self, value: Value) {
        self.entries.push(Entry {
            key: std::mem::take(&mut self.key),
            value,
        });
    }

    fn unexpected(&self, offset: usize, ch: char) -> BlkError {
        let (line, column) = locate(self.text, offset);
        BlkError::Grammar {
            offset,
            line,
            column,
            ch,
            state: self.state.describe(),
        }
    }
}

/// 1-based line and column (in characters) of a byte offset.
fn locate(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |p| p + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
