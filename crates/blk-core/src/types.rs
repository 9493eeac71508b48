//! BLK value model: entries, blocks, typed values and paths.
//!
//! A document is an ordered list of `(key, value)` entries. Keys may repeat
//! and order is significant, so blocks are plain vectors rather than maps.

use crate::error::BlkError;
use std::fmt;
use std::str::FromStr;

/// A single BLK value. The variant determines the type tag written by the
/// serializer; the tag itself is not stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `i=`
    Int(i64),
    /// `r=`
    Real(f64),
    /// `b=`
    Bool(bool),
    /// `t=`, and any quoted value regardless of its declared tag.
    Str(String),
    /// `p2=`, `p3=`, `p4=`
    Point(Point),
    /// `m=`
    Matrix(Matrix),
    /// `key{ ... }`
    Block(Block),
}

impl Value {
    /// The BLK type tag this value serializes under (`"block"` for blocks).
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Int(_) => "i",
            Value::Real(_) => "r",
            Value::Bool(_) => "b",
            Value::Str(_) => "t",
            Value::Point(p) => p.type_tag(),
            Value::Matrix(_) => "m",
            Value::Block(_) => "block",
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Value::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Value::Block(_))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<Block> for Value {
    fn from(b: Block) -> Self {
        Value::Block(b)
    }
}

/// Fixed-arity float tuple. The arity is part of the type, so a `p3` value
/// can never hold two or four components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Point {
    P2([f64; 2]),
    P3([f64; 3]),
    P4([f64; 4]),
}

impl Point {
    pub fn arity(&self) -> usize {
        self.as_slice().len()
    }

    pub fn as_slice(&self) -> &[f64] {
        match self {
            Point::P2(xs) => xs,
            Point::P3(xs) => xs,
            Point::P4(xs) => xs,
        }
    }

    /// Build a point from a slice of 2, 3 or 4 components.
    pub fn from_slice(xs: &[f64]) -> Option<Self> {
        match *xs {
            [a, b] => Some(Point::P2([a, b])),
            [a, b, c] => Some(Point::P3([a, b, c])),
            [a, b, c, d] => Some(Point::P4([a, b, c, d])),
            _ => None,
        }
    }

    fn type_tag(&self) -> &'static str {
        match self {
            Point::P2(_) => "p2",
            Point::P3(_) => "p3",
            Point::P4(_) => "p4",
        }
    }
}

/// Numeric matrix value. Only one level of row nesting is representable.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    /// `m=[1,2,3]` or `m=1,2,3`
    Flat(Vec<f64>),
    /// `m=[[1,2] [3,4]]`
    Rows(Vec<Vec<f64>>),
}

/// One `(key, value)` pair in a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of entries. Duplicate keys are kept; key lookups return the
/// first match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub entries: Vec<Entry>,
}

/// A parsed document. The root has no wrapping key of its own.
pub type Tree = Block;

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push(Entry::new(key, value));
    }

    /// Builder-style [`Block::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    /// Value of the first entry named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|e| e.key == key)
            .map(|e| &mut e.value)
    }

    /// Position of the first entry named `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }
}

impl From<Vec<Entry>> for Block {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<Entry> for Block {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// First entry in the block with this key.
    Key(String),
    /// Entry at this position in the block, whatever its key.
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "#{i}"),
        }
    }
}

/// Whether search operations report matches as key or index segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStyle {
    #[default]
    Keys,
    Indices,
}

/// Ordered sequence of key and index segments addressing a node in a tree.
///
/// The text form joins segments with `/` and writes indices as `#N`:
/// `mission_settings/player/wing`, `units/#0/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.segments.push(segment.into());
    }

    /// A copy of this path with `segment` appended.
    pub fn join(&self, segment: impl Into<Segment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Everything but the last segment, or `None` for an empty path.
    pub fn parent(&self) -> Option<Path> {
        let (_, prefix) = self.segments.split_last()?;
        Some(Path::from(prefix.to_vec()))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = BlkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::new());
        }
        s.split('/')
            .map(|part| {
                if let Some(index) = part.strip_prefix('#') {
                    index
                        .parse::<usize>()
                        .map(Segment::Index)
                        .map_err(|_| BlkError::InvalidPath(s.to_string()))
                } else if is_identifier(part) {
                    Ok(Segment::Key(part.to_string()))
                } else {
                    Err(BlkError::InvalidPath(s.to_string()))
                }
            })
            .collect()
    }
}

/// Build a [`Path`] from keys and indices: `path!["units", 0, "name"]`.
#[macro_export]
macro_rules! path {
    ($($segment:expr),* $(,)?) => {
        $crate::Path::from(vec![$($crate::Segment::from($segment)),*])
    };
}

/// `[A-Za-z0-9_.]`
pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// Non-empty run of identifier characters.
pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char)
}
