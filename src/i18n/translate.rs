//! Translation engine: raw lookup followed by `{name}` placeholder
//! substitution.
//!
//! Substitution runs one argument at a time over a list of segments. Scalar
//! arguments are substituted into text segments in place. Rich arguments
//! (opaque nodes) split every text segment around their placeholder, and each
//! inserted node gets a key `"<name>-<segment>-<occurrence>"`. The argument
//! name keeps keys unique across arguments, the segment index and occurrence
//! keep them unique within one. Segments that already became nodes are never
//! touched by later arguments.

use crate::i18n::LanguageFile;
use std::convert::Infallible;
use std::fmt;

/// Replacement value for a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<N> {
    Text(String),
    Integer(i64),
    Float(f64),
    /// Opaque rich content, inserted as its own segment.
    Node(N),
}

impl<N> Arg<N> {
    pub fn node(node: N) -> Self {
        Arg::Node(node)
    }

    /// Whether this value is substituted as plain text.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Arg::Node(_))
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            Arg::Text(text) => Some(text.clone()),
            Arg::Integer(value) => Some(value.to_string()),
            Arg::Float(value) => Some(format_float(*value)),
            Arg::Node(_) => None,
        }
    }
}

/// Format a float the way a browser would print a number.
fn format_float(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else {
        value.to_string()
    }
}

impl<N> From<&str> for Arg<N> {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl<N> From<String> for Arg<N> {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

macro_rules! integer_arg {
    ($($t:ty),*) => {
        $(
            impl<N> From<$t> for Arg<N> {
                fn from(value: $t) -> Self {
                    Arg::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_arg!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! saturating_integer_arg {
    ($($t:ty),*) => {
        $(
            impl<N> From<$t> for Arg<N> {
                /// Values beyond the `i64` range saturate.
                fn from(value: $t) -> Self {
                    let saturated = if value > 0 as $t { i64::MAX } else { i64::MIN };
                    Arg::Integer(i64::try_from(value).unwrap_or(saturated))
                }
            }
        )*
    };
}

saturating_integer_arg!(u64, u128, i128, usize, isize);

impl<N> From<f32> for Arg<N> {
    fn from(value: f32) -> Self {
        Arg::Float(f64::from(value))
    }
}

impl<N> From<f64> for Arg<N> {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

/// Named placeholder arguments, applied in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Args<N> {
    entries: Vec<(String, Arg<N>)>,
}

/// Arguments that never contain rich content.
pub type TextArgs = Args<Infallible>;

impl<N> Args<N> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add (or replace) a scalar or rich argument.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Arg<N>>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add (or replace) a rich-content argument.
    pub fn with_node(self, name: impl Into<String>, node: N) -> Self {
        self.with(name, Arg::Node(node))
    }

    /// Insert an argument. An existing argument of the same name keeps its
    /// position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Arg<N>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arg<N>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg<N>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N> Default for Args<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, K, V> FromIterator<(K, V)> for Args<N>
where
    K: Into<String>,
    V: Into<Arg<N>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// One element of a rich translation result.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<N> {
    Text(String),
    /// A rich argument with its key (`"<name>-<segment>-<occurrence>"`).
    Node { key: String, node: N },
}

/// Final output of a translation.
#[derive(Debug, Clone, PartialEq)]
pub enum Translated<N> {
    /// No rich content was inserted.
    Text(String),
    Segments(Vec<Segment<N>>),
}

impl<N> Translated<N> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Translated::Text(text) => Some(text),
            Translated::Segments(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Translated::Text(_))
    }

    pub fn into_segments(self) -> Vec<Segment<N>> {
        match self {
            Translated::Text(text) => vec![Segment::Text(text)],
            Translated::Segments(segments) => segments,
        }
    }
}

impl<N: fmt::Display> fmt::Display for Translated<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Translated::Text(text) => f.write_str(text),
            Translated::Segments(segments) => {
                for segment in segments {
                    match segment {
                        Segment::Text(text) => f.write_str(text)?,
                        Segment::Node { node, .. } => write!(f, "{}", node)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Look up the raw translation of `string`, falling back to `string` itself.
pub fn get_raw_translated_string<'a>(string: &'a str, file: Option<&'a LanguageFile>) -> &'a str {
    file.and_then(|file| file.get(string))
        .map(String::as_str)
        .unwrap_or(string)
}

fn apply_arg<N: Clone>(
    string: String,
    name: &str,
    replacement: &Arg<N>,
    key_prefix: usize,
) -> Vec<Segment<N>> {
    let placeholder = format!("{{{}}}", name);

    let node = match replacement {
        Arg::Node(node) => node,
        scalar => {
            let text = scalar.scalar_text().unwrap_or_default();
            return vec![Segment::Text(string.replace(&placeholder, &text))];
        }
    };

    let parts: Vec<&str> = string.split(placeholder.as_str()).collect();
    let last = parts.len() - 1;

    let mut segments = Vec::with_capacity(parts.len() * 2 - 1);
    for (index, part) in parts.into_iter().enumerate() {
        segments.push(Segment::Text(part.to_string()));
        if index != last {
            segments.push(Segment::Node {
                key: format!("{}-{}-{}", name, key_prefix, index),
                node: node.clone(),
            });
        }
    }
    segments
}

/// Substitute `args` into an already translated string.
pub fn apply_args<N: Clone>(raw: &str, args: &Args<N>) -> Translated<N> {
    let mut result = vec![Segment::Text(raw.to_string())];

    for (name, replacement) in args.iter() {
        result = result
            .into_iter()
            .enumerate()
            .flat_map(|(index, segment)| match segment {
                Segment::Text(text) => apply_arg(text, name, replacement, index),
                node @ Segment::Node { .. } => vec![node],
            })
            .collect();
    }

    if let [Segment::Text(text)] = result.as_mut_slice() {
        return Translated::Text(std::mem::take(text));
    }

    Translated::Segments(result)
}

/// Translate a phrase.
///
/// # Returns
/// * `None` if `string` is `None`
/// * the (possibly empty) string unchanged if it is empty
/// * otherwise the translation (or `string` itself when untranslated) with
///   `args` substituted
pub fn translate<N: Clone>(
    string: Option<&str>,
    file: Option<&LanguageFile>,
    args: Option<&Args<N>>,
) -> Option<Translated<N>> {
    let string = string?;

    if string.is_empty() {
        return Some(Translated::Text(String::new()));
    }

    let raw = get_raw_translated_string(string, file);

    match args {
        None => Some(Translated::Text(raw.to_string())),
        Some(args) => Some(apply_args(raw, args)),
    }
}
