use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// `Location` of a value within a JSON document, kept as a linked list
/// up the evaluation stack so that pushing a segment never allocates.
#[derive(Copy, Clone)]
pub enum Location<'a> {
    Root,
    Property(LocatedProperty<'a>),
    Item(LocatedItem<'a>),
}

/// `LocatedProperty` is a property located within a JSON document.
#[derive(Copy, Clone)]
pub struct LocatedProperty<'a> {
    pub parent: &'a Location<'a>,
    pub name: &'a str,
}

/// `LocatedItem` is an array item located within a JSON document.
#[derive(Copy, Clone)]
pub struct LocatedItem<'a> {
    pub parent: &'a Location<'a>,
    pub index: usize,
}

impl<'a> Location<'a> {
    pub fn push_prop(&'a self, name: &'a str) -> Location<'a> {
        Location::Property(LocatedProperty { parent: self, name })
    }

    pub fn push_item(&'a self, index: usize) -> Location<'a> {
        Location::Item(LocatedItem { parent: self, index })
    }

    /// Renders this location as a JSON Pointer ("" for the root).
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        self.write_pointer(&mut out);
        out
    }

    /// Index of the located value within its parent array, if that is
    /// what this location tail refers to.
    pub fn last_index(&self) -> Option<usize> {
        match self {
            Location::Item(item) => Some(item.index),
            _ => None,
        }
    }

    fn write_pointer(&self, out: &mut String) {
        match self {
            Location::Root => (),
            Location::Property(prop) => {
                prop.parent.write_pointer(out);
                out.push('/');
                for c in prop.name.chars() {
                    match c {
                        '~' => out.push_str("~0"),
                        '/' => out.push_str("~1"),
                        c => out.push(c),
                    }
                }
            }
            Location::Item(item) => {
                item.parent.write_pointer(out);
                out.push('/');
                out.push_str(&item.index.to_string());
            }
        }
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pointer())
    }
}

/// Token is a parsed token of a JSON pointer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Token {
    /// Integer index of a JSON array.
    /// If applied to a JSON object, the index also serves as a property name.
    Index(usize),
    /// JSON object property name without escaping. Never an integer.
    Property(String),
}

impl Token {
    fn from_str(s: &str) -> Self {
        if s.starts_with('+') || (s.starts_with('0') && s.len() > 1) {
            Token::Property(s.to_string())
        } else if let Ok(ind) = usize::from_str(s) {
            Token::Index(ind)
        } else {
            Token::Property(s.to_string())
        }
    }
}

/// Parses an encoded JSON Pointer into its tokens.
pub fn parse_pointer(s: &str) -> Vec<Token> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split('/')
        .skip(if s.starts_with('/') { 1 } else { 0 })
        .map(|t| Token::from_str(&t.replace("~1", "/").replace("~0", "~")))
        .collect()
}

/// Resolves each prefix of `ptr` within `root`, returning the visited
/// values from the root downward. Resolution stops at the first token
/// which doesn't exist in the document.
pub fn nodes_along<'v>(root: &'v Value, ptr: &str) -> Vec<&'v Value> {
    let mut out = vec![root];
    let mut node = root;

    for token in parse_pointer(ptr) {
        let next = match (&token, node) {
            (Token::Property(name), Value::Object(map)) => map.get(name),
            (Token::Index(ind), Value::Array(arr)) => arr.get(*ind),
            (Token::Index(ind), Value::Object(map)) => map.get(&ind.to_string()),
            _ => None,
        };
        match next {
            Some(next) => {
                out.push(next);
                node = next;
            }
            None => break,
        }
    }
    out
}
