//! Minimal Well-Known Text reader for CRS definitions.
//!
//! Reads both WKT1 (`GEOGCS[...]`, `PROJCS[...]`) and WKT2
//! (`GEOGCRS[...]`, `PROJCRS[...]`) into a generic keyword tree. Round and
//! square brackets are accepted interchangeably.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WktError {
    #[error("Unexpected end of WKT")]
    UnexpectedEnd,

    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Trailing content after WKT at offset {0}")]
    TrailingContent(usize),
}

/// `KEYWORD[value, value, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub values: Vec<WktValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WktValue {
    /// Quoted string with `""` escapes resolved.
    Text(String),
    /// Number or enumeration word, e.g. `6378137` or `NORTH`.
    Bare(String),
    Node(WktNode),
}

impl WktNode {
    pub fn parse(input: &str) -> Result<Self, WktError> {
        let mut reader = Reader {
            chars: input.char_indices().collect(),
            pos: 0,
        };
        reader.skip_whitespace();
        let node = reader.node()?;
        reader.skip_whitespace();
        match reader.peek() {
            None => Ok(node),
            Some((offset, _)) => Err(WktError::TrailingContent(offset)),
        }
    }

    /// Direct children with the given keyword (case-insensitive).
    pub fn children<'a, 'k>(&'a self, keyword: &'k str) -> impl Iterator<Item = &'a WktNode> + 'k
    where
        'a: 'k,
    {
        self.values.iter().filter_map(move |value| match value {
            WktValue::Node(node) if node.keyword.eq_ignore_ascii_case(keyword) => Some(node),
            _ => None,
        })
    }

    pub fn child(&self, keyword: &str) -> Option<&WktNode> {
        self.values.iter().find_map(|value| match value {
            WktValue::Node(node) if node.keyword.eq_ignore_ascii_case(keyword) => Some(node),
            _ => None,
        })
    }

    /// First quoted string value, usually the object's name.
    pub fn name(&self) -> Option<&str> {
        self.values.iter().find_map(|value| match value {
            WktValue::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// First bare value, e.g. the direction of an `AXIS`.
    pub fn first_bare(&self) -> Option<&str> {
        self.values.iter().find_map(|value| match value {
            WktValue::Bare(word) => Some(word.as_str()),
            _ => None,
        })
    }
}

struct Reader {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Reader {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> WktError {
        match self.peek() {
            Some((offset, found)) => WktError::UnexpectedChar { found, offset },
            None => WktError::UnexpectedEnd,
        }
    }

    fn keyword(&mut self) -> String {
        let mut keyword = String::new();
        while let Some((_, c)) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                keyword.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        keyword
    }

    fn node(&mut self) -> Result<WktNode, WktError> {
        let keyword = self.keyword();
        if keyword.is_empty() {
            return Err(self.unexpected());
        }
        self.skip_whitespace();
        let close = match self.peek() {
            Some((_, '[')) => ']',
            Some((_, '(')) => ')',
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;

        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some((_, c)) if c == close && values.is_empty() => {
                    self.pos += 1;
                    break;
                }
                None => return Err(WktError::UnexpectedEnd),
                _ => {}
            }
            values.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some((_, ',')) => self.pos += 1,
                Some((_, c)) if c == close => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        Ok(WktNode { keyword, values })
    }

    fn value(&mut self) -> Result<WktValue, WktError> {
        match self.peek() {
            Some((_, '"')) => self.quoted().map(WktValue::Text),
            Some((_, c)) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                let word = self.keyword();
                self.skip_whitespace();
                if matches!(self.peek(), Some((_, '[' | '('))) {
                    self.pos = start;
                    self.node().map(WktValue::Node)
                } else {
                    Ok(WktValue::Bare(word))
                }
            }
            Some(_) => {
                let mut word = String::new();
                while let Some((_, c)) = self.peek() {
                    if c == ',' || c == ']' || c == ')' || c.is_whitespace() {
                        break;
                    }
                    word.push(c);
                    self.pos += 1;
                }
                if word.is_empty() {
                    return Err(self.unexpected());
                }
                Ok(WktValue::Bare(word))
            }
            None => Err(WktError::UnexpectedEnd),
        }
    }

    fn quoted(&mut self) -> Result<String, WktError> {
        // Opening quote
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                Some((_, '"')) => {
                    self.pos += 1;
                    if matches!(self.peek(), Some((_, '"'))) {
                        text.push('"');
                        self.pos += 1;
                    } else {
                        return Ok(text);
                    }
                }
                Some((_, c)) => {
                    text.push(c);
                    self.pos += 1;
                }
                None => return Err(WktError::UnexpectedEnd),
            }
        }
    }
}
