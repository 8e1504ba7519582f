//! Parsers for the serialized tag-weight and genre columns.
//!
//! The tag column of the source TSV holds the textual rendering of a mapping,
//! e.g. `{'rock': 100, 'alternative rock': 66}`; the genre column holds a
//! sequence literal, e.g. `['Pop', 'Rock']`. Keys may be quoted with either
//! single or double quotes and may contain the other quote character.

use crate::dataset::TagMap;
use crate::error::{MirevalError, Result};

/// Parse a tag-weight mapping literal into a `TagMap`.
pub fn parse_tag_map(input: &str) -> Result<TagMap> {
    let mut scanner = Scanner::new(input);
    let mut tags = TagMap::new();

    scanner.skip_whitespace();
    scanner.expect('{')?;
    scanner.skip_whitespace();

    if scanner.peek() == Some('}') {
        scanner.bump();
        scanner.expect_end()?;
        return Ok(tags);
    }

    loop {
        let tag = scanner.quoted_string()?;
        scanner.skip_whitespace();
        scanner.expect(':')?;
        scanner.skip_whitespace();
        let weight = scanner.number()?;
        tags.insert(tag, weight);

        scanner.skip_whitespace();
        match scanner.bump() {
            Some(',') => scanner.skip_whitespace(),
            Some('}') => break,
            other => {
                return Err(scanner.error(format!(
                    "expected ',' or '}}' in tag mapping, found {:?}",
                    other
                )))
            }
        }
    }

    scanner.expect_end()?;
    Ok(tags)
}

/// Parse a sequence literal of strings (the genre column).
pub fn parse_string_list(input: &str) -> Result<Vec<String>> {
    let mut scanner = Scanner::new(input);
    let mut items = Vec::new();

    scanner.skip_whitespace();
    scanner.expect('[')?;
    scanner.skip_whitespace();

    if scanner.peek() == Some(']') {
        scanner.bump();
        scanner.expect_end()?;
        return Ok(items);
    }

    loop {
        items.push(scanner.quoted_string()?);
        scanner.skip_whitespace();
        match scanner.bump() {
            Some(',') => scanner.skip_whitespace(),
            Some(']') => break,
            other => {
                return Err(scanner.error(format!(
                    "expected ',' or ']' in genre list, found {:?}",
                    other
                )))
            }
        }
    }

    scanner.expect_end()?;
    Ok(items)
}

/// Character scanner over one literal.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            other => Err(self.error(format!("expected {:?}, found {:?}", expected, other))),
        }
    }

    /// Only trailing whitespace may remain once the literal closes.
    fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected trailing {:?}", c))),
        }
    }

    /// A string quoted with `'` or `"`, with backslash escapes.
    fn quoted_string(&mut self) -> Result<String> {
        let quote = match self.bump() {
            Some(c @ ('\'' | '"')) => c,
            other => return Err(self.error(format!("expected quoted string, found {:?}", other))),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("unterminated escape".to_string())),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string".to_string())),
            }
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map_err(|_| self.error(format!("invalid number {:?}", text)))
    }

    fn error(&self, message: String) -> MirevalError {
        MirevalError::Parse(format!("at offset {}: {}", self.pos, message))
    }
}
