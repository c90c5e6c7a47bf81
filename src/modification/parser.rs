//! Parser for partial modification strings such as `"3(2,5);7(2)*"`: a `;` separated
//! list of `position(id,...)` entries terminated by `*`. Positions are 0-based.

use std::collections::HashSet;

use crate::chemistry::model::ModificationId;
use crate::errors::{AnnotateError, Result};
use crate::modification::model::PartialSiteDecl;

struct Cursor<'s> {
    input: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn new(input: &'s str) -> Cursor<'s> {
        Cursor { input, bytes: input.as_bytes(), pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, reason: impl Into<String>) -> AnnotateError {
        AnnotateError::modification_string(self.input, self.pos, reason)
    }

    fn expect(&mut self, token: u8, reason: &str) -> Result<()> {
        match self.peek() {
            Some(b) if b == token => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(reason)),
        }
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        if start == self.pos {
            return Err(self.error(format!("expected a numeric {}", what)));
        }

        self.input[start..self.pos].parse().map_err(|_| {
            AnnotateError::modification_string(self.input, start, format!("{} is out of range", what))
        })
    }
}

/// Parses a partial modification string. An empty string (or a lone `*`) declares
/// no partial modification at all.
pub fn parse_partial_modifications(input: &str) -> Result<Vec<PartialSiteDecl>> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return Ok(Vec::new());
    }

    let mut cursor = Cursor::new(input);
    let mut decls = Vec::new();
    let mut declared_positions = HashSet::new();

    loop {
        let position_offset = {
            cursor.skip_whitespace();
            cursor.pos
        };
        let position: usize = cursor.number("position")?;
        if !declared_positions.insert(position) {
            return Err(AnnotateError::modification_string(
                input,
                position_offset,
                format!("position {} is declared twice", position),
            ));
        }

        cursor.expect(b'(', "expected '(' after the position")?;

        let mut modification_ids = vec![cursor.number::<ModificationId>("modification id")?];
        loop {
            match cursor.peek() {
                Some(b',') => {
                    cursor.pos += 1;
                    modification_ids.push(cursor.number("modification id")?);
                }
                Some(b')') => {
                    cursor.pos += 1;
                    break;
                }
                _ => return Err(cursor.error("expected ',' or ')' after a modification id")),
            }
        }

        decls.push(PartialSiteDecl { position, modification_ids });

        match cursor.peek() {
            Some(b';') => cursor.pos += 1,
            Some(b'*') => {
                cursor.pos += 1;
                break;
            }
            None => return Err(cursor.error("unexpected end of input before '*'")),
            Some(_) => return Err(cursor.error("expected ';' or '*' after ')'")),
        }
    }

    if cursor.peek().is_some() {
        return Err(cursor.error("unexpected characters after '*'"));
    }

    Ok(decls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(input: &str) -> (usize, String) {
        match parse_partial_modifications(input) {
            Err(AnnotateError::InvalidModificationString { offset, reason, .. }) => (offset, reason),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn parses_several_sites() {
        let decls = parse_partial_modifications("3(2,5); 7(2)*").unwrap();
        assert_eq!(
            decls,
            vec![
                PartialSiteDecl { position: 3, modification_ids: vec![2, 5] },
                PartialSiteDecl { position: 7, modification_ids: vec![2] },
            ]
        );
    }

    #[test]
    fn empty_declarations() {
        assert!(parse_partial_modifications("").unwrap().is_empty());
        assert!(parse_partial_modifications("  * ").unwrap().is_empty());
    }

    #[test]
    fn grammar_violations() {
        assert_eq!(reason_of("x(1)*"), (0, "expected a numeric position".to_string()));
        assert_eq!(reason_of("1 2)*"), (2, "expected '(' after the position".to_string()));
        assert_eq!(reason_of("1(a)*"), (2, "expected a numeric modification id".to_string()));
        assert_eq!(reason_of("1(2;3)*"), (3, "expected ',' or ')' after a modification id".to_string()));
        assert_eq!(reason_of("1(2)"), (4, "unexpected end of input before '*'".to_string()));
        assert_eq!(reason_of("1(2)3(4)*"), (4, "expected ';' or '*' after ')'".to_string()));
        assert_eq!(reason_of("1(2)*;"), (5, "unexpected characters after '*'".to_string()));
        assert_eq!(reason_of("1(2);1(3)*"), (5, "position 1 is declared twice".to_string()));
    }

    #[test]
    fn oversized_numbers_are_reported() {
        let (offset, reason) = reason_of("1(99999999999)*");
        assert_eq!(offset, 2);
        assert_eq!(reason, "modification id is out of range");
    }
}
