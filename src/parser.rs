//! PDF object parser.
//!
//! Recursive-descent parser over [`crate::lexer`] tokens. Turns byte
//! ranges of the file into [`Object`] values, including indirect objects
//! with stream payloads (`n g obj ... stream ... endstream endobj`).

use crate::error::{Error, Result};
use crate::lexer::{lex_token, skip_ws, Token};
use crate::object::{Dict, ObjRef, Object};

/// Cursor-based parser over the whole file buffer.
///
/// The buffer is the complete file so that byte offsets from the
/// cross-reference table can be used directly.
pub struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Parser starting at a byte offset into `buf`.
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            pos: offset.min(buf.len()),
        }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn parse_failed(&self, reason: impl Into<String>) -> Error {
        Error::ParseError {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let input = &self.buf[self.pos..];
        match lex_token(input) {
            Ok((rest, token)) => {
                self.pos = self.buf.len() - rest.len();
                Ok(token)
            },
            Err(_) => Err(self.parse_failed("unrecognized token")),
        }
    }

    /// Parse one object value (not an indirect wrapper).
    pub fn parse_object(&mut self) -> Result<Object> {
        let token = self.next_token()?;
        self.object_from(token)
    }

    fn object_from(&mut self, token: Token) -> Result<Object> {
        match token {
            Token::Null => Ok(Object::Null),
            Token::True => Ok(Object::Boolean(true)),
            Token::False => Ok(Object::Boolean(false)),
            Token::Real(r) => Ok(Object::Real(r)),
            Token::String(s) => Ok(Object::String(s)),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::Integer(first) => self.integer_or_reference(first),
            Token::ArrayOpen => self.parse_array_body(),
            Token::DictOpen => {
                let dict = self.parse_dict_body()?;
                self.maybe_stream(dict)
            },
            other => Err(self.parse_failed(format!("unexpected token {:?}", other))),
        }
    }

    /// Disambiguate `42` from `42 0 R` with bounded lookahead.
    fn integer_or_reference(&mut self, first: i64) -> Result<Object> {
        let checkpoint = self.pos;
        if first >= 0 && first <= u32::MAX as i64 {
            if let Ok(Token::Integer(generation)) = self.next_token() {
                if (0..=u16::MAX as i64).contains(&generation)
                    && matches!(self.next_token(), Ok(Token::Ref))
                {
                    return Ok(Object::Reference(ObjRef::new(first as u32, generation as u16)));
                }
            }
        }
        self.pos = checkpoint;
        Ok(Object::Integer(first))
    }

    fn parse_array_body(&mut self) -> Result<Object> {
        let mut items = Vec::new();
        loop {
            let checkpoint = self.pos;
            match self.next_token()? {
                Token::ArrayClose => return Ok(Object::Array(items)),
                token => {
                    self.pos = checkpoint;
                    let _ = token;
                    items.push(self.parse_object()?);
                },
            }
        }
    }

    fn parse_dict_body(&mut self) -> Result<Dict> {
        let mut dict = Dict::new();
        loop {
            match self.next_token()? {
                Token::DictClose => return Ok(dict),
                Token::Name(key) => {
                    let value = self.parse_object()?;
                    dict.insert(key, value);
                },
                other => {
                    return Err(self.parse_failed(format!("expected name key, found {:?}", other)))
                },
            }
        }
    }

    /// After a dictionary, a `stream` keyword turns it into a stream object.
    fn maybe_stream(&mut self, dict: Dict) -> Result<Object> {
        let checkpoint = self.pos;
        match self.next_token() {
            Ok(Token::Stream) => {
                let data = self.read_stream_data(&dict)?;
                Ok(Object::Stream {
                    dict,
                    data: bytes::Bytes::from(data),
                })
            },
            _ => {
                self.pos = checkpoint;
                Ok(Object::Dictionary(dict))
            },
        }
    }

    /// Read raw stream bytes after the `stream` keyword.
    ///
    /// `/Length` is used when it is a direct integer and lands on an
    /// `endstream`; otherwise the payload is recovered by scanning, which
    /// also covers indirect `/Length` entries without a resolver.
    fn read_stream_data(&mut self, dict: &Dict) -> Result<Vec<u8>> {
        // Exactly one EOL marker follows the keyword (Section 7.3.8.1)
        if self.buf.get(self.pos) == Some(&b'\r') {
            self.pos += 1;
        }
        if self.buf.get(self.pos) == Some(&b'\n') {
            self.pos += 1;
        }
        let start = self.pos;

        if let Some(len) = dict.get("Length").and_then(Object::as_integer) {
            let len = len.max(0) as usize;
            let end = start.checked_add(len).unwrap_or(self.buf.len());
            if end <= self.buf.len() {
                let after = skip_ws(&self.buf[end..]);
                if after.starts_with(b"endstream") {
                    self.pos = self.buf.len() - after.len() + b"endstream".len();
                    self.finish_stream()?;
                    return Ok(self.buf[start..end].to_vec());
                }
            }
            log::debug!("stream /Length {} does not land on endstream, rescanning", len);
        }

        // Fallback: locate the closing keyword by scanning
        let tail = &self.buf[start..];
        let found = find_subsequence(tail, b"endstream")
            .ok_or_else(|| self.parse_failed("unterminated stream"))?;
        let mut end = start + found;
        // Strip the EOL that precedes endstream
        if end > start && self.buf[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && self.buf[end - 1] == b'\r' {
            end -= 1;
        }
        self.pos = start + found + b"endstream".len();
        self.finish_stream()?;
        Ok(self.buf[start..end].to_vec())
    }

    /// Consume the trailing `endobj`, tolerating its absence.
    fn finish_stream(&mut self) -> Result<()> {
        let checkpoint = self.pos;
        if !matches!(self.next_token(), Ok(Token::EndObj)) {
            self.pos = checkpoint;
        }
        Ok(())
    }

    /// Parse an indirect object: `n g obj <object> endobj`.
    pub fn parse_indirect(&mut self) -> Result<(ObjRef, Object)> {
        let number = match self.next_token()? {
            Token::Integer(n) if (0..=u32::MAX as i64).contains(&n) => n as u32,
            other => {
                return Err(self.parse_failed(format!("expected object number, found {:?}", other)))
            },
        };
        let generation = match self.next_token()? {
            Token::Integer(g) if (0..=u16::MAX as i64).contains(&g) => g as u16,
            other => {
                return Err(self.parse_failed(format!("expected generation, found {:?}", other)))
            },
        };
        if !matches!(self.next_token()?, Token::Obj) {
            return Err(self.parse_failed("expected 'obj' keyword"));
        }
        let object = self.parse_object()?;
        // Streams already consumed their endobj; plain objects have it next
        let checkpoint = self.pos;
        if !matches!(self.next_token(), Ok(Token::EndObj)) {
            self.pos = checkpoint;
        }
        Ok((ObjRef::new(number, generation), object))
    }
}

/// Parse the indirect object that starts at `offset`.
pub fn parse_indirect_at(buf: &[u8], offset: usize) -> Result<(ObjRef, Object)> {
    Parser::at(buf, offset).parse_indirect()
}

/// Parse a bare object value that starts at `offset`.
pub fn parse_object_at(buf: &[u8], offset: usize) -> Result<Object> {
    Parser::at(buf, offset).parse_object()
}

/// First position of `needle` inside `haystack`.
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(bytes: &[u8]) -> Object {
        parse_object_at(bytes, 0).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(value(b"42 "), Object::Integer(42));
        assert_eq!(value(b"-1.5 "), Object::Real(-1.5));
        assert_eq!(value(b"true "), Object::Boolean(true));
        assert_eq!(value(b"null "), Object::Null);
        assert_eq!(value(b"/Type "), Object::name("Type"));
        assert_eq!(value(b"(abc) "), Object::String(b"abc".to_vec()));
    }

    #[test]
    fn test_reference_lookahead() {
        assert_eq!(value(b"10 0 R "), Object::Reference(ObjRef::new(10, 0)));
        // Two integers not followed by R stay two objects
        let mut parser = Parser::at(b"10 20 30", 0);
        assert_eq!(parser.parse_object().unwrap(), Object::Integer(10));
        assert_eq!(parser.parse_object().unwrap(), Object::Integer(20));
    }

    #[test]
    fn test_array() {
        let obj = value(b"[1 2 /A (x) [3]] ");
        let items = obj.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[2], Object::name("A"));
        assert_eq!(items[4].as_array().unwrap()[0], Object::Integer(3));
    }

    #[test]
    fn test_dictionary() {
        let obj = value(b"<< /Type /Page /Count 3 /Kids [1 0 R] >> ");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Type").unwrap().as_name(), Some("Page"));
        assert_eq!(dict.get("Count").unwrap().as_integer(), Some(3));
        assert_eq!(
            dict.get("Kids").unwrap().as_array().unwrap()[0],
            Object::Reference(ObjRef::new(1, 0))
        );
    }

    #[test]
    fn test_indirect_object() {
        let (obj_ref, obj) = parse_indirect_at(b"7 0 obj << /A 1 >> endobj", 0).unwrap();
        assert_eq!(obj_ref, ObjRef::new(7, 0));
        assert_eq!(obj.as_dict().unwrap().get("A").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn test_stream_with_length() {
        let bytes = b"5 0 obj << /Length 5 >>\nstream\nHello\nendstream\nendobj";
        let (obj_ref, obj) = parse_indirect_at(bytes, 0).unwrap();
        assert_eq!(obj_ref.number, 5);
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"Hello"),
            other => panic!("expected stream, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_stream_with_wrong_length_rescans() {
        let bytes = b"5 0 obj << /Length 999 >>\nstream\nHello\nendstream\nendobj";
        let (_, obj) = parse_indirect_at(bytes, 0).unwrap();
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"Hello"),
            other => panic!("expected stream, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let bytes = b"5 0 obj << /Length 6 0 R >>\nstream\nabc\nendstream\nendobj";
        let (_, obj) = parse_indirect_at(bytes, 0).unwrap();
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"abc"),
            other => panic!("expected stream, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_parse_error_reports_offset() {
        let result = parse_object_at(b"    garbage", 0);
        match result {
            Err(Error::ParseError { offset, .. }) => assert_eq!(offset, 0),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
