//! PDF tokenizer.
//!
//! Splits a raw byte slice into the atomic tokens of PDF syntax
//! (ISO 32000-1:2008, Section 7.2): numbers, strings, names, keywords
//! and structural delimiters. The parser combines tokens into objects.
//!
//! Escape sequences in literal strings and `#xx` sequences in names are
//! decoded here, so the parser only ever sees finished byte strings.

use nom::error::{Error as NomError, ErrorKind};
use nom::IResult;

/// A single PDF token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// String contents with escapes / hex pairs already decoded
    String(Vec<u8>),
    /// Name without the leading slash, `#xx` decoded
    Name(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// `<<`
    DictOpen,
    /// `>>`
    DictClose,
    /// `obj`
    Obj,
    /// `endobj`
    EndObj,
    /// `stream`
    Stream,
    /// `endstream`
    EndStream,
    /// `R`
    Ref,
}

/// PDF whitespace characters (Section 7.2.2).
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters (Section 7.2.2).
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Skip whitespace and `%` comments.
pub fn skip_ws(mut input: &[u8]) -> &[u8] {
    loop {
        while let Some(&b) = input.first() {
            if is_whitespace(b) {
                input = &input[1..];
            } else {
                break;
            }
        }
        if input.first() == Some(&b'%') {
            while let Some(&b) = input.first() {
                input = &input[1..];
                if b == b'\r' || b == b'\n' {
                    break;
                }
            }
        } else {
            return input;
        }
    }
}

fn err(input: &[u8]) -> nom::Err<NomError<&[u8]>> {
    nom::Err::Error(NomError::new(input, ErrorKind::Tag))
}

/// Lex one token, skipping leading whitespace and comments.
pub fn lex_token(input: &[u8]) -> IResult<&[u8], Token> {
    let input = skip_ws(input);
    let first = *input.first().ok_or_else(|| err(input))?;

    match first {
        b'[' => Ok((&input[1..], Token::ArrayOpen)),
        b']' => Ok((&input[1..], Token::ArrayClose)),
        b'<' if input.get(1) == Some(&b'<') => Ok((&input[2..], Token::DictOpen)),
        b'>' if input.get(1) == Some(&b'>') => Ok((&input[2..], Token::DictClose)),
        b'<' => hex_string(input),
        b'(' => literal_string(input),
        b'/' => name(input),
        b'+' | b'-' | b'.' | b'0'..=b'9' => number(input),
        _ => keyword(input),
    }
}

/// Literal string: `( ... )` with balanced parentheses and escapes.
fn literal_string(input: &[u8]) -> IResult<&[u8], Token> {
    debug_assert_eq!(input.first(), Some(&b'('));
    let mut out = Vec::new();
    let mut depth = 1usize;
    let mut i = 1usize;

    while i < input.len() {
        let b = input[i];
        match b {
            b'\\' => {
                i += 1;
                let Some(&esc) = input.get(i) else {
                    return Err(err(input));
                };
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'(' => out.push(b'('),
                    b')' => out.push(b')'),
                    b'\\' => out.push(b'\\'),
                    b'\r' => {
                        // Line continuation: \<CR>[<LF>] produces nothing
                        if input.get(i + 1) == Some(&b'\n') {
                            i += 1;
                        }
                    },
                    b'\n' => {},
                    b'0'..=b'7' => {
                        // Up to three octal digits
                        let mut value = (esc - b'0') as u32;
                        for _ in 0..2 {
                            match input.get(i + 1) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + (d - b'0') as u32;
                                    i += 1;
                                },
                                _ => break,
                            }
                        }
                        out.push(value as u8);
                    },
                    other => out.push(other),
                }
                i += 1;
            },
            b'(' => {
                depth += 1;
                out.push(b);
                i += 1;
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], Token::String(out)));
                }
                out.push(b);
                i += 1;
            },
            _ => {
                out.push(b);
                i += 1;
            },
        }
    }
    Err(err(input))
}

/// Hex string: `< 48 65 ... >`, whitespace allowed, odd digit padded with 0.
fn hex_string(input: &[u8]) -> IResult<&[u8], Token> {
    debug_assert_eq!(input.first(), Some(&b'<'));
    let mut out = Vec::new();
    let mut nibble: Option<u8> = None;

    for (i, &b) in input.iter().enumerate().skip(1) {
        if b == b'>' {
            if let Some(high) = nibble {
                out.push(high << 4);
            }
            return Ok((&input[i + 1..], Token::String(out)));
        }
        if is_whitespace(b) {
            continue;
        }
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(err(input)),
        };
        match nibble.take() {
            Some(high) => out.push((high << 4) | digit),
            None => nibble = Some(digit),
        }
    }
    Err(err(input))
}

/// Name: `/` followed by regular characters, `#xx` decoded.
fn name(input: &[u8]) -> IResult<&[u8], Token> {
    debug_assert_eq!(input.first(), Some(&b'/'));
    let mut out = String::new();
    let mut i = 1usize;

    while i < input.len() {
        let b = input[i];
        if is_whitespace(b) || is_delimiter(b) {
            break;
        }
        if b == b'#' {
            let hex = input.get(i + 1..i + 3).ok_or_else(|| err(input))?;
            let high = hex_digit(hex[0]).ok_or_else(|| err(input))?;
            let low = hex_digit(hex[1]).ok_or_else(|| err(input))?;
            out.push(((high << 4) | low) as char);
            i += 3;
        } else {
            out.push(b as char);
            i += 1;
        }
    }
    Ok((&input[i..], Token::Name(out)))
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Integer or real number.
fn number(input: &[u8]) -> IResult<&[u8], Token> {
    let mut i = 0usize;
    if matches!(input.first(), Some(&b'+') | Some(&b'-')) {
        i += 1;
    }
    let mut has_digits = false;
    let mut is_real = false;
    while let Some(&b) = input.get(i) {
        match b {
            b'0'..=b'9' => {
                has_digits = true;
                i += 1;
            },
            b'.' if !is_real => {
                is_real = true;
                i += 1;
            },
            _ => break,
        }
    }
    if !has_digits {
        return Err(err(input));
    }
    let text = std::str::from_utf8(&input[..i]).map_err(|_| err(input))?;
    let token = if is_real {
        Token::Real(text.parse::<f64>().map_err(|_| err(input))?)
    } else {
        match text.parse::<i64>() {
            Ok(v) => Token::Integer(v),
            // Out-of-range integers degrade to reals, as some writers emit them
            Err(_) => Token::Real(text.parse::<f64>().map_err(|_| err(input))?),
        }
    };
    Ok((&input[i..], token))
}

/// Bare keyword: `obj`, `endobj`, `stream`, `endstream`, `R`, `true`, ...
fn keyword(input: &[u8]) -> IResult<&[u8], Token> {
    let end = input
        .iter()
        .position(|&b| is_whitespace(b) || is_delimiter(b))
        .unwrap_or(input.len());
    let word = &input[..end];
    let rest = &input[end..];
    match word {
        b"obj" => Ok((rest, Token::Obj)),
        b"endobj" => Ok((rest, Token::EndObj)),
        b"stream" => Ok((rest, Token::Stream)),
        b"endstream" => Ok((rest, Token::EndStream)),
        b"R" => Ok((rest, Token::Ref)),
        b"true" => Ok((rest, Token::True)),
        b"false" => Ok((rest, Token::False)),
        b"null" => Ok((rest, Token::Null)),
        _ => Err(err(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(input: &[u8]) -> Token {
        lex_token(input).unwrap().1
    }

    #[test]
    fn test_numbers() {
        assert_eq!(one(b"42 "), Token::Integer(42));
        assert_eq!(one(b"-17 "), Token::Integer(-17));
        assert_eq!(one(b"3.5 "), Token::Real(3.5));
        assert_eq!(one(b".5 "), Token::Real(0.5));
        assert_eq!(one(b"-.25 "), Token::Real(-0.25));
    }

    #[test]
    fn test_names() {
        assert_eq!(one(b"/Type "), Token::Name("Type".to_string()));
        assert_eq!(one(b"/A#20B "), Token::Name("A B".to_string()));
        assert_eq!(one(b"/Fields["), Token::Name("Fields".to_string()));
    }

    #[test]
    fn test_literal_strings() {
        assert_eq!(one(b"(Hello) "), Token::String(b"Hello".to_vec()));
        assert_eq!(one(b"(a(b)c) "), Token::String(b"a(b)c".to_vec()));
        assert_eq!(one(br"(a\(b) "), Token::String(b"a(b".to_vec()));
        assert_eq!(one(br"(\101) "), Token::String(b"A".to_vec()));
        assert_eq!(one(b"(line\\nbreak) "), Token::String(b"line\nbreak".to_vec()));
    }

    #[test]
    fn test_hex_strings() {
        assert_eq!(one(b"<48656C6C6F> "), Token::String(b"Hello".to_vec()));
        assert_eq!(one(b"<48 65 6C> "), Token::String(b"Hel".to_vec()));
        // Odd digit count pads a trailing zero
        assert_eq!(one(b"<484> "), Token::String(vec![0x48, 0x40]));
    }

    #[test]
    fn test_delimiters_and_keywords() {
        assert_eq!(one(b"[1 2]"), Token::ArrayOpen);
        assert_eq!(one(b"<< /A 1 >>"), Token::DictOpen);
        assert_eq!(one(b">> "), Token::DictClose);
        assert_eq!(one(b"obj\n"), Token::Obj);
        assert_eq!(one(b"endstream\n"), Token::EndStream);
        assert_eq!(one(b"R "), Token::Ref);
        assert_eq!(one(b"true "), Token::True);
        assert_eq!(one(b"null]"), Token::Null);
    }

    #[test]
    fn test_skip_ws_and_comments() {
        let rest = skip_ws(b"  % comment\n  42");
        assert_eq!(rest, b"42");
        assert_eq!(one(b"% note\n 7 "), Token::Integer(7));
    }

    #[test]
    fn test_unknown_keyword_is_error() {
        assert!(lex_token(b"bogus ").is_err());
    }
}
