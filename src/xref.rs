//! Cross-reference parsing.
//!
//! The cross-reference table maps object numbers to byte offsets (or to a
//! slot in an object stream) and is the entry point for random access into
//! the file. Both the traditional table format (`xref` / `trailer`) and
//! cross-reference streams (PDF 1.5+, `/Type /XRef`) are supported, as are
//! hybrid files carrying `/XRefStm` and incremental updates chained via
//! `/Prev`.

use crate::error::{Error, Result};
use crate::lexer::{is_whitespace, skip_ws};
use crate::object::{Dict, Object};
use crate::parser::{find_subsequence, parse_indirect_at, Parser};
use std::collections::{HashMap, HashSet};

/// Where an object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Free slot; `next` is the next free object number
    Free {
        /// Next free object number
        next: u32,
        /// Generation to use if the slot is reused
        generation: u16,
    },
    /// Uncompressed object at a byte offset in the file
    InFile {
        /// Byte offset of `n g obj`
        offset: u64,
        /// Generation number
        generation: u16,
    },
    /// Compressed object stored inside an object stream
    InStream {
        /// Object number of the containing stream
        stream_number: u32,
        /// Index of the object within the stream
        index: u32,
    },
}

/// Merged cross-reference table for the whole update chain.
///
/// Entries from newer sections shadow older ones, which is how incremental
/// updates replace objects without rewriting the original bytes.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    entries: HashMap<u32, XrefEntry>,
}

impl XrefTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object number.
    pub fn get(&self, number: u32) -> Option<XrefEntry> {
        self.entries.get(&number).copied()
    }

    /// Insert an entry unless a newer section already provided one.
    pub fn insert_if_absent(&mut self, number: u32, entry: XrefEntry) {
        self.entries.entry(number).or_insert(entry);
    }

    /// All known object numbers, unordered.
    pub fn object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Find the `startxref` offset near the end of the file.
pub fn locate_startxref(buf: &[u8]) -> Result<u64> {
    let window_start = buf.len().saturating_sub(2048);
    let window = &buf[window_start..];
    let keyword_pos = rfind_subsequence(window, b"startxref")
        .ok_or_else(|| Error::InvalidXref("startxref not found".to_string()))?;
    let after = skip_ws(&window[keyword_pos + b"startxref".len()..]);
    let digits: Vec<u8> = after
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .copied()
        .collect();
    if digits.is_empty() {
        return Err(Error::InvalidXref("startxref has no offset".to_string()));
    }
    std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::InvalidXref("startxref offset unreadable".to_string()))
}

/// Read the full cross-reference chain starting from `startxref`.
///
/// Returns the merged table and the newest trailer dictionary.
pub fn read_xref_chain(buf: &[u8]) -> Result<(XrefTable, Dict)> {
    let mut table = XrefTable::new();
    let mut trailer: Option<Dict> = None;
    let mut visited: HashSet<u64> = HashSet::new();
    let mut pending: Vec<u64> = vec![locate_startxref(buf)?];

    while let Some(offset) = pending.pop() {
        if !visited.insert(offset) {
            log::warn!("xref chain loops back to offset {}, stopping", offset);
            continue;
        }
        if offset as usize >= buf.len() {
            return Err(Error::InvalidXref(format!("xref offset {} past end of file", offset)));
        }

        let mut section = XrefTable::new();
        let section_trailer = if skip_ws(&buf[offset as usize..]).starts_with(b"xref") {
            read_table_section(buf, offset as usize, &mut section)?
        } else {
            read_stream_section(buf, offset as usize, &mut section)?
        };

        // Hybrid-reference files: the table trailer points at a parallel
        // xref stream whose entries take precedence over the table's own
        // free markers, so it merges first
        if let Some(stm) = section_trailer.get("XRefStm").and_then(Object::as_integer) {
            if (stm as u64) < buf.len() as u64 && visited.insert(stm as u64) {
                let _ = read_stream_section(buf, stm as usize, &mut table);
            }
        }
        for (number, entry) in section.entries {
            table.insert_if_absent(number, entry);
        }
        if let Some(prev) = section_trailer.get("Prev").and_then(Object::as_integer) {
            pending.push(prev as u64);
        }
        if trailer.is_none() {
            trailer = Some(section_trailer);
        }
    }

    let trailer = trailer.ok_or_else(|| Error::InvalidXref("no trailer found".to_string()))?;
    Ok((table, trailer))
}

/// Parse a traditional `xref` section and its `trailer` dictionary.
fn read_table_section(buf: &[u8], offset: usize, table: &mut XrefTable) -> Result<Dict> {
    let mut cursor = Cursor::new(buf, offset);
    cursor.expect_keyword(b"xref")?;

    loop {
        if cursor.peek_keyword(b"trailer") {
            cursor.expect_keyword(b"trailer")?;
            break;
        }
        let start = cursor.read_u64()? as u32;
        let count = cursor.read_u64()?;
        for i in 0..count {
            let number = start + i as u32;
            let field1 = cursor.read_u64()?;
            let field2 = cursor.read_u64()? as u16;
            let kind = cursor.read_flag()?;
            let entry = match kind {
                b'n' => XrefEntry::InFile {
                    offset: field1,
                    generation: field2,
                },
                b'f' => XrefEntry::Free {
                    next: field1 as u32,
                    generation: field2,
                },
                other => {
                    return Err(Error::InvalidXref(format!(
                        "unexpected entry flag '{}'",
                        other as char
                    )))
                },
            };
            table.insert_if_absent(number, entry);
        }
    }

    let trailer = Parser::at(buf, cursor.pos()).parse_object()?;
    match trailer {
        Object::Dictionary(dict) => Ok(dict),
        other => Err(Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// Parse a cross-reference stream (`/Type /XRef`).
fn read_stream_section(buf: &[u8], offset: usize, table: &mut XrefTable) -> Result<Dict> {
    let (_, object) = parse_indirect_at(buf, offset)?;
    let (dict, raw) = match object {
        Object::Stream { dict, data } => (dict, data),
        other => {
            return Err(Error::InvalidObjectType {
                expected: "XRef stream".to_string(),
                found: other.type_name().to_string(),
            })
        },
    };
    if dict.get("Type").and_then(Object::as_name) != Some("XRef") {
        return Err(Error::InvalidXref("stream at xref offset is not /Type /XRef".to_string()));
    }

    let data = crate::decoders::decode_stream(&dict, &raw)?;

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(Object::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Object::as_integer)
                .map(|w| w.max(0) as usize)
                .collect()
        })
        .ok_or_else(|| Error::InvalidXref("xref stream missing /W".to_string()))?;
    if widths.len() != 3 {
        return Err(Error::InvalidXref(format!("/W has {} entries, expected 3", widths.len())));
    }
    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(Error::InvalidXref("/W is all zeros".to_string()));
    }

    let size = dict
        .get("Size")
        .and_then(Object::as_integer)
        .ok_or_else(|| Error::InvalidXref("xref stream missing /Size".to_string()))?;
    let index_pairs: Vec<(u32, u64)> = match dict.get("Index").and_then(Object::as_array) {
        Some(arr) => arr
            .chunks_exact(2)
            .filter_map(|pair| {
                Some((pair[0].as_integer()? as u32, pair[1].as_integer()? as u64))
            })
            .collect(),
        None => vec![(0, size as u64)],
    };

    let mut rows = data.chunks_exact(row_len);
    for (start, count) in index_pairs {
        for i in 0..count {
            let number = start + i as u32;
            let Some(row) = rows.next() else {
                log::warn!("xref stream shorter than /Index promises, truncating");
                return Ok(dict);
            };
            let mut pos = 0usize;
            // A zero-width first field defaults the entry type to 1
            let kind = if widths[0] == 0 {
                1
            } else {
                read_be(&row[pos..pos + widths[0]])
            };
            pos += widths[0];
            let field2 = read_be(&row[pos..pos + widths[1]]);
            pos += widths[1];
            let field3 = read_be(&row[pos..pos + widths[2]]);

            let entry = match kind {
                0 => XrefEntry::Free {
                    next: field2 as u32,
                    generation: field3 as u16,
                },
                1 => XrefEntry::InFile {
                    offset: field2,
                    generation: field3 as u16,
                },
                2 => XrefEntry::InStream {
                    stream_number: field2 as u32,
                    index: field3 as u32,
                },
                other => {
                    log::warn!("unknown xref entry type {} for object {}", other, number);
                    continue;
                },
            };
            table.insert_if_absent(number, entry);
        }
    }

    Ok(dict)
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Last position of `needle` inside `haystack`.
fn rfind_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// Whitespace-token cursor for the textual xref table format.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn skip_ws(&mut self) {
        while self.buf.get(self.pos).map(|&b| is_whitespace(b)).unwrap_or(false) {
            self.pos += 1;
        }
    }

    fn peek_keyword(&mut self, word: &[u8]) -> bool {
        self.skip_ws();
        self.buf[self.pos..].starts_with(word)
    }

    fn expect_keyword(&mut self, word: &[u8]) -> Result<()> {
        self.skip_ws();
        if self.buf[self.pos..].starts_with(word) {
            self.pos += word.len();
            Ok(())
        } else {
            Err(Error::InvalidXref(format!(
                "expected '{}' at offset {}",
                String::from_utf8_lossy(word),
                self.pos
            )))
        }
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.skip_ws();
        let start = self.pos;
        while self.buf.get(self.pos).map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::InvalidXref(format!("expected number at offset {}", start)));
        }
        std::str::from_utf8(&self.buf[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::InvalidXref("unreadable number".to_string()))
    }

    fn read_flag(&mut self) -> Result<u8> {
        self.skip_ws();
        let flag = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| Error::InvalidXref("truncated xref entry".to_string()))?;
        self.pos += 1;
        Ok(flag)
    }
}

/// Offset of the newest xref section, for use as `/Prev` in an
/// incremental update.
pub fn newest_section_offset(buf: &[u8]) -> Result<u64> {
    locate_startxref(buf)
}

/// True if the buffer ends with a well-formed `%%EOF` marker region.
pub fn has_eof_marker(buf: &[u8]) -> bool {
    let tail = &buf[buf.len().saturating_sub(64)..];
    find_subsequence(tail, b"%%EOF").is_some()
}
