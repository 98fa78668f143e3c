//! Incremental update writer.
//!
//! Appends updated objects plus a new cross-reference section to a copy of
//! the original file, so that readers see the rewritten objects while
//! every original byte stays untouched. A rollback is therefore a file
//! swap, never a byte surgery.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Dict, ObjRef, Object};
use std::collections::BTreeMap;
use std::path::Path;

/// Serializes objects into PDF syntax.
#[derive(Debug, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// New serializer with compact formatting.
    pub fn new() -> Self {
        Self
    }

    /// Serialize an object value.
    pub fn serialize(&self, object: &Object) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_object(&mut out, object);
        out
    }

    /// Serialize a full indirect object (`n g obj ... endobj`).
    pub fn serialize_indirect(&self, obj_ref: ObjRef, object: &Object) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("{} {} obj\n", obj_ref.number, obj_ref.generation).as_bytes());
        self.write_object(&mut out, object);
        out.extend_from_slice(b"\nendobj\n");
        out
    }

    fn write_object(&self, out: &mut Vec<u8>, object: &Object) {
        match object {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(true) => out.extend_from_slice(b"true"),
            Object::Boolean(false) => out.extend_from_slice(b"false"),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
            Object::String(bytes) => self.write_string(out, bytes),
            Object::Name(name) => self.write_name(out, name),
            Object::Reference(r) => {
                out.extend_from_slice(format!("{} {} R", r.number, r.generation).as_bytes())
            },
            Object::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    self.write_object(out, item);
                }
                out.push(b']');
            },
            Object::Dictionary(dict) => self.write_dict(out, dict),
            Object::Stream { dict, data } => {
                // /Length always reflects the payload actually written
                let mut dict = dict.clone();
                dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
                self.write_dict(out, &dict);
                out.extend_from_slice(b"\nstream\n");
                out.extend_from_slice(data);
                out.extend_from_slice(b"\nendstream");
            },
        }
    }

    fn write_dict(&self, out: &mut Vec<u8>, dict: &Dict) {
        // Deterministic key order keeps repeated applies byte-identical
        let mut keys: Vec<&String> = dict.keys().collect();
        keys.sort();
        out.extend_from_slice(b"<< ");
        for key in keys {
            self.write_name(out, key);
            out.push(b' ');
            self.write_object(out, &dict[key]);
            out.push(b' ');
        }
        out.extend_from_slice(b">>");
    }

    fn write_string(&self, out: &mut Vec<u8>, bytes: &[u8]) {
        out.push(b'(');
        for &b in bytes {
            match b {
                b'(' | b')' | b'\\' => {
                    out.push(b'\\');
                    out.push(b);
                },
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                0x00..=0x08 | 0x0B..=0x0C | 0x0E..=0x1F | 0x7F..=0xFF => {
                    out.extend_from_slice(format!("\\{:03o}", b).as_bytes());
                },
                _ => out.push(b),
            }
        }
        out.push(b')');
    }

    fn write_name(&self, out: &mut Vec<u8>, name: &str) {
        out.push(b'/');
        for &b in name.as_bytes() {
            if b.is_ascii_graphic()
                && !crate::lexer::is_delimiter(b)
                && b != b'#'
            {
                out.push(b);
            } else {
                out.extend_from_slice(format!("#{:02X}", b).as_bytes());
            }
        }
    }
}

/// Encrypt strings (and stream payloads) of an object that will be written
/// into an encrypted document.
fn encrypt_for_output(object: &mut Object, doc: &Document, obj_ref: ObjRef) -> Result<()> {
    let Some(handler) = doc.encryption() else {
        return Ok(());
    };
    fn walk(
        object: &mut Object,
        handler: &crate::encryption::EncryptionHandler,
        obj_ref: ObjRef,
    ) -> Result<()> {
        match object {
            Object::String(bytes) => {
                *bytes = handler.encrypt_string(bytes, obj_ref)?;
            },
            Object::Array(items) => {
                for item in items {
                    walk(item, handler, obj_ref)?;
                }
            },
            Object::Dictionary(dict) => {
                for value in dict.values_mut() {
                    walk(value, handler, obj_ref)?;
                }
            },
            Object::Stream { dict, data } => {
                for value in dict.values_mut() {
                    walk(value, handler, obj_ref)?;
                }
                *data = bytes::Bytes::from(handler.encrypt_string(data, obj_ref)?);
            },
            _ => {},
        }
        Ok(())
    }
    walk(object, handler, obj_ref)
}

/// Append an incremental update with the given objects to `out_path`.
///
/// The original bytes are copied verbatim; updated objects, a new xref
/// section and a trailer chained via `/Prev` follow. Opening the output
/// yields the updated objects and ignores the shadowed originals.
pub fn write_incremental(
    doc: &Document,
    updates: &BTreeMap<u32, (u16, Object)>,
    out_path: impl AsRef<Path>,
) -> Result<()> {
    if updates.is_empty() {
        // Nothing shadowed; the output is a plain copy
        std::fs::write(out_path.as_ref(), doc.buffer())?;
        return Ok(());
    }

    let serializer = ObjectSerializer::new();
    let mut out = doc.buffer().to_vec();
    if out.last() != Some(&b'\n') {
        out.push(b'\n');
    }

    // Body: updated objects, ascending object number
    let mut offsets: Vec<(u32, u16, u64)> = Vec::with_capacity(updates.len());
    for (&number, (generation, object)) in updates {
        let obj_ref = ObjRef::new(number, *generation);
        let mut object = object.clone();
        encrypt_for_output(&mut object, doc, obj_ref)?;
        offsets.push((number, *generation, out.len() as u64));
        out.extend_from_slice(&serializer.serialize_indirect(obj_ref, &object));
    }

    // Cross-reference section, contiguous runs grouped into subsections
    let xref_offset = out.len() as u64;
    out.extend_from_slice(b"xref\n");
    let mut i = 0usize;
    while i < offsets.len() {
        let run_start = i;
        while i + 1 < offsets.len() && offsets[i + 1].0 == offsets[i].0 + 1 {
            i += 1;
        }
        let first = offsets[run_start].0;
        let count = i - run_start + 1;
        out.extend_from_slice(format!("{} {}\n", first, count).as_bytes());
        for &(_, generation, offset) in &offsets[run_start..=i] {
            out.extend_from_slice(format!("{:010} {:05} n \n", offset, generation).as_bytes());
        }
        i += 1;
    }

    // Trailer carried over from the original, chained with /Prev
    let max_updated = offsets.iter().map(|&(n, _, _)| n).max().unwrap_or(0);
    let mut trailer = Dict::new();
    trailer.insert(
        "Size".to_string(),
        Object::Integer(doc.next_object_number().max(max_updated + 1) as i64),
    );
    trailer.insert("Prev".to_string(), Object::Integer(doc.startxref_offset() as i64));
    for key in ["Root", "Info", "ID", "Encrypt"] {
        if let Some(value) = doc.trailer().get(key) {
            trailer.insert(key.to_string(), value.clone());
        }
    }
    if !trailer.contains_key("Root") {
        return Err(Error::InvalidPdf("original trailer has no /Root".to_string()));
    }

    out.extend_from_slice(b"trailer\n");
    out.extend_from_slice(&serializer.serialize(&Object::Dictionary(trailer)));
    out.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());

    std::fs::write(out_path.as_ref(), &out)?;
    log::info!(
        "incremental update: {} object(s), {} bytes appended",
        updates.len(),
        out.len() - doc.buffer().len()
    );
    Ok(())
}

/// Format a real number the way PDF expects (no exponent notation).
fn format_real(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let mut s = format!("{:.6}", value);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}
