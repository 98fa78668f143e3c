//! PDF object types.
//!
//! Everything a PDF file contains is one of the eight basic object types
//! below (ISO 32000-1:2008, Section 7.3). Indirect references are modeled
//! as a ninth variant and resolved on demand by [`crate::document::Document`].

use std::collections::HashMap;

/// A PDF dictionary: name keys (without the leading `/`) to objects.
pub type Dict = HashMap<String, Object>;

/// A typed PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (raw bytes; text decoding is the caller's concern)
    String(Vec<u8>),
    /// Name (without the leading `/`)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary
    Dictionary(Dict),
    /// Stream: dictionary plus raw (still encoded) payload
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Raw stream bytes as they appear in the file
        data: bytes::Bytes,
    },
    /// Indirect object reference (`n g R`)
    Reference(ObjRef),
}

/// Identity of an indirect object: `(object number, generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ObjRef {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjRef {
    /// Create a reference.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

impl Object {
    /// Shorthand for a name object.
    pub fn name(s: impl Into<String>) -> Self {
        Object::Name(s.into())
    }

    /// Shorthand for a string object from text.
    pub fn text(s: impl AsRef<str>) -> Self {
        Object::String(s.as_ref().as_bytes().to_vec())
    }

    /// Human-readable type name, without data.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an Integer or Real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Cast to string bytes.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Cast to array.
    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Cast to dictionary. Stream objects expose their stream dictionary.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Mutable dictionary access, for in-place edits before rewriting.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Cast to reference.
    pub fn as_reference(&self) -> Option<ObjRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Check for null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Decode a text string per ISO 32000-1:2008, Section 7.9.2.2.
    ///
    /// UTF-16BE with BOM, or PDFDocEncoding treated as Latin-1 otherwise.
    /// Returns `None` for non-string objects.
    pub fn as_text(&self) -> Option<String> {
        let bytes = self.as_string()?;
        Some(decode_text_string(bytes))
    }
}

/// Decode PDF text-string bytes into a Rust string.
///
/// A leading 0xFE 0xFF marks UTF-16BE; everything else is treated as
/// PDFDocEncoding, which is close enough to Latin-1 for field titles.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Object::Null.type_name(), "Null");
        assert_eq!(Object::Integer(1).type_name(), "Integer");
        assert_eq!(Object::name("T").type_name(), "Name");
    }

    #[test]
    fn test_casts() {
        assert_eq!(Object::Integer(42).as_integer(), Some(42));
        assert_eq!(Object::Real(1.5).as_number(), Some(1.5));
        assert_eq!(Object::Integer(2).as_number(), Some(2.0));
        assert_eq!(Object::name("Page").as_name(), Some("Page"));
        assert_eq!(Object::Boolean(true).as_bool(), Some(true));
        assert!(Object::Null.is_null());
        assert!(Object::Integer(0).as_name().is_none());
    }

    #[test]
    fn test_stream_exposes_dict() {
        let mut dict = Dict::new();
        dict.insert("Length".to_string(), Object::Integer(3));
        let obj = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"abc"),
        };
        assert_eq!(obj.as_dict().unwrap().get("Length").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn test_obj_ref_display_and_hash() {
        use std::collections::HashSet;
        let r = ObjRef::new(10, 0);
        assert_eq!(format!("{}", r), "10 0 R");
        let mut set = HashSet::new();
        set.insert(ObjRef::new(1, 0));
        set.insert(ObjRef::new(1, 0));
        set.insert(ObjRef::new(2, 0));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_decode_text_string_utf16() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_text_string(&bytes), "Hi");
    }

    #[test]
    fn test_decode_text_string_latin() {
        assert_eq!(decode_text_string(b"Name:"), "Name:");
    }

    #[test]
    fn test_as_text() {
        let obj = Object::text("owner");
        assert_eq!(obj.as_text().as_deref(), Some("owner"));
        assert!(Object::Integer(1).as_text().is_none());
    }
}
