//! Object stream support (PDF 1.5+, `/Type /ObjStm`).
//!
//! An object stream packs many small non-stream objects into one
//! compressed stream. The stream starts with `N` pairs of
//! `object-number offset` followed by the serialized objects at those
//! offsets relative to `/First`.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use crate::parser::Parser;
use std::collections::HashMap;

/// A decoded object stream, ready for per-slot extraction.
#[derive(Debug)]
pub struct ObjectStream {
    data: Vec<u8>,
    /// Slot index to `(object number, offset into data)`
    slots: Vec<(u32, usize)>,
}

impl ObjectStream {
    /// Decode and index an object stream.
    pub fn parse(dict: &Dict, raw: &[u8]) -> Result<Self> {
        if dict.get("Type").and_then(Object::as_name) != Some("ObjStm") {
            return Err(Error::InvalidObjectType {
                expected: "ObjStm".to_string(),
                found: dict
                    .get("Type")
                    .and_then(Object::as_name)
                    .unwrap_or("missing /Type")
                    .to_string(),
            });
        }
        let count = dict
            .get("N")
            .and_then(Object::as_integer)
            .ok_or_else(|| Error::InvalidPdf("object stream missing /N".to_string()))?;
        let first = dict
            .get("First")
            .and_then(Object::as_integer)
            .ok_or_else(|| Error::InvalidPdf("object stream missing /First".to_string()))?
            as usize;

        let data = crate::decoders::decode_stream(dict, raw)?;

        let mut slots = Vec::with_capacity(count as usize);
        let mut header = Parser::at(&data, 0);
        for _ in 0..count {
            let number = header
                .parse_object()?
                .as_integer()
                .ok_or_else(|| Error::InvalidPdf("object stream header not numeric".to_string()))?;
            let offset = header
                .parse_object()?
                .as_integer()
                .ok_or_else(|| Error::InvalidPdf("object stream header not numeric".to_string()))?;
            slots.push((number as u32, first + offset as usize));
        }

        Ok(Self { data, slots })
    }

    /// Number of objects in the stream.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the stream holds no objects.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Extract the object at `index`, verifying its object number.
    pub fn object_at(&self, index: usize) -> Result<(u32, Object)> {
        let &(number, offset) = self
            .slots
            .get(index)
            .ok_or_else(|| Error::InvalidPdf(format!("object stream has no slot {}", index)))?;
        if offset >= self.data.len() {
            return Err(Error::InvalidPdf(format!(
                "object stream slot {} points past payload",
                index
            )));
        }
        let object = Parser::at(&self.data, offset).parse_object()?;
        Ok((number, object))
    }

    /// Extract every object keyed by object number.
    pub fn all_objects(&self) -> Result<HashMap<u32, Object>> {
        let mut out = HashMap::with_capacity(self.slots.len());
        for index in 0..self.slots.len() {
            let (number, object) = self.object_at(index)?;
            out.insert(number, object);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Dict, Vec<u8>) {
        // Two objects: 11 << /A 1 >> and 12 [ 1 2 ]
        let payload = b"11 0 12 12 << /A 1 >> [ 1 2 ]";
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("ObjStm"));
        dict.insert("N".to_string(), Object::Integer(2));
        dict.insert("First".to_string(), Object::Integer(10));
        (dict, payload.to_vec())
    }

    #[test]
    fn test_parse_and_extract() {
        let (dict, raw) = sample();
        let stream = ObjectStream::parse(&dict, &raw).unwrap();
        assert_eq!(stream.len(), 2);

        let (number, obj) = stream.object_at(0).unwrap();
        assert_eq!(number, 11);
        assert_eq!(obj.as_dict().unwrap().get("A").unwrap().as_integer(), Some(1));

        let (number, obj) = stream.object_at(1).unwrap();
        assert_eq!(number, 12);
        assert_eq!(obj.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_all_objects() {
        let (dict, raw) = sample();
        let stream = ObjectStream::parse(&dict, &raw).unwrap();
        let map = stream.all_objects().unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&11));
        assert!(map.contains_key(&12));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("XObject"));
        assert!(ObjectStream::parse(&dict, b"").is_err());
    }

    #[test]
    fn test_bad_slot_rejected() {
        let (dict, raw) = sample();
        let stream = ObjectStream::parse(&dict, &raw).unwrap();
        assert!(stream.object_at(5).is_err());
    }
}
