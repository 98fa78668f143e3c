//! Document access layer.
//!
//! [`Document`] owns the file bytes and presents the PDF as a graph of
//! typed objects addressable by [`ObjRef`]. Objects are parsed lazily from
//! cross-reference offsets, pulled out of object streams when needed,
//! decrypted transparently, and cached by object number.
//!
//! The whole file is read into memory up front; this is the only blocking
//! read in the pipeline and it keeps every later offset lookup a slice
//! index.

use crate::encryption::EncryptionHandler;
use crate::error::{Error, Result};
use crate::object::{Dict, ObjRef, Object};
use crate::objstm::ObjectStream;
use crate::parser::parse_indirect_at;
use crate::xref::{read_xref_chain, XrefEntry, XrefTable};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A parsed PDF document.
pub struct Document {
    buf: Vec<u8>,
    version: (u8, u8),
    xref: XrefTable,
    trailer: Dict,
    startxref: u64,
    encryption: Option<EncryptionHandler>,
    cache: RefCell<HashMap<u32, Object>>,
    loading: RefCell<HashSet<u32>>,
    page_list: RefCell<Option<Vec<ObjRef>>>,
}

impl Document {
    /// Open a document from disk.
    ///
    /// `passphrase` is required for encrypted documents; an empty-password
    /// document opens without one.
    pub fn open(path: impl AsRef<Path>, passphrase: Option<&str>) -> Result<Self> {
        let buf = std::fs::read(path.as_ref())?;
        log::debug!("read {} bytes from {}", buf.len(), path.as_ref().display());
        Self::from_bytes(buf, passphrase)
    }

    /// Open a document from an in-memory buffer.
    pub fn from_bytes(buf: Vec<u8>, passphrase: Option<&str>) -> Result<Self> {
        let version = parse_header(&buf)?;
        let startxref = crate::xref::locate_startxref(&buf)?;
        let (xref, trailer) = read_xref_chain(&buf)?;
        if xref.is_empty() {
            return Err(Error::InvalidXref("cross-reference table is empty".to_string()));
        }

        let mut document = Self {
            buf,
            version,
            xref,
            trailer,
            startxref,
            encryption: None,
            cache: RefCell::new(HashMap::new()),
            loading: RefCell::new(HashSet::new()),
            page_list: RefCell::new(None),
        };
        document.init_encryption(passphrase)?;
        Ok(document)
    }

    fn init_encryption(&mut self, passphrase: Option<&str>) -> Result<()> {
        let Some(encrypt_entry) = self.trailer.get("Encrypt").cloned() else {
            return Ok(());
        };

        let file_id = self
            .trailer
            .get("ID")
            .and_then(Object::as_array)
            .and_then(|ids| ids.first())
            .and_then(Object::as_string)
            .map(|b| b.to_vec())
            .unwrap_or_default();

        // The /Encrypt dictionary itself is never encrypted
        let encrypt_obj = match encrypt_entry {
            Object::Reference(r) => self.load_raw(r)?,
            other => other,
        };
        let encrypt_dict = encrypt_obj.as_dict().ok_or_else(|| {
            Error::Encrypted("/Encrypt is not a dictionary".to_string())
        })?;

        let mut handler = EncryptionHandler::new(encrypt_dict, file_id)?;
        let password = passphrase.unwrap_or("");
        if !handler.authenticate(password.as_bytes()) {
            return Err(Error::Encrypted(if password.is_empty() {
                "document requires a passphrase".to_string()
            } else {
                "supplied passphrase does not unlock the document".to_string()
            }));
        }
        self.encryption = Some(handler);
        Ok(())
    }

    /// PDF version from the header.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// The raw file bytes.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Newest trailer dictionary.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Byte offset of the newest cross-reference section, used as `/Prev`
    /// when appending an incremental update.
    pub fn startxref_offset(&self) -> u64 {
        self.startxref
    }

    /// Whether the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    /// The active encryption handler, if any.
    pub fn encryption(&self) -> Option<&EncryptionHandler> {
        self.encryption.as_ref()
    }

    /// Highest object number plus one, for allocating new objects.
    pub fn next_object_number(&self) -> u32 {
        let from_size = self
            .trailer
            .get("Size")
            .and_then(Object::as_integer)
            .unwrap_or(0) as u32;
        let from_xref = self.xref.object_numbers().max().map(|n| n + 1).unwrap_or(1);
        from_size.max(from_xref)
    }

    /// All object numbers known to the cross-reference table.
    pub fn object_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.xref.object_numbers().collect();
        numbers.sort_unstable();
        numbers
    }

    /// Load an indirect object, following the cross-reference table.
    ///
    /// Returns `Object::Null` for free entries, mirroring how PDF readers
    /// treat dangling references to deleted objects.
    pub fn load(&self, obj_ref: ObjRef) -> Result<Object> {
        if let Some(cached) = self.cache.borrow().get(&obj_ref.number) {
            return Ok(cached.clone());
        }
        if !self.loading.borrow_mut().insert(obj_ref.number) {
            return Err(Error::CircularReference(obj_ref));
        }
        let result = self.load_uncached(obj_ref);
        self.loading.borrow_mut().remove(&obj_ref.number);

        let object = result?;
        self.cache.borrow_mut().insert(obj_ref.number, object.clone());
        Ok(object)
    }

    fn load_uncached(&self, obj_ref: ObjRef) -> Result<Object> {
        match self.xref.get(obj_ref.number) {
            None => Err(Error::ObjectNotFound(obj_ref.number, obj_ref.generation)),
            Some(XrefEntry::Free { .. }) => Ok(Object::Null),
            Some(XrefEntry::InFile { offset, .. }) => {
                let (found_ref, mut object) = parse_indirect_at(&self.buf, offset as usize)?;
                if found_ref.number != obj_ref.number {
                    log::warn!(
                        "xref points {} at object {}, using what is there",
                        obj_ref,
                        found_ref
                    );
                }
                if let Some(handler) = &self.encryption {
                    decrypt_in_place(&mut object, handler, found_ref)?;
                }
                Ok(object)
            },
            Some(XrefEntry::InStream { stream_number, index }) => {
                let container = self.load(ObjRef::new(stream_number, 0))?;
                let (dict, data) = match container {
                    Object::Stream { dict, data } => (dict, data),
                    other => {
                        return Err(Error::InvalidObjectType {
                            expected: "ObjStm".to_string(),
                            found: other.type_name().to_string(),
                        })
                    },
                };
                let stream = ObjectStream::parse(&dict, &data)?;
                // Objects inside an object stream are not re-encrypted;
                // cache all of them while the stream is decoded
                let mut requested = None;
                {
                    let mut cache = self.cache.borrow_mut();
                    for (number, object) in stream.all_objects()? {
                        if number == obj_ref.number {
                            requested = Some(object.clone());
                        }
                        cache.entry(number).or_insert(object);
                    }
                }
                let _ = index;
                requested.ok_or(Error::ObjectNotFound(obj_ref.number, obj_ref.generation))
            },
        }
    }

    /// Load without decryption or caching, for the `/Encrypt` dictionary.
    fn load_raw(&self, obj_ref: ObjRef) -> Result<Object> {
        match self.xref.get(obj_ref.number) {
            Some(XrefEntry::InFile { offset, .. }) => {
                Ok(parse_indirect_at(&self.buf, offset as usize)?.1)
            },
            _ => Err(Error::ObjectNotFound(obj_ref.number, obj_ref.generation)),
        }
    }

    /// Resolve a possibly-indirect object to its value.
    pub fn resolve(&self, object: &Object) -> Result<Object> {
        match object {
            Object::Reference(r) => self.load(*r),
            other => Ok(other.clone()),
        }
    }

    /// The document catalog.
    pub fn catalog(&self) -> Result<Dict> {
        let root = self
            .trailer
            .get("Root")
            .ok_or_else(|| Error::InvalidPdf("trailer has no /Root".to_string()))?;
        match self.resolve(root)? {
            Object::Dictionary(dict) => Ok(dict),
            other => Err(Error::InvalidObjectType {
                expected: "Catalog dictionary".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// References of all pages in document order.
    pub fn page_refs(&self) -> Result<Vec<ObjRef>> {
        if let Some(cached) = self.page_list.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let catalog = self.catalog()?;
        let pages_root = catalog
            .get("Pages")
            .and_then(Object::as_reference)
            .ok_or_else(|| Error::InvalidPdf("catalog has no /Pages".to_string()))?;

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.collect_pages(pages_root, &mut pages, &mut visited)?;
        *self.page_list.borrow_mut() = Some(pages.clone());
        Ok(pages)
    }

    fn collect_pages(
        &self,
        node_ref: ObjRef,
        pages: &mut Vec<ObjRef>,
        visited: &mut HashSet<ObjRef>,
    ) -> Result<()> {
        if !visited.insert(node_ref) {
            log::warn!("page tree cycle at {}", node_ref);
            return Ok(());
        }
        let node = self.load(node_ref)?;
        let dict = match node.as_dict() {
            Some(d) => d,
            None => return Ok(()),
        };
        match dict.get("Type").and_then(Object::as_name) {
            Some("Page") => pages.push(node_ref),
            _ => {
                if let Some(kids) = dict.get("Kids").and_then(Object::as_array) {
                    for kid in kids {
                        if let Some(kid_ref) = kid.as_reference() {
                            self.collect_pages(kid_ref, pages, visited)?;
                        }
                    }
                }
            },
        }
        Ok(())
    }

    /// Number of pages.
    pub fn page_count(&self) -> Result<usize> {
        Ok(self.page_refs()?.len())
    }

    /// Page dictionary by zero-based index.
    pub fn page_dict(&self, index: usize) -> Result<Dict> {
        let refs = self.page_refs()?;
        let page_ref = refs
            .get(index)
            .copied()
            .ok_or_else(|| Error::InvalidPdf(format!("page {} out of range", index)))?;
        match self.load(page_ref)? {
            Object::Dictionary(dict) => Ok(dict),
            other => Err(Error::InvalidObjectType {
                expected: "Page dictionary".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// One-based page number for a page object reference.
    pub fn page_number_of(&self, page_ref: ObjRef) -> Result<Option<u32>> {
        Ok(self
            .page_refs()?
            .iter()
            .position(|&r| r == page_ref)
            .map(|i| i as u32 + 1))
    }

    /// Decoded content-stream bytes of a page (array parts concatenated).
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>> {
        let page = self.page_dict(index)?;
        let Some(contents) = page.get("Contents") else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        match self.resolve(contents)? {
            Object::Stream { dict, data } => {
                out.extend(crate::decoders::decode_stream(&dict, &data)?);
            },
            Object::Array(parts) => {
                for part in &parts {
                    if let Object::Stream { dict, data } = self.resolve(part)? {
                        out.extend(crate::decoders::decode_stream(&dict, &data)?);
                        out.push(b'\n');
                    }
                }
            },
            other => {
                log::warn!("page {} /Contents is {}", index, other.type_name());
            },
        }
        Ok(out)
    }
}

/// Decrypt every string and stream payload inside a freshly parsed object.
///
/// Runs before filter decoding, per Section 7.6.2.
fn decrypt_in_place(object: &mut Object, handler: &EncryptionHandler, obj_ref: ObjRef) -> Result<()> {
    match object {
        Object::String(bytes) => {
            *bytes = handler.decrypt_string(bytes, obj_ref)?;
        },
        Object::Array(items) => {
            for item in items {
                decrypt_in_place(item, handler, obj_ref)?;
            }
        },
        Object::Dictionary(dict) => {
            for value in dict.values_mut() {
                decrypt_in_place(value, handler, obj_ref)?;
            }
        },
        Object::Stream { dict, data } => {
            for value in dict.values_mut() {
                decrypt_in_place(value, handler, obj_ref)?;
            }
            // XRef and metadata streams stay plaintext; XRef streams never
            // reach here because the chain reader parses them directly
            let decrypted = handler.decrypt_stream(data, obj_ref)?;
            *data = bytes::Bytes::from(decrypted);
        },
        _ => {},
    }
    Ok(())
}

/// Parse the `%PDF-M.m` header.
pub fn parse_header(buf: &[u8]) -> Result<(u8, u8)> {
    // The header must appear within the first 1024 bytes; some files have
    // leading junk
    let window = &buf[..buf.len().min(1024)];
    let start = crate::parser::find_subsequence(window, b"%PDF-").ok_or_else(|| {
        Error::InvalidHeader(String::from_utf8_lossy(&window[..window.len().min(16)]).into_owned())
    })?;
    let rest = &window[start + 5..];
    let major = rest
        .first()
        .filter(|b| b.is_ascii_digit())
        .map(|b| b - b'0')
        .ok_or_else(|| Error::InvalidHeader("missing version".to_string()))?;
    let minor = rest
        .get(2)
        .filter(|b| b.is_ascii_digit())
        .map(|b| b - b'0')
        .unwrap_or(0);
    Ok((major, minor))
}
