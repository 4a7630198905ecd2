//! PDF document access backed by lopdf.
//!
//! Wraps `lopdf::Document` with the lookups page extraction needs: page
//! enumeration, inherited page attributes, content streams, resource
//! dictionaries and font decoders.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::cmap::{FontDecoder, ToUnicodeMap};
use super::geometry::Rect;
use crate::error::{Error, Result};

/// US Letter, used when a page declares no usable MediaBox.
const DEFAULT_MEDIA_BOX: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Maximum depth followed through `/Parent` links and indirect references.
const MAX_CHAIN: usize = 32;

/// Page identifier: (object number, generation number).
pub type PageId = ObjectId;

/// A loaded PDF document.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Self::checked(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::checked(doc)
    }

    fn checked(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// All pages as (page_number → PageId), 1-based.
    pub fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Follow indirect references to the underlying object.
    pub fn resolve<'a>(&'a self, mut obj: &'a Object) -> &'a Object {
        for _ in 0..MAX_CHAIN {
            match obj {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(target) => obj = target,
                    Err(_) => return obj,
                },
                _ => return obj,
            }
        }
        obj
    }

    /// Resolve an object to a dictionary (a stream's dictionary counts).
    pub fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Resolve an object to a stream.
    pub fn resolve_stream<'a>(&'a self, obj: &'a Object) -> Option<&'a Stream> {
        match self.resolve(obj) {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Look up a page attribute, walking up the page tree for inherited keys.
    fn inherited<'a>(&'a self, page: PageId, key: &[u8]) -> Option<&'a Object> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_CHAIN {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            let parent = dict.get(b"Parent").ok()?;
            dict = self.resolve_dict(parent)?;
        }
        None
    }

    /// The page's MediaBox in PDF user space (bottom-left origin).
    pub fn media_box(&self, page: PageId) -> Rect {
        let Some(Object::Array(values)) = self.inherited(page, b"MediaBox").map(|o| self.resolve(o))
        else {
            return DEFAULT_MEDIA_BOX;
        };
        let numbers: Vec<f32> = values
            .iter()
            .filter_map(|o| number(self.resolve(o)))
            .collect();
        if numbers.len() < 4 {
            return DEFAULT_MEDIA_BOX;
        }
        let rect = Rect::new(
            numbers[0].min(numbers[2]),
            numbers[1].min(numbers[3]),
            numbers[0].max(numbers[2]),
            numbers[1].max(numbers[3]),
        );
        if rect.is_empty() {
            DEFAULT_MEDIA_BOX
        } else {
            rect
        }
    }

    /// The page's resource dictionary, if any.
    pub fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        self.inherited(page, b"Resources")
            .and_then(|o| self.resolve_dict(o))
    }

    /// Decompressed content stream bytes for a page (multiple streams concatenated).
    pub fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => self.resolve(obj),
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Stream(stream) => stream_content(stream),
            Object::Array(parts) => {
                let mut content = Vec::new();
                for part in parts {
                    if let Some(stream) = self.resolve_stream(part) {
                        match stream_content(stream) {
                            Ok(data) => {
                                content.extend_from_slice(&data);
                                content.push(b'\n');
                            }
                            Err(e) => log::warn!("skipping unreadable content stream: {e}"),
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::Corrupted("invalid page content stream".to_string())),
        }
    }

    /// Look up `/Resources/<category>/<name>` (e.g. `XObject`, `Im0`).
    pub fn resource<'a>(
        &'a self,
        resources: &'a Dictionary,
        category: &[u8],
        name: &[u8],
    ) -> Option<&'a Object> {
        let table = self.resolve_dict(resources.get(category).ok()?)?;
        table.get(name).ok().map(|o| self.resolve(o))
    }

    /// Object id of a font resource, if the font is an indirect object.
    pub fn font_id(&self, resources: &Dictionary, name: &[u8]) -> Option<ObjectId> {
        let table = self.resolve_dict(resources.get(b"Font").ok()?)?;
        match table.get(name).ok()? {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Build the text decoder for a font resource.
    pub fn font_decoder(&self, resources: Option<&Dictionary>, name: &[u8]) -> FontDecoder {
        let Some(font) = resources
            .and_then(|res| self.resource(res, b"Font", name))
            .and_then(|obj| self.resolve_dict(obj))
        else {
            return FontDecoder::Simple;
        };

        if let Some(cmap) = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| self.resolve_stream(obj))
            .and_then(|stream| stream_content(stream).ok())
            .and_then(|data| ToUnicodeMap::parse(&data))
        {
            return FontDecoder::ToUnicode(cmap);
        }

        let is_composite = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| self.resolve(o).as_name_str().ok())
            == Some("Type0");
        if is_composite {
            FontDecoder::Composite
        } else {
            FontDecoder::Simple
        }
    }
}

/// Filter names declared on a stream, in application order.
pub fn stream_filters(stream: &Stream) -> Vec<String> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name_str().ok().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Stream bytes with lossless filters removed.
pub fn stream_content(stream: &Stream) -> Result<Vec<u8>> {
    if stream_filters(stream).is_empty() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| Error::PdfParse(format!("cannot decode stream: {e}")))
}

/// Numeric value of an integer or real object.
pub fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn one_page_doc(media_box: Vec<Object>, on_parent: bool) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
        };
        if on_parent {
            pages.set("MediaBox", media_box);
        } else {
            page.set("MediaBox", media_box);
        }
        let page_id = doc.add_object(page);
        pages.set("Kids", vec![page_id.into()]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let bytes = one_page_doc(vec![0.into(), 0.into(), 300.into(), 400.into()], true);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let (_, page) = backend.pages().into_iter().next().unwrap();
        assert_eq!(backend.media_box(page), Rect::new(0.0, 0.0, 300.0, 400.0));
        assert_eq!(backend.page_content(page).unwrap(), b"BT ET".to_vec());
    }

    #[test]
    fn test_invalid_media_box_falls_back_to_letter() {
        let bytes = one_page_doc(vec![0.into(), 0.into()], false);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let (_, page) = backend.pages().into_iter().next().unwrap();
        assert_eq!(backend.media_box(page), DEFAULT_MEDIA_BOX);
        assert_eq!(backend.page_count(), 1);
    }

    #[test]
    fn test_load_garbage_fails() {
        assert!(LopdfBackend::load_bytes(b"not a pdf").is_err());
    }
}
