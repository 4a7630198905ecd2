//! Content stream interpretation.
//!
//! Walks a page's operators once and collects everything the page extractor
//! needs: positioned text spans, raster image placements and painted vector
//! paths. All output geometry is in page space (top-left origin, y down).

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId, Stream};

use super::backend::{number, stream_content, LopdfBackend, PageId};
use super::cmap::FontDecoder;
use super::geometry::{Matrix, Rect};
use crate::error::{Error, Result};

/// Nested form XObjects deeper than this are ignored.
const MAX_FORM_DEPTH: usize = 8;

/// TJ adjustments (thousandths of an em) beyond this become a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Average glyph width as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// RGB colour.
pub type Rgb = [u8; 3];

/// A run of text with its estimated bounding box.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Bounding box in page space
    pub bbox: Rect,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: Rect, font_size: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
        }
    }

    /// Baseline position.
    pub fn baseline(&self) -> f32 {
        self.bbox.y1 - self.font_size * 0.2
    }
}

/// A raster image drawn on the page.
#[derive(Debug, Clone)]
pub struct PlacedImage<'a> {
    /// XObject resource name
    pub name: String,
    /// The image stream
    pub stream: &'a Stream,
    /// Unit square mapped through the CTM
    pub bbox: Rect,
}

/// One element of a vector path, in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    CurveTo(f32, f32, f32, f32, f32, f32),
    Close,
}

/// A painted vector path.
#[derive(Debug, Clone)]
pub struct PathShape {
    pub segments: Vec<PathSegment>,
    /// Bounding box including half the stroke width
    pub bbox: Rect,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    /// Stroke width in page units
    pub line_width: f32,
    pub even_odd: bool,
}

/// Everything drawn on one page.
#[derive(Debug, Clone)]
pub struct PageContent<'a> {
    pub width: f32,
    pub height: f32,
    pub spans: Vec<TextSpan>,
    pub images: Vec<PlacedImage<'a>>,
    pub paths: Vec<PathShape>,
}

impl<'a> PageContent<'a> {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            spans: Vec::new(),
            images: Vec::new(),
            paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Rgb,
    stroke: Rgb,
    line_width: f32,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill: [0, 0, 0],
            stroke: [0, 0, 0],
            line_width: 1.0,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TextObject {
    tm: Matrix,
    tlm: Matrix,
}

impl TextObject {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }
}

/// Interprets page content streams against one document.
pub struct ContentInterpreter<'a> {
    backend: &'a LopdfBackend,
    fonts: HashMap<ObjectId, FontDecoder>,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(backend: &'a LopdfBackend) -> Self {
        Self {
            backend,
            fonts: HashMap::new(),
        }
    }

    /// Interpret one page.
    pub fn interpret_page(&mut self, page: PageId) -> Result<PageContent<'a>> {
        let media_box = self.backend.media_box(page);
        // Flip into page space: origin at the MediaBox's top-left corner.
        let base = Matrix::new(1.0, 0.0, 0.0, -1.0, -media_box.x0, media_box.y1);

        let mut out = PageContent::new(media_box.width(), media_box.height());
        let content = self.backend.page_content(page)?;
        let resources = self.backend.page_resources(page);
        let mut gs = GraphicsState::new(base);
        self.run(&content, resources, &mut gs, 0, &mut out)?;

        log::debug!(
            "page content: {} spans, {} images, {} paths",
            out.spans.len(),
            out.images.len(),
            out.paths.len()
        );
        Ok(out)
    }

    fn run(
        &mut self,
        data: &[u8],
        resources: Option<&'a Dictionary>,
        gs: &mut GraphicsState,
        depth: usize,
        out: &mut PageContent<'a>,
    ) -> Result<()> {
        let content = Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text = TextObject::default();
        let mut path: Vec<PathSegment> = Vec::new();
        let mut current: Option<(f32, f32)> = None;
        let mut subpath_start: Option<(f32, f32)> = None;

        for op in &content.operations {
            let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
            match op.operator.as_str() {
                // Graphics state
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        *gs = saved;
                    }
                }
                "cm" if nums.len() >= 6 => {
                    let m = Matrix::new(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                    gs.ctm = m.then(&gs.ctm);
                }
                "w" if !nums.is_empty() => gs.line_width = nums[0],
                "g" => gs.fill = color_from(&nums).unwrap_or(gs.fill),
                "G" => gs.stroke = color_from(&nums).unwrap_or(gs.stroke),
                "rg" | "k" | "sc" | "scn" => gs.fill = color_from(&nums).unwrap_or(gs.fill),
                "RG" | "K" | "SC" | "SCN" => gs.stroke = color_from(&nums).unwrap_or(gs.stroke),
                "cs" => gs.fill = [0, 0, 0],
                "CS" => gs.stroke = [0, 0, 0],

                // Path construction
                "m" if nums.len() >= 2 => {
                    let p = gs.ctm.apply(nums[0], nums[1]);
                    path.push(PathSegment::MoveTo(p.0, p.1));
                    current = Some(p);
                    subpath_start = Some(p);
                }
                "l" if nums.len() >= 2 => {
                    let p = gs.ctm.apply(nums[0], nums[1]);
                    path.push(PathSegment::LineTo(p.0, p.1));
                    current = Some(p);
                }
                "c" if nums.len() >= 6 => {
                    let p1 = gs.ctm.apply(nums[0], nums[1]);
                    let p2 = gs.ctm.apply(nums[2], nums[3]);
                    let p3 = gs.ctm.apply(nums[4], nums[5]);
                    path.push(PathSegment::CurveTo(p1.0, p1.1, p2.0, p2.1, p3.0, p3.1));
                    current = Some(p3);
                }
                "v" if nums.len() >= 4 => {
                    let p1 = current.unwrap_or_default();
                    let p2 = gs.ctm.apply(nums[0], nums[1]);
                    let p3 = gs.ctm.apply(nums[2], nums[3]);
                    path.push(PathSegment::CurveTo(p1.0, p1.1, p2.0, p2.1, p3.0, p3.1));
                    current = Some(p3);
                }
                "y" if nums.len() >= 4 => {
                    let p1 = gs.ctm.apply(nums[0], nums[1]);
                    let p3 = gs.ctm.apply(nums[2], nums[3]);
                    path.push(PathSegment::CurveTo(p1.0, p1.1, p3.0, p3.1, p3.0, p3.1));
                    current = Some(p3);
                }
                "h" => {
                    path.push(PathSegment::Close);
                    current = subpath_start;
                }
                "re" if nums.len() >= 4 => {
                    let (x, y, w, h) = (nums[0], nums[1], nums[2], nums[3]);
                    let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
                    for (i, (cx, cy)) in corners.iter().enumerate() {
                        let p = gs.ctm.apply(*cx, *cy);
                        path.push(if i == 0 {
                            PathSegment::MoveTo(p.0, p.1)
                        } else {
                            PathSegment::LineTo(p.0, p.1)
                        });
                    }
                    path.push(PathSegment::Close);
                    let start = gs.ctm.apply(x, y);
                    current = Some(start);
                    subpath_start = Some(start);
                }

                // Path painting
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    let operator = op.operator.as_str();
                    if matches!(operator, "s" | "b" | "b*") {
                        path.push(PathSegment::Close);
                    }
                    let fill = !matches!(operator, "S" | "s");
                    let stroke = matches!(operator, "S" | "s" | "B" | "B*" | "b" | "b*");
                    let even_odd = operator.ends_with('*');
                    if let Some(shape) =
                        build_shape(std::mem::take(&mut path), gs, fill, stroke, even_odd)
                    {
                        out.paths.push(shape);
                    }
                    current = None;
                }
                "n" => {
                    path.clear();
                    current = None;
                }

                // Text objects and state
                "BT" => text = TextObject::default(),
                "ET" => {}
                "Tf" if op.operands.len() >= 2 => {
                    if let Ok(name) = op.operands[0].as_name() {
                        gs.font = name.to_vec();
                    }
                    gs.font_size = number(&op.operands[1]).unwrap_or(12.0);
                }
                "TL" if !nums.is_empty() => gs.leading = nums[0],
                "Td" if nums.len() >= 2 => text.move_line(nums[0], nums[1]),
                "TD" if nums.len() >= 2 => {
                    gs.leading = -nums[1];
                    text.move_line(nums[0], nums[1]);
                }
                "Tm" if nums.len() >= 6 => {
                    let m = Matrix::new(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                    text.tm = m;
                    text.tlm = m;
                }
                "T*" => text.move_line(0.0, -line_leading(gs)),
                "Tj" | "TJ" => {
                    let pieces = match op.operands.first() {
                        Some(Object::Array(items)) => items.as_slice(),
                        _ => op.operands.as_slice(),
                    };
                    self.show_text(pieces, resources, gs, &mut text, out);
                }
                "'" => {
                    text.move_line(0.0, -line_leading(gs));
                    self.show_text(&op.operands, resources, gs, &mut text, out);
                }
                "\"" => {
                    text.move_line(0.0, -line_leading(gs));
                    if let Some(s) = op.operands.get(2) {
                        self.show_text(std::slice::from_ref(s), resources, gs, &mut text, out);
                    }
                }

                // External objects
                "Do" => {
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        self.draw_xobject(name, resources, gs, depth, out);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn show_text(
        &mut self,
        pieces: &[Object],
        resources: Option<&'a Dictionary>,
        gs: &GraphicsState,
        text: &mut TextObject,
        out: &mut PageContent<'a>,
    ) {
        let decoder = self.decoder(resources, &gs.font);
        let size = gs.font_size;

        let mut combined = String::new();
        let mut advance = 0.0f32;
        for piece in pieces {
            match piece {
                Object::String(bytes, _) => {
                    let decoded = decoder.decode(bytes);
                    advance += decoded.chars().count() as f32 * size * GLYPH_WIDTH_RATIO;
                    combined.push_str(&decoded);
                }
                other => {
                    if let Some(n) = number(other) {
                        let adjustment = -n;
                        advance += adjustment / 1000.0 * size;
                        if adjustment > TJ_SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(char::is_whitespace)
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
        }

        let start = text.tm;
        text.tm = Matrix::translate(advance, 0.0).then(&start);

        if combined.trim().is_empty() {
            return;
        }

        let trm = start.then(&gs.ctm);
        let (x, y) = trm.apply(0.0, 0.0);
        let (end_x, _) = trm.apply(advance, 0.0);
        let effective = (size * trm.vertical_scale()).max(1.0);
        let bbox = Rect::new(
            x.min(end_x),
            y - effective * 0.8,
            x.max(end_x),
            y + effective * 0.2,
        );
        out.spans.push(TextSpan::new(combined, bbox, effective));
    }

    fn draw_xobject(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        gs: &GraphicsState,
        depth: usize,
        out: &mut PageContent<'a>,
    ) {
        let backend = self.backend;
        let Some(stream) = resources
            .and_then(|res| backend.resource(res, b"XObject", name))
            .and_then(|obj| backend.resolve_stream(obj))
        else {
            log::debug!("XObject {} not found", String::from_utf8_lossy(name));
            return;
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name_str().ok());

        match subtype {
            Some("Image") => {
                let bbox = gs.ctm.transform_rect(&Rect::new(0.0, 0.0, 1.0, 1.0));
                out.images.push(PlacedImage {
                    name: String::from_utf8_lossy(name).into_owned(),
                    stream,
                    bbox,
                });
            }
            Some("Form") => {
                if depth >= MAX_FORM_DEPTH {
                    log::warn!("form XObject nesting too deep, skipping");
                    return;
                }
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .map(|a| a.iter().filter_map(number).collect::<Vec<f32>>())
                    .filter(|v| v.len() >= 6)
                    .map(|v| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
                    .unwrap_or_default();
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| backend.resolve_dict(o))
                    .or(resources);

                let mut form_gs = gs.clone();
                form_gs.ctm = matrix.then(&gs.ctm);
                let result = stream_content(stream)
                    .and_then(|data| self.run(&data, form_resources, &mut form_gs, depth + 1, out));
                if let Err(e) = result {
                    log::warn!(
                        "skipping form XObject {}: {e}",
                        String::from_utf8_lossy(name)
                    );
                }
            }
            _ => {}
        }
    }

    /// Decoders are cached per font object; inline font dictionaries are rebuilt.
    fn decoder(&mut self, resources: Option<&'a Dictionary>, font: &[u8]) -> FontDecoder {
        let backend = self.backend;
        let Some(id) = resources.and_then(|res| backend.font_id(res, font)) else {
            return backend.font_decoder(resources, font);
        };
        self.fonts
            .entry(id)
            .or_insert_with(|| backend.font_decoder(resources, font))
            .clone()
    }
}

fn line_leading(gs: &GraphicsState) -> f32 {
    if gs.leading != 0.0 {
        gs.leading
    } else {
        gs.font_size * 1.2
    }
}

/// Colour from gray, RGB or CMYK operands in the 0–1 range.
fn color_from(components: &[f32]) -> Option<Rgb> {
    let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    match components.len() {
        1 => {
            let v = to_byte(components[0]);
            Some([v, v, v])
        }
        3 => Some([
            to_byte(components[0]),
            to_byte(components[1]),
            to_byte(components[2]),
        ]),
        4 => {
            let (c, m, y, k) = (components[0], components[1], components[2], components[3]);
            Some([
                to_byte((1.0 - c) * (1.0 - k)),
                to_byte((1.0 - m) * (1.0 - k)),
                to_byte((1.0 - y) * (1.0 - k)),
            ])
        }
        _ => None,
    }
}

fn build_shape(
    segments: Vec<PathSegment>,
    gs: &GraphicsState,
    fill: bool,
    stroke: bool,
    even_odd: bool,
) -> Option<PathShape> {
    let points = segments.iter().flat_map(|s| match *s {
        PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => vec![(x, y)],
        PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => vec![(x1, y1), (x2, y2), (x3, y3)],
        PathSegment::Close => vec![],
    });
    let bbox = Rect::bounding(points)?;
    let line_width = (gs.line_width * gs.ctm.scale()).max(0.0);
    let bbox = if stroke {
        bbox.inflate(line_width / 2.0)
    } else {
        bbox
    };

    Some(PathShape {
        segments,
        bbox,
        fill: fill.then_some(gs.fill),
        stroke: stroke.then_some(gs.stroke),
        line_width,
        even_odd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document};

    fn page_with(content: &[u8], images: Vec<(&str, Stream)>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut xobjects = Dictionary::new();
        for (name, stream) in images {
            let id = doc.add_object(Object::Stream(stream));
            xobjects.set(name, id);
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! { "F1" => font_id }),
                "XObject" => Object::Dictionary(xobjects),
            }),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn interpret(bytes: &[u8]) -> (Vec<TextSpan>, Vec<Rect>, Vec<PathShape>) {
        let backend = LopdfBackend::load_bytes(bytes).unwrap();
        let (_, page) = backend.pages().into_iter().next().unwrap();
        let mut interpreter = ContentInterpreter::new(&backend);
        let content = interpreter.interpret_page(page).unwrap();
        let images = content.images.iter().map(|i| i.bbox).collect();
        (content.spans, images, content.paths)
    }

    #[test]
    fn test_same_font_name_in_form_uses_its_own_font() {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let plain_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let cmap_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"1 beginbfchar <41> <005A> endbfchar".to_vec(),
        ));
        let mapped_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Custom",
            "ToUnicode" => cmap_id,
        });
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => Object::Dictionary(dictionary! {
                    "Font" => Object::Dictionary(dictionary! { "F1" => mapped_id }),
                }),
            },
            b"BT /F1 12 Tf 72 500 Td (A) Tj ET".to_vec(),
        ));
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"BT /F1 12 Tf 72 700 Td (A) Tj ET /Fm1 Do BT /F1 12 Tf 72 300 Td (A) Tj ET"
                .to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! { "F1" => plain_id }),
                "XObject" => Object::Dictionary(dictionary! { "Fm1" => form_id }),
            }),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let (spans, _, _) = interpret(&buf);
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "Z", "A"]);
    }

    #[test]
    fn test_text_span_position() {
        let bytes = page_with(b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET", vec![]);
        let (spans, _, _) = interpret(&bytes);
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.text, "Hello");
        assert!((span.bbox.x0 - 72.0).abs() < 0.01);
        assert!((span.bbox.x1 - 102.0).abs() < 0.01);
        // Baseline at 792 - 700 in page space.
        assert!((span.baseline() - 92.0).abs() < 0.01);
        assert!(span.bbox.y0 < 92.0);
    }

    #[test]
    fn test_tj_array_inserts_word_spaces() {
        let bytes = page_with(
            b"BT /F1 10 Tf 10 10 Td [(Hello) -300 (world) -20 (!)] TJ ET",
            vec![],
        );
        let (spans, _, _) = interpret(&bytes);
        assert_eq!(spans[0].text, "Hello world!");
    }

    #[test]
    fn test_next_line_operators() {
        let bytes = page_with(
            b"BT /F1 10 Tf 14 TL 50 500 Td (one) Tj T* (two) Tj (three) ' ET",
            vec![],
        );
        let (spans, _, _) = interpret(&bytes);
        let baselines: Vec<f32> = spans.iter().map(|s| s.baseline()).collect();
        assert_eq!(spans.len(), 3);
        assert!((baselines[1] - baselines[0] - 14.0).abs() < 0.01);
        assert!((baselines[2] - baselines[1] - 14.0).abs() < 0.01);
    }

    #[test]
    fn test_image_placement_is_flipped() {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1i64,
                "Height" => 1i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            vec![255, 0, 0],
        );
        let bytes = page_with(b"q 200 0 0 150 100 300 cm /Im0 Do Q", vec![("Im0", image)]);
        let (_, images, _) = interpret(&bytes);
        assert_eq!(images, vec![Rect::new(100.0, 342.0, 300.0, 492.0)]);
    }

    #[test]
    fn test_paths_and_colors() {
        let bytes = page_with(
            b"1 0 0 rg 100 100 50 40 re f 0 0 1 RG 2 w 10 10 m 60 10 l S 20 20 m 30 30 l n",
            vec![],
        );
        let (_, _, paths) = interpret(&bytes);
        assert_eq!(paths.len(), 2);

        let rect = &paths[0];
        assert_eq!(rect.fill, Some([255, 0, 0]));
        assert_eq!(rect.stroke, None);
        assert_eq!(rect.bbox, Rect::new(100.0, 652.0, 150.0, 692.0));

        let line = &paths[1];
        assert_eq!(line.stroke, Some([0, 0, 255]));
        assert_eq!(line.fill, None);
        assert_eq!(line.bbox, Rect::new(9.0, 781.0, 61.0, 783.0));
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(color_from(&[0.5]), Some([128, 128, 128]));
        assert_eq!(color_from(&[0.0, 0.0, 0.0, 1.0]), Some([0, 0, 0]));
        assert_eq!(color_from(&[0.0, 1.0, 1.0, 0.0]), Some([255, 0, 0]));
        assert_eq!(color_from(&[0.1, 0.2]), None);
    }
}
