//! Integration tests for PDF and DOCX decomposition.

use std::io::{Cursor, Write};

use docalign::{
    decompose_bytes, decompose_file, AssetKind, DecomposerRegistry, DocumentKind, Error,
    ExtractOptions, JobContext,
};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

fn rgb_image(width: i64, height: i64) -> Stream {
    let data = vec![120u8; (width * height * 3) as usize];
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        data,
    )
}

/// A Letter-sized PDF with one Helvetica font and the given pages.
fn build_pdf(pages: Vec<(String, Vec<(&str, Stream)>)>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for (content, images) in pages {
        let mut xobjects = Dictionary::new();
        for (name, stream) in images {
            let id = doc.add_object(Object::Stream(stream));
            xobjects.set(name, id);
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
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
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
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

fn body(text: &str) -> String {
    format!(
        "BT /F1 11 Tf 72 600 Td ({text}) Tj ET \
         BT /F1 9 Tf 72 20 Td (Confidential footer line) Tj ET "
    )
}

fn sample_pdf() -> Vec<u8> {
    build_pdf(vec![
        (body("Solar panels convert sunlight into electricity."), vec![]),
        (
            format!(
                "{} q 200 0 0 150 100 300 cm /Im1 Do Q q 30 0 0 30 5 757 cm /Logo Do Q",
                body("Wind turbines generate power near coastlines.")
            ),
            vec![("Im1", rgb_image(4, 3)), ("Logo", rgb_image(2, 2))],
        ),
        (
            format!(
                "{} 0 0 1 rg 100 100 20 200 re f 128 100 20 150 re f \
                 0 0 0 RG 2 w 95 95 m 200 95 l S",
                body("Battery storage smooths the supply curve.")
            ),
            vec![],
        ),
    ])
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_pdf_pages_are_tagged() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobContext::with_id("job", dir.path());
    let doc = decompose_bytes(&sample_pdf(), "pdf", &job, &ExtractOptions::default()).unwrap();

    assert_eq!(doc.kind, DocumentKind::Pdf);
    assert_eq!(doc.page_count, 3);

    let pages: Vec<u32> = doc.chunks.iter().map(|c| c.page()).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert!(doc.chunks[0].text().contains("Solar panels"));
    assert!(doc.chunks[1].text().contains("Wind turbines"));
    assert!(doc.chunks[2].text().contains("Battery storage"));

    assert!(doc.full_text.contains("sunlight"));
    assert!(!doc.full_text.contains("footer"));
}

#[test]
fn test_pdf_images_and_charts() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobContext::with_id("job", dir.path());
    let doc = decompose_bytes(&sample_pdf(), "pdf", &job, &ExtractOptions::default()).unwrap();

    let images: Vec<(&str, u32, AssetKind)> = doc
        .images
        .iter()
        .map(|i| (i.path(), i.page(), i.kind()))
        .collect();
    assert_eq!(
        images,
        vec![
            ("images/job_page2_img1.png", 2, AssetKind::Raster),
            ("images/job_page3_chart1.png", 3, AssetKind::Chart),
        ]
    );
    for asset in &doc.images {
        let bytes = std::fs::read(job.resolve(asset.path())).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    assert_eq!(job.cleanup().unwrap(), 2);
    assert!(!job.resolve("images/job_page2_img1.png").exists());
}

#[test]
fn test_sequential_matches_parallel() {
    let bytes = sample_pdf();
    let dir = tempfile::tempdir().unwrap();

    let parallel = decompose_bytes(
        &bytes,
        "pdf",
        &JobContext::with_id("a", dir.path()),
        &ExtractOptions::new().text_only(),
    )
    .unwrap();
    let sequential = decompose_bytes(
        &bytes,
        "pdf",
        &JobContext::with_id("b", dir.path()),
        &ExtractOptions::new().text_only().sequential(),
    )
    .unwrap();

    assert_eq!(parallel.chunks, sequential.chunks);
    assert_eq!(parallel.full_text, sequential.full_text);
    assert!(parallel.images.is_empty());
}

#[test]
fn test_page_without_text() {
    let bytes = build_pdf(vec![
        (body("Only the first page has words."), vec![]),
        ("0 0 0 rg 300 300 2 2 re f".to_string(), vec![]),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let job = JobContext::with_id("t", dir.path());
    let doc = decompose_bytes(&bytes, "pdf", &job, &ExtractOptions::default()).unwrap();

    assert_eq!(doc.page_count, 2);
    assert!(doc.chunks.iter().all(|c| c.page() == 1));
    let index = doc.page_text_index();
    assert_eq!(index.pages().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_decompose_file_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("report.pdf");
    std::fs::write(&pdf_path, sample_pdf()).unwrap();
    let docx_path = dir.path().join("notes.docx");
    std::fs::write(&docx_path, docx(&["Alpha paragraph.", "Beta paragraph."])).unwrap();

    let job = JobContext::with_id("f", dir.path());
    let options = ExtractOptions::new().text_only();

    let pdf = decompose_file(&pdf_path, &job, &options).unwrap();
    assert_eq!(pdf.kind, DocumentKind::Pdf);

    let word = decompose_file(&docx_path, &job, &options).unwrap();
    assert_eq!(word.kind, DocumentKind::Docx);
    assert_eq!(word.page_count, 2);
    assert_eq!(word.chunks[1].text(), "Beta paragraph.");
    assert_eq!(word.chunks[1].page(), 2);
}

#[test]
fn test_docx_references() {
    let bytes = docx(&[
        "Cells divide rapidly [1], as later confirmed [2].",
        "References",
        "1. Smith J. Cell division. Nature. 2001.",
        "2. Lee K. Mitosis revisited. Science. 2005.",
    ]);
    let dir = tempfile::tempdir().unwrap();
    let job = JobContext::with_id("d", dir.path());
    let doc = decompose_bytes(&bytes, "docx", &job, &ExtractOptions::default()).unwrap();

    assert_eq!(doc.references.len(), 2);
    assert_eq!(doc.references.get(2), Some("Lee K. Mitosis revisited. Science. 2005."));
}

#[test]
fn test_registry_rejects_unknown_and_mismatched_input() {
    let registry = DecomposerRegistry::with_defaults();
    let dir = tempfile::tempdir().unwrap();
    let job = JobContext::with_id("r", dir.path());
    let options = ExtractOptions::default();

    let unknown = registry.decompose_bytes(b"%PDF-1.4", "odt", &job, &options);
    assert!(matches!(unknown, Err(Error::UnknownFormat(_))));

    // A DOCX container declared as PDF.
    let mismatched = registry.decompose_bytes(&docx(&["x"]), "pdf", &job, &options);
    assert!(mismatched.is_err());
}
