//! Integration tests for summary-to-page alignment.

use std::collections::{BTreeMap, HashSet};

use docalign::align::{LexicalIndex, Neighbor, PageCaptions, SemanticIndex};
use docalign::render::{entries_to_json, to_text};
use docalign::{
    align_summary, AlignOptions, AlignmentEngine, AlignmentRequest, Decomposition, DocumentKind,
    ImageAsset, JsonFormat, PageRef, ReferenceTable, Result, TextChunk,
};

fn decomposition() -> Decomposition {
    let mut doc = Decomposition::new(DocumentKind::Pdf);
    doc.page_count = 5;
    doc.chunks = vec![
        TextChunk::new("Solar panels convert sunlight into electricity using photovoltaic cells.", 1)
            .unwrap(),
        TextChunk::new("Wind turbines generate power from moving air masses near coastlines.", 2)
            .unwrap(),
        TextChunk::new("Battery storage smooths supply when solar and wind output drops.", 3)
            .unwrap(),
    ];
    doc.images = vec![
        ImageAsset::raster("images/j_page2_img1.png", 2).unwrap(),
        ImageAsset::chart("images/j_page3_chart1.png", 3).unwrap(),
        ImageAsset::raster("images/j_page5_img1.png", 5).unwrap(),
    ];
    doc.full_text = doc
        .chunks
        .iter()
        .map(|c| c.text())
        .collect::<Vec<_>>()
        .join("\n\n");
    doc
}

const SUMMARY: &str = "Photovoltaic cells turn sunlight into electricity.\n\n\
                       Turbines harvest moving air near coastlines.\n\n\
                       Quantum chromodynamics remains unrelated.";

/// Index that sends every query to a fixed ranking.
struct Ranked(Vec<Neighbor>);

impl SemanticIndex for Ranked {
    fn nearest(&self, _query: &str, k: usize) -> Result<Vec<Neighbor>> {
        Ok(self.0.iter().copied().take(k).collect())
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn all_images(entries: &[docalign::AlignedEntry]) -> Vec<&str> {
    entries
        .iter()
        .flat_map(|e| e.images.iter().map(String::as_str))
        .collect()
}

#[test]
fn test_lexical_alignment_end_to_end() {
    let doc = decomposition();
    let entries = align_summary(SUMMARY, &doc);

    let pages: Vec<PageRef> = entries.iter().map(|e| e.page).collect();
    assert_eq!(
        pages,
        vec![
            PageRef::Page(1),
            PageRef::Page(2),
            PageRef::Page(3),
            PageRef::Page(5),
            PageRef::Unmatched
        ]
    );

    assert_eq!(entries[0].response, "Photovoltaic cells turn sunlight into electricity.");
    assert!(entries[0].source_text.starts_with("Solar panels"));
    assert!(entries[0].images.is_empty());

    assert_eq!(entries[1].images, vec!["images/j_page2_img1.png"]);

    // The unmatched paragraph took the chart, but page 3 is still listed.
    assert_eq!(entries[2].response, "This page primarily contains visual elements.");
    assert!(entries[2].source_text.starts_with("Battery storage"));
    assert!(entries[2].images.is_empty());

    assert_eq!(entries[3].response, "This page primarily contains visual elements.");
    assert_eq!(entries[3].source_text, "Content is visual.");
    assert_eq!(entries[3].images, vec!["images/j_page5_img1.png"]);

    assert_eq!(entries[4].source_text, "Could not extract source text.");
    assert_eq!(entries[4].images, vec!["images/j_page3_chart1.png"]);
}

#[test]
fn test_every_asset_attached_exactly_once() {
    let doc = decomposition();
    let pages = doc.page_text_index();
    let expected: HashSet<&str> = doc.images.iter().map(|i| i.path()).collect();

    let rankings = vec![
        vec![],
        vec![Neighbor { page: 1, score: 0.9 }],
        vec![Neighbor { page: 3, score: 0.9 }, Neighbor { page: 2, score: 0.8 }],
        vec![Neighbor { page: 2, score: 0.5 }, Neighbor { page: 1, score: 0.4 }],
    ];
    let summaries = ["One.", "One.\n\nTwo.", "One.\n\nTwo.\n\nThree.\n\nFour."];

    for ranking in &rankings {
        for summary in summaries {
            let index = Ranked(ranking.clone());
            let request = AlignmentRequest::new(summary, &pages, &doc.images).with_index(&index);
            let entries = AlignmentEngine::new().align(&request);

            let attached = all_images(&entries);
            let unique: HashSet<&str> = attached.iter().copied().collect();
            assert_eq!(attached.len(), unique.len(), "duplicate image in {:?}", entries);
            assert_eq!(unique, expected, "missing image for ranking {:?}", ranking);

            let order: Vec<PageRef> = entries.iter().map(|e| e.page).collect();
            let mut sorted = order.clone();
            sorted.sort();
            assert_eq!(order, sorted);

            // One entry per page, every paragraph in exactly one entry.
            let distinct: HashSet<PageRef> = order.iter().copied().collect();
            assert_eq!(distinct.len(), order.len());
            for paragraph in summary.split("\n\n") {
                let holders = entries
                    .iter()
                    .filter(|e| e.response.split("\n\n").any(|p| p == paragraph))
                    .count();
                assert_eq!(holders, 1, "paragraph {:?} in {:?}", paragraph, entries);
            }
        }
    }
}

#[test]
fn test_close_candidate_with_images_wins() {
    let doc = decomposition();
    let pages = doc.page_text_index();
    let index = Ranked(vec![
        Neighbor { page: 1, score: 0.80 },
        Neighbor { page: 2, score: 0.75 },
    ]);
    let request = AlignmentRequest::new("Paragraph.", &pages, &doc.images).with_index(&index);

    let entries = AlignmentEngine::new().align(&request);
    assert_eq!(entries[0].page, PageRef::Page(2));
    assert_eq!(entries[0].response, "Paragraph.");

    // With a strict margin the nearest page is kept.
    let strict = AlignmentEngine::with_options(AlignOptions::new().with_preference_margin(1.0));
    let entries = strict.align(&request);
    assert_eq!(entries[0].page, PageRef::Page(1));
}

#[test]
fn test_captions_and_citations() {
    let doc = decomposition();
    let pages = doc.page_text_index();
    let index = LexicalIndex::build(&pages);

    let mut captions: PageCaptions = BTreeMap::new();
    captions.insert(2, vec!["A turbine photo.".to_string()]);
    captions.insert(4, vec!["A map of sites.".to_string()]);

    let references: ReferenceTable = vec![(1, "Smith. Wind power. 2020.".to_string())]
        .into_iter()
        .collect();

    let summary = "Turbines harvest moving air near coastlines [1].";
    let request = AlignmentRequest::new(summary, &pages, &doc.images)
        .with_index(&index)
        .with_captions(&captions)
        .with_references(&references);
    let entries = AlignmentEngine::new().align(&request);

    let page2 = entries.iter().find(|e| e.page == PageRef::Page(2)).unwrap();
    assert!(page2.response.contains("<span class=\"citation\""));
    assert!(page2.response.contains("Smith. Wind power. 2020."));
    assert!(page2.response.ends_with("\n\nImage Summary:\nA turbine photo."));

    let page4 = entries.iter().find(|e| e.page == PageRef::Page(4)).unwrap();
    assert_eq!(page4.response, "Image Summary:\nA map of sites.");
    assert_eq!(page4.source_text, "Image content");
}

#[test]
fn test_rendered_output() {
    let doc = decomposition();
    let entries = align_summary(SUMMARY, &doc);

    let json = entries_to_json(&entries, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.len(), 5);
    assert_eq!(array[0]["page"], "1");
    assert_eq!(array[0]["type"], "unified");
    assert_eq!(array[4]["page"], "N/A");
    assert_eq!(array[4]["source_text"], "Could not extract source text.");

    let text = to_text(&entries);
    assert!(text.starts_with("== Page 1 =="));
    assert!(text.contains("== Page N/A =="));
}
