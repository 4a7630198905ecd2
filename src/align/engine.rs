//! The alignment algorithm.

use std::collections::{HashMap, HashSet};

use super::{Neighbor, PageCaptions, SemanticIndex};
use crate::model::{AlignedEntry, ImageAsset, PageRef, PageTextIndex, ReferenceTable};
use crate::text::{annotate_citations, split_paragraphs};

/// Tuning and placeholder text for the alignment engine.
#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// Number of candidate pages requested per paragraph
    pub top_k: usize,

    /// A candidate page with unused images is preferred over the nearest page
    /// only if its score is at least this fraction of the best score
    pub preference_margin: f32,

    /// Response of an entry created for a page that only has images
    pub visual_placeholder: String,

    /// Source text of such an entry when the page has no text
    pub visual_source: String,

    /// Source text of the unmatched ("N/A") bucket
    pub unmatched_source: String,

    /// Source text of the failed-lookup ("not found") bucket
    pub not_found_source: String,

    /// Source text of an entry created from captions alone
    pub caption_source: String,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            preference_margin: 0.85,
            visual_placeholder: "This page primarily contains visual elements.".to_string(),
            visual_source: "Content is visual.".to_string(),
            unmatched_source: "Could not extract source text.".to_string(),
            not_found_source: "Source text not found".to_string(),
            caption_source: "Image content".to_string(),
        }
    }
}

impl AlignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    pub fn with_preference_margin(mut self, margin: f32) -> Self {
        self.preference_margin = margin.clamp(0.0, 1.0);
        self
    }
}

/// Inputs of one alignment run, all borrowed from the decomposition.
#[derive(Clone, Copy)]
pub struct AlignmentRequest<'a> {
    pub summary: &'a str,
    pub pages: &'a PageTextIndex,
    pub assets: &'a [ImageAsset],
    pub references: Option<&'a ReferenceTable>,
    pub captions: Option<&'a PageCaptions>,
    pub index: Option<&'a dyn SemanticIndex>,
}

impl<'a> AlignmentRequest<'a> {
    pub fn new(summary: &'a str, pages: &'a PageTextIndex, assets: &'a [ImageAsset]) -> Self {
        Self {
            summary,
            pages,
            assets,
            references: None,
            captions: None,
            index: None,
        }
    }

    pub fn with_references(mut self, references: &'a ReferenceTable) -> Self {
        self.references = Some(references);
        self
    }

    pub fn with_captions(mut self, captions: &'a PageCaptions) -> Self {
        self.captions = Some(captions);
        self
    }

    pub fn with_index(mut self, index: &'a dyn SemanticIndex) -> Self {
        self.index = Some(index);
        self
    }
}

/// Assigns summary paragraphs to pages and groups them into entries.
#[derive(Debug, Clone, Default)]
pub struct AlignmentEngine {
    options: AlignOptions,
}

impl AlignmentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AlignOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AlignOptions {
        &self.options
    }

    /// Align a summary against its source.
    ///
    /// The result is ordered by page, then the unmatched bucket, then the
    /// failed-lookup bucket. Every asset path appears in exactly one entry.
    pub fn align(&self, request: &AlignmentRequest<'_>) -> Vec<AlignedEntry> {
        let mut state = Assembly::new(request.assets);

        for paragraph in split_paragraphs(request.summary) {
            self.place_paragraph(&mut state, request, &paragraph);
        }

        if let Some(captions) = request.captions {
            self.place_captions(&mut state, captions);
        }

        self.fill_visual_pages(&mut state, request);

        let mut entries = state.finish();

        if let Some(references) = request.references.filter(|r| !r.is_empty()) {
            for entry in &mut entries {
                entry.response = annotate_citations(&entry.response, references);
            }
        }

        log::info!(
            "aligned summary into {} entries over {} pages",
            entries.len(),
            request.pages.len()
        );
        entries
    }

    fn place_paragraph(
        &self,
        state: &mut Assembly<'_>,
        request: &AlignmentRequest<'_>,
        paragraph: &str,
    ) {
        let Some(index) = request.index else {
            state.push_unmatched(paragraph, &self.options.unmatched_source);
            return;
        };

        match index.nearest(paragraph, self.options.top_k) {
            Ok(neighbors) if neighbors.is_empty() => {
                log::debug!("no candidate page for paragraph, using unmatched bucket");
                state.push_unmatched(paragraph, &self.options.unmatched_source);
            }
            Ok(neighbors) => {
                let page = self.choose_page(state, &neighbors);
                log::debug!("paragraph aligned to page {}", page);
                let source = request.pages.get(page).unwrap_or_default();
                state.push_page(page, paragraph, source);
            }
            Err(e) => {
                log::warn!("page lookup failed: {}", e);
                let slot = state.slot(PageRef::NotFound, &self.options.not_found_source);
                state.entries[slot].push_paragraph(paragraph);
            }
        }
    }

    /// Prefer the first close-enough candidate whose page still has an unused
    /// image, otherwise the nearest page.
    fn choose_page(&self, state: &Assembly<'_>, neighbors: &[Neighbor]) -> u32 {
        let best = neighbors
            .iter()
            .map(|n| n.score)
            .fold(f32::NEG_INFINITY, f32::max);
        let floor = if best > 0.0 {
            best * self.options.preference_margin
        } else {
            f32::NEG_INFINITY
        };

        neighbors
            .iter()
            .filter(|n| n.score >= floor)
            .find(|n| state.has_unused(n.page))
            .unwrap_or(&neighbors[0])
            .page
    }

    fn place_captions(&self, state: &mut Assembly<'_>, captions: &PageCaptions) {
        for (&page, lines) in captions {
            if lines.is_empty() {
                continue;
            }
            let joined = lines.join("\n");
            match state.slots.get(&PageRef::Page(page)) {
                Some(&slot) => {
                    let response = &mut state.entries[slot].response;
                    response.push_str("\n\nImage Summary:\n");
                    response.push_str(&joined);
                }
                None => {
                    let slot = state.slot(PageRef::Page(page), &self.options.caption_source);
                    state.entries[slot].response = format!("Image Summary:\n{}", joined);
                    state.claim_page(slot, page);
                }
            }
        }
    }

    fn fill_visual_pages(&self, state: &mut Assembly<'_>, request: &AlignmentRequest<'_>) {
        for page in state.image_pages() {
            if state.slots.contains_key(&PageRef::Page(page)) {
                continue;
            }
            let source = request
                .pages
                .get(page)
                .unwrap_or(self.options.visual_source.as_str())
                .to_string();
            let slot = state.slot(PageRef::Page(page), &source);
            state.entries[slot].response = self.options.visual_placeholder.clone();
            state.claim_page(slot, page);
        }
    }
}

/// Working set of one alignment run: entries in creation order plus the
/// set of asset paths already attached somewhere.
struct Assembly<'a> {
    assets: Vec<&'a ImageAsset>,
    used: HashSet<&'a str>,
    entries: Vec<AlignedEntry>,
    slots: HashMap<PageRef, usize>,
}

impl<'a> Assembly<'a> {
    fn new(assets: &'a [ImageAsset]) -> Self {
        let mut assets: Vec<&ImageAsset> = assets.iter().collect();
        assets.sort_by_key(|a| a.page());
        Self {
            assets,
            used: HashSet::new(),
            entries: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Index of the entry for `page`, creating it if needed.
    fn slot(&mut self, page: PageRef, source: &str) -> usize {
        if let Some(&slot) = self.slots.get(&page) {
            return slot;
        }
        self.entries.push(AlignedEntry::new(page, String::new(), source));
        let slot = self.entries.len() - 1;
        self.slots.insert(page, slot);
        slot
    }

    fn has_unused(&self, page: u32) -> bool {
        self.assets
            .iter()
            .any(|a| a.page() == page && !self.used.contains(a.path()))
    }

    /// Pages that hold at least one asset, used or not, ascending.
    fn image_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.assets.iter().map(|a| a.page()).collect();
        pages.dedup();
        pages
    }

    fn claim_page(&mut self, slot: usize, page: u32) {
        for asset in &self.assets {
            if asset.page() == page && self.used.insert(asset.path()) {
                self.entries[slot].attach_image(asset.path());
            }
        }
    }

    fn push_page(&mut self, page: u32, paragraph: &str, source: &str) {
        let key = PageRef::Page(page);
        if let Some(&slot) = self.slots.get(&key) {
            self.entries[slot].push_paragraph(paragraph);
            return;
        }
        let slot = self.slot(key, source);
        self.entries[slot].push_paragraph(paragraph);
        self.claim_page(slot, page);
    }

    /// The unmatched bucket takes one unused asset per paragraph it receives.
    fn push_unmatched(&mut self, paragraph: &str, source: &str) {
        let slot = self.slot(PageRef::Unmatched, source);
        self.entries[slot].push_paragraph(paragraph);
        let next = self
            .assets
            .iter()
            .map(|a| a.path())
            .find(|path| !self.used.contains(path));
        if let Some(path) = next {
            self.used.insert(path);
            self.entries[slot].attach_image(path);
        }
    }

    fn finish(mut self) -> Vec<AlignedEntry> {
        self.entries.sort_by_key(|e| e.page);

        let leftovers: Vec<&str> = self
            .assets
            .iter()
            .map(|a| a.path())
            .filter(|path| !self.used.contains(path))
            .collect();
        if let Some(last) = self.entries.last_mut() {
            for path in leftovers {
                last.attach_image(path);
            }
        } else if !leftovers.is_empty() {
            log::warn!("{} images left without an entry", leftovers.len());
        }
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{LexicalIndex, VectorIndex};
    use crate::error::{Error, Result};
    use crate::model::TextChunk;

    fn pages(texts: &[&str]) -> PageTextIndex {
        let chunks: Vec<TextChunk> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(|(i, t)| TextChunk::new(*t, i as u32 + 1).unwrap())
            .collect();
        PageTextIndex::from_chunks(&chunks)
    }

    /// Returns canned neighbors; queries containing "fail" error out.
    struct FixedIndex(Vec<Neighbor>);

    impl SemanticIndex for FixedIndex {
        fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
            if query.contains("fail") {
                return Err(Error::Service("boom".to_string()));
            }
            Ok(self.0.iter().take(k).copied().collect())
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    fn all_paths(entries: &[AlignedEntry]) -> Vec<&str> {
        entries
            .iter()
            .flat_map(|e| e.images.iter().map(String::as_str))
            .collect()
    }

    #[test]
    fn test_visual_page_gets_placeholder() {
        let pages = pages(&[
            "Mitochondria produce cellular energy through respiration in eukaryotic cells.",
            "Figure overview of the experimental apparatus.",
            "Glaciers retreat as global temperatures rise across polar regions.",
        ]);
        let assets = vec![ImageAsset::raster("images/j_page2_img1.png", 2).unwrap()];
        let index = LexicalIndex::build(&pages);
        let summary = "Mitochondria generate energy for cells through respiration.\n\n\
                       Polar glaciers retreat when global temperatures rise.";

        let request = AlignmentRequest::new(summary, &pages, &assets).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);

        let order: Vec<PageRef> = entries.iter().map(|e| e.page).collect();
        assert_eq!(order, vec![PageRef::Page(1), PageRef::Page(2), PageRef::Page(3)]);
        assert_eq!(entries[1].response, "This page primarily contains visual elements.");
        assert_eq!(entries[1].source_text, "Figure overview of the experimental apparatus.");
        assert_eq!(entries[1].images, vec!["images/j_page2_img1.png"]);
        assert!(entries[0].images.is_empty());
        assert!(entries[2].source_text.starts_with("Glaciers"));
    }

    #[test]
    fn test_dense_index_keeps_paragraphs_on_their_pages() {
        let pages = pages(&["first page", "image page", "third page"]);
        let assets = vec![ImageAsset::raster("images/j_page2_img1.png", 2).unwrap()];
        let summary = "About page one.\n\nAbout page three.";
        let index = VectorIndex::from_embeddings(
            vec![
                (1, vec![1.0, 0.2, 0.1]),
                (2, vec![0.3, 0.3, 0.3]),
                (3, vec![0.1, 0.2, 1.0]),
            ],
            vec![
                ("About page one.".to_string(), vec![1.0, 0.1, 0.1]),
                ("About page three.".to_string(), vec![0.1, 0.1, 1.0]),
            ],
        )
        .unwrap();
        assert_eq!(index.nearest("About page one.", 5).unwrap().len(), 3);

        let request = AlignmentRequest::new(summary, &pages, &assets).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);
        let order: Vec<PageRef> = entries.iter().map(|e| e.page).collect();
        assert_eq!(order, vec![PageRef::Page(1), PageRef::Page(2), PageRef::Page(3)]);
        assert_eq!(entries[0].response, "About page one.");
        assert_eq!(entries[1].response, "This page primarily contains visual elements.");
        assert_eq!(entries[1].images, vec!["images/j_page2_img1.png"]);
        assert_eq!(entries[2].response, "About page three.");

        // Without a margin the image page takes the first paragraph.
        let eager = AlignmentEngine::with_options(AlignOptions::new().with_preference_margin(0.0));
        let entries = eager.align(&request);
        let order: Vec<PageRef> = entries.iter().map(|e| e.page).collect();
        assert_eq!(order, vec![PageRef::Page(2), PageRef::Page(3)]);
        assert_eq!(entries[0].response, "About page one.");
    }

    #[test]
    fn test_visual_page_kept_after_unmatched_takes_its_image() {
        let pages = pages(&[
            "Mitochondria produce cellular energy through respiration.",
            "Figure overview of the apparatus.",
            "Glaciers retreat as temperatures rise.",
        ]);
        let assets = vec![ImageAsset::raster("images/p2.png", 2).unwrap()];
        let index = LexicalIndex::build(&pages);
        let summary = "Zebras gallop quickly.\n\nMitochondria generate energy.";

        let request = AlignmentRequest::new(summary, &pages, &assets).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);

        let order: Vec<PageRef> = entries.iter().map(|e| e.page).collect();
        assert_eq!(order, vec![PageRef::Page(1), PageRef::Page(2), PageRef::Unmatched]);
        assert_eq!(entries[1].response, "This page primarily contains visual elements.");
        assert!(entries[1].images.is_empty());
        assert_eq!(entries[2].images, vec!["images/p2.png"]);
    }

    #[test]
    fn test_paragraphs_on_same_page_merge() {
        let pages = pages(&["alpha"]);
        let index = FixedIndex(vec![Neighbor { page: 1, score: 1.0 }]);
        let request = AlignmentRequest::new("first\n\nsecond", &pages, &[]).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, "first\n\nsecond");
        assert_eq!(entries[0].source_text, "alpha");
    }

    #[test]
    fn test_prefers_page_with_unused_image_within_margin() {
        let pages = pages(&["one", "two"]);
        let assets = vec![ImageAsset::raster("images/p2.png", 2).unwrap()];

        let close = FixedIndex(vec![
            Neighbor { page: 1, score: 0.9 },
            Neighbor { page: 2, score: 0.8 },
        ]);
        let request = AlignmentRequest::new("para", &pages, &assets).with_index(&close);
        let entries = AlignmentEngine::new().align(&request);
        assert_eq!(entries[0].page, PageRef::Page(2));
        assert_eq!(entries[0].response, "para");
        assert_eq!(entries.len(), 1);

        let far = FixedIndex(vec![
            Neighbor { page: 1, score: 0.9 },
            Neighbor { page: 2, score: 0.5 },
        ]);
        let request = AlignmentRequest::new("para", &pages, &assets).with_index(&far);
        let entries = AlignmentEngine::new().align(&request);
        assert_eq!(entries[0].page, PageRef::Page(1));
        assert_eq!(entries[1].page, PageRef::Page(2));
        assert_eq!(entries[1].images, vec!["images/p2.png"]);
    }

    #[test]
    fn test_no_index_uses_unmatched_bucket() {
        let pages = pages(&["one", "two"]);
        let assets = vec![
            ImageAsset::raster("images/b.png", 2).unwrap(),
            ImageAsset::raster("images/a.png", 1).unwrap(),
            ImageAsset::chart("images/c.png", 2).unwrap(),
        ];
        let request = AlignmentRequest::new("p1\n\np2", &pages, &assets);
        let entries = AlignmentEngine::new().align(&request);

        // Two paragraphs claim two assets in page order; page 2 keeps the rest
        // and page 1 still gets an entry after losing its only image.
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].page, PageRef::Page(1));
        assert_eq!(entries[0].response, "This page primarily contains visual elements.");
        assert_eq!(entries[0].source_text, "one");
        assert!(entries[0].images.is_empty());
        assert_eq!(entries[1].page, PageRef::Page(2));
        assert_eq!(entries[1].images, vec!["images/c.png"]);
        assert_eq!(entries[2].page, PageRef::Unmatched);
        assert_eq!(entries[2].response, "p1\n\np2");
        assert_eq!(entries[2].source_text, "Could not extract source text.");
        assert_eq!(entries[2].images, vec!["images/a.png", "images/b.png"]);
    }

    #[test]
    fn test_failed_lookup_is_kept() {
        let pages = pages(&["one"]);
        let index = FixedIndex(vec![Neighbor { page: 1, score: 1.0 }]);
        let request =
            AlignmentRequest::new("this will fail\n\nfine", &pages, &[]).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].page, PageRef::Page(1));
        assert_eq!(entries[1].page, PageRef::NotFound);
        assert_eq!(entries[1].response, "this will fail");
        assert_eq!(entries[1].source_text, "Source text not found");
        assert!(entries[1].images.is_empty());
    }

    #[test]
    fn test_captions_append_or_create() {
        let pages = pages(&["one", "", "three"]);
        let assets = vec![ImageAsset::raster("images/p2.png", 2).unwrap()];
        let index = FixedIndex(vec![Neighbor { page: 1, score: 1.0 }]);
        let mut captions = PageCaptions::new();
        captions.insert(1, vec!["A chart.".to_string(), "A photo.".to_string()]);
        captions.insert(2, vec!["A diagram.".to_string()]);

        let request = AlignmentRequest::new("para", &pages, &assets)
            .with_index(&index)
            .with_captions(&captions);
        let entries = AlignmentEngine::new().align(&request);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].response, "para\n\nImage Summary:\nA chart.\nA photo.");
        assert_eq!(entries[1].page, PageRef::Page(2));
        assert_eq!(entries[1].response, "Image Summary:\nA diagram.");
        assert_eq!(entries[1].source_text, "Image content");
        assert_eq!(entries[1].images, vec!["images/p2.png"]);
    }

    #[test]
    fn test_visual_page_without_text() {
        let pages = pages(&["one"]);
        let assets = vec![ImageAsset::chart("images/p4.png", 4).unwrap()];
        let index = FixedIndex(vec![Neighbor { page: 1, score: 1.0 }]);
        let request = AlignmentRequest::new("para", &pages, &assets).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);
        assert_eq!(entries[1].page, PageRef::Page(4));
        assert_eq!(entries[1].source_text, "Content is visual.");
    }

    #[test]
    fn test_every_asset_exactly_once() {
        let pages = pages(&["a", "b", "c"]);
        let assets: Vec<ImageAsset> = (1..=3)
            .flat_map(|p| {
                vec![
                    ImageAsset::raster(format!("images/p{}_1.png", p), p).unwrap(),
                    ImageAsset::chart(format!("images/p{}_2.png", p), p).unwrap(),
                ]
            })
            .collect();
        let index = FixedIndex(vec![
            Neighbor { page: 3, score: 0.9 },
            Neighbor { page: 1, score: 0.85 },
        ]);
        let summary = "x\n\ny\n\nz\n\nfail here";
        let request = AlignmentRequest::new(summary, &pages, &assets).with_index(&index);
        let entries = AlignmentEngine::new().align(&request);

        let mut paths = all_paths(&entries);
        assert_eq!(paths.len(), assets.len());
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), assets.len());
    }

    #[test]
    fn test_citations_annotated() {
        let pages = pages(&["one"]);
        let index = FixedIndex(vec![Neighbor { page: 1, score: 1.0 }]);
        let references: ReferenceTable =
            vec![(1, "Smith et al.".to_string()), (2, "Jones et al.".to_string())]
                .into_iter()
                .collect();
        let request = AlignmentRequest::new("see [1, 2]", &pages, &[])
            .with_index(&index)
            .with_references(&references);
        let entries = AlignmentEngine::new().align(&request);
        assert!(entries[0]
            .response
            .contains(r#"<span class="citation" data-citation="1, 2""#));
    }

    #[test]
    fn test_empty_summary() {
        let pages = pages(&["one"]);
        let entries = AlignmentEngine::new().align(&AlignmentRequest::new("  ", &pages, &[]));
        assert!(entries.is_empty());
    }
}
