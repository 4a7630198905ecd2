//! Merging of vector-drawing bounding boxes into connected regions.

use super::geometry::Rect;

/// Merge overlapping or adjacent rectangles into maximal regions.
///
/// Every non-empty input is inflated by `inflation`; full passes over the
/// active set union intersecting pairs (the earlier rectangle absorbs the
/// later one, which leaves the set) until a pass makes no merge. Survivors
/// are deflated by `inflation` again.
pub fn merge_rects(rects: &[Rect], inflation: f32) -> Vec<Rect> {
    let mut active: Vec<Rect> = rects
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| r.inflate(inflation))
        .collect();

    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut merged_any = false;
        let mut i = 0;
        while i < active.len() {
            let mut j = i + 1;
            while j < active.len() {
                if active[i].intersects(&active[j]) {
                    let absorbed = active.swap_remove(j);
                    active[i] = active[i].union(&absorbed);
                    merged_any = true;
                    // The grown rectangle may now reach ones already visited.
                    j = i + 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        if !merged_any {
            break;
        }
    }

    log::debug!(
        "merged {} drawing rects into {} regions in {} passes",
        rects.len(),
        active.len(),
        passes
    );

    active.into_iter().map(|r| r.inflate(-inflation)).collect()
}
