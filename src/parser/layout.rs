//! Layout analysis: header/footer filtering and span → line → block grouping.
//!
//! Works in page space (y grows downwards), so reading order is ascending y.

use std::cmp::Ordering;

use super::content::TextSpan;

/// Width of the vertical slices used when looking for a column gutter.
const SLICE_WIDTH: f32 = 3.0;
/// Narrowest gap accepted as a gutter.
const MIN_GUTTER: f32 = 12.0;
/// Narrowest column accepted on either side of a gutter.
const MIN_COLUMN_WIDTH: f32 = 80.0;

/// A text line composed of spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by x
    pub spans: Vec<TextSpan>,
    /// Baseline position
    pub baseline: f32,
    /// Leftmost x position
    pub x: f32,
    /// Dominant font size in this line
    pub font_size: f32,
}

impl TextLine {
    /// Create a line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal));

        let total_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
        let weighted: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.chars().count() as f32)
            .sum();
        let font_size = if total_chars > 0 {
            weighted / total_chars as f32
        } else {
            spans.first().map(|s| s.font_size).unwrap_or(0.0)
        };

        Self {
            baseline: spans.first().map(|s| s.baseline()).unwrap_or(0.0),
            x: spans.first().map(|s| s.bbox.x0).unwrap_or(0.0),
            font_size,
            spans,
        }
    }

    /// Combined text with spaces inserted at visible gaps.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.bbox.x0 - prev.bbox.x1;
                let chars = span.text.chars().count().max(1) as f32;
                let avg_char_width = (span.bbox.width() / chars).max(span.font_size * 0.25);

                let needs_space = gap > avg_char_width * 0.2
                    && !(prev.text.chars().last().is_some_and(is_spaceless_script_char)
                        && span.text.chars().next().is_some_and(is_spaceless_script_char))
                    && !prev.text.ends_with(char::is_whitespace)
                    && !span.text.starts_with(char::is_whitespace);
                if needs_space {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }
        result
    }
}

/// A paragraph-like group of lines.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Lines joined with single spaces.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// Horizontal extent of one text column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub left: f32,
    pub right: f32,
}

impl Column {
    fn contains_span(&self, span: &TextSpan) -> bool {
        let center = (span.bbox.x0 + span.bbox.x1) / 2.0;
        center >= self.left && center < self.right
    }
}

/// Drop spans lying entirely inside the top or bottom `band` of the page.
pub fn filter_header_footer(spans: Vec<TextSpan>, page_height: f32, band: f32) -> Vec<TextSpan> {
    let header_limit = page_height * band;
    let footer_limit = page_height * (1.0 - band);
    let before = spans.len();

    let kept: Vec<TextSpan> = spans
        .into_iter()
        .filter(|s| !(s.bbox.y1 <= header_limit || s.bbox.y0 >= footer_limit))
        .collect();

    if kept.len() != before {
        log::debug!(
            "dropped {} header/footer spans (band {:.0}%)",
            before - kept.len(),
            band * 100.0
        );
    }
    kept
}

/// Detect a two-column layout from a vertical gutter free of text.
pub fn detect_columns(spans: &[TextSpan]) -> Vec<Column> {
    let Some(min_x) = spans.iter().map(|s| s.bbox.x0).min_by(f32::total_cmp) else {
        return Vec::new();
    };
    let max_x = spans
        .iter()
        .map(|s| s.bbox.x1)
        .max_by(f32::total_cmp)
        .unwrap_or(min_x);
    let single = vec![Column {
        left: f32::NEG_INFINITY,
        right: f32::INFINITY,
    }];

    let width = max_x - min_x;
    if width < 2.0 * MIN_COLUMN_WIDTH + MIN_GUTTER {
        return single;
    }

    let slices = (width / SLICE_WIDTH) as usize + 1;
    let mut occupancy = vec![0usize; slices];
    for span in spans {
        let start = ((span.bbox.x0 - min_x) / SLICE_WIDTH) as usize;
        let end = (((span.bbox.x1 - min_x) / SLICE_WIDTH) as usize).min(slices - 1);
        for slot in occupancy.iter_mut().take(end + 1).skip(start) {
            *slot += 1;
        }
    }

    // Widest empty run in the middle 70% of the text area.
    let (search_start, search_end) = (slices * 15 / 100, slices * 85 / 100);
    let mut best: Option<(usize, usize)> = None;
    let mut run_start = None;
    for i in search_start..=search_end {
        let empty = i < search_end && occupancy[i] == 0;
        match (empty, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                let len = i - start;
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((start, len));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    let Some((gap_start, gap_len)) = best else {
        return single;
    };
    if gap_len as f32 * SLICE_WIDTH < MIN_GUTTER {
        return single;
    }

    let gutter = min_x + (gap_start as f32 + gap_len as f32 / 2.0) * SLICE_WIDTH;
    if gutter - min_x < MIN_COLUMN_WIDTH || max_x - gutter < MIN_COLUMN_WIDTH {
        return single;
    }

    let left = spans
        .iter()
        .filter(|s| (s.bbox.x0 + s.bbox.x1) / 2.0 < gutter)
        .count();
    let right = spans.len() - left;
    let min_spans = (spans.len() / 10).max(2);
    if left < min_spans || right < min_spans {
        return single;
    }

    log::debug!("two-column layout, gutter at x={gutter:.1}");
    vec![
        Column {
            left: f32::NEG_INFINITY,
            right: gutter,
        },
        Column {
            left: gutter,
            right: f32::INFINITY,
        },
    ]
}

/// Group spans into lines, column by column in reading order.
pub fn group_spans_into_lines(spans: Vec<TextSpan>) -> Vec<Vec<TextLine>> {
    let columns = detect_columns(&spans);
    let mut per_column: Vec<Vec<TextSpan>> = vec![Vec::new(); columns.len()];
    for span in spans {
        let idx = columns
            .iter()
            .position(|c| c.contains_span(&span))
            .unwrap_or(0);
        per_column[idx].push(span);
    }
    per_column.into_iter().map(group_column_lines).collect()
}

fn group_column_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        a.baseline()
            .partial_cmp(&b.baseline())
            .unwrap_or(Ordering::Equal)
            .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_baseline: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_baseline {
            Some(y) if (span.baseline() - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_baseline = Some(span.baseline());
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }
    lines
}

/// Group lines into blocks separated by large gaps, size changes or indentation.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let avg_spacing = average_line_spacing(&lines);
    let mut blocks = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            if should_break_block(prev, &line, avg_spacing) {
                blocks.push(TextBlock {
                    lines: std::mem::take(&mut current),
                });
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(TextBlock { lines: current });
    }
    blocks
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[1].baseline - w[0].baseline).abs())
        .filter(|s| *s > 0.1)
        .collect();
    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    let spacing = (curr.baseline - prev.baseline).abs();
    spacing > avg_spacing * 1.5
        || spacing > prev.font_size.max(curr.font_size) * 2.0
        || (prev.font_size - curr.font_size).abs() > 1.0
        || (prev.x - curr.x).abs() > 20.0
}

/// Raw page text: header/footer filtered blocks joined by blank lines.
pub fn page_text(spans: Vec<TextSpan>, page_height: f32, band: f32) -> String {
    let spans = filter_header_footer(spans, page_height, band);
    group_spans_into_lines(spans)
        .into_iter()
        .flat_map(group_lines_into_blocks)
        .map(|b| b.text())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Scripts written without word spaces (Chinese, Japanese).
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}
