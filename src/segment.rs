//! Document segmentation.
//!
//! Splits raw source text into bounded chunks with section metadata:
//! 1. Normalize whitespace (blank-line runs and space runs collapse).
//! 2. Partition into sections on literal header lines.
//! 3. Strip citation markers and URLs, drop noise paragraphs.
//! 4. Greedily pack paragraphs into chunks bounded by `max_chunk_chars`,
//!    splitting oversize paragraphs at a sentence boundary when one exists.
//!
//! Malformed input never errors: text without headers becomes one section
//! under the default title, and a section with nothing above the noise
//! thresholds simply yields no chunks.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::config::SegmenterConfig;

/// A bounded span of source text plus section metadata, the unit of
/// indexing and retrieval. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    pub section_title: String,
    pub source_id: String,
    pub sequence_index: usize,
}

struct Section {
    title: String,
    body: String,
}

pub struct Segmenter {
    config: SegmenterConfig,
    blank_lines: Regex,
    space_runs: Regex,
    citation_markers: Regex,
    urls: Regex,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            blank_lines: Regex::new(r"\n\s*\n").expect("static regex"),
            space_runs: Regex::new(r" +").expect("static regex"),
            citation_markers: Regex::new(r"\[\d+\]").expect("static regex"),
            urls: Regex::new(r"https?://\S+").expect("static regex"),
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `raw_text` into chunks attributed to `source_id`.
    pub fn segment(&self, raw_text: &str, source_id: &str) -> Vec<DocumentChunk> {
        let normalized = self.normalize(raw_text);
        let sections = self.partition_sections(&normalized);

        let mut chunks = Vec::new();
        let mut sequence_index = 0usize;

        for section in sections {
            if self.is_excluded(&section.title) {
                tracing::debug!(section = %section.title, "skipping excluded section");
                continue;
            }
            if section.body.chars().count() < self.config.min_section_chars {
                continue;
            }

            let cleaned = self.clean(&section.body);
            let paragraphs = self.keep_paragraphs(&cleaned);
            self.pack_paragraphs(
                &paragraphs,
                &section.title,
                source_id,
                &mut sequence_index,
                &mut chunks,
            );
        }

        chunks
    }

    fn normalize(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n");
        let text = self.blank_lines.replace_all(&text, "\n\n");
        self.space_runs.replace_all(&text, " ").into_owned()
    }

    /// Scan lines against the configured literal headers. Text before the
    /// first header falls under the default title.
    fn partition_sections(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current_title = self.config.default_section_title.clone();
        let mut current_lines: Vec<&str> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if self
                .config
                .section_markers
                .iter()
                .any(|marker| marker == trimmed)
            {
                Self::close_section(&mut sections, &current_title, &mut current_lines);
                current_title = trimmed.to_string();
            } else {
                current_lines.push(trimmed);
            }
        }
        Self::close_section(&mut sections, &current_title, &mut current_lines);

        sections
    }

    fn close_section(sections: &mut Vec<Section>, title: &str, lines: &mut Vec<&str>) {
        let body = lines.join("\n").trim().to_string();
        lines.clear();
        if !body.is_empty() {
            sections.push(Section {
                title: title.to_string(),
                body,
            });
        }
    }

    fn is_excluded(&self, title: &str) -> bool {
        let lowered = title.to_lowercase();
        self.config
            .excluded_sections
            .iter()
            .any(|keyword| lowered.contains(keyword.to_lowercase().as_str()))
    }

    fn clean(&self, body: &str) -> String {
        let body = self.citation_markers.replace_all(body, "");
        self.urls.replace_all(&body, "").into_owned()
    }

    /// Split on blank-line boundaries and drop paragraphs that are too short
    /// or look like link lists.
    fn keep_paragraphs<'a>(&self, body: &'a str) -> Vec<&'a str> {
        body.split("\n\n")
            .map(str::trim)
            .filter(|paragraph| {
                paragraph.chars().count() >= self.config.min_paragraph_chars
            })
            .filter(|paragraph| {
                let bracket_count = paragraph.matches('[').count();
                !paragraph.to_lowercase().contains("http")
                    && bracket_count <= self.config.max_paragraph_brackets
            })
            .collect()
    }

    fn pack_paragraphs(
        &self,
        paragraphs: &[&str],
        section_title: &str,
        source_id: &str,
        sequence_index: &mut usize,
        chunks: &mut Vec<DocumentChunk>,
    ) {
        let max = self.config.max_chunk_chars;
        let mut current: Vec<&str> = Vec::new();
        let mut current_chars = 0usize;

        for paragraph in paragraphs {
            let paragraph_chars = paragraph.chars().count();

            if paragraph_chars > max {
                self.flush(&mut current, &mut current_chars, section_title, source_id, sequence_index, chunks);
                for piece in self.split_oversize(paragraph) {
                    self.emit(&piece, section_title, source_id, sequence_index, chunks);
                }
                continue;
            }

            // Separator counts toward the bound so joined chunks never exceed it.
            let separator = if current.is_empty() { 0 } else { 2 };
            if current_chars + separator + paragraph_chars > max && !current.is_empty() {
                self.flush(&mut current, &mut current_chars, section_title, source_id, sequence_index, chunks);
            }

            if !current.is_empty() {
                current_chars += 2;
            }
            current.push(paragraph);
            current_chars += paragraph_chars;
        }

        self.flush(&mut current, &mut current_chars, section_title, source_id, sequence_index, chunks);
    }

    fn flush(
        &self,
        current: &mut Vec<&str>,
        current_chars: &mut usize,
        section_title: &str,
        source_id: &str,
        sequence_index: &mut usize,
        chunks: &mut Vec<DocumentChunk>,
    ) {
        if current.is_empty() {
            return;
        }
        let text = current.join("\n\n");
        current.clear();
        *current_chars = 0;
        self.emit(&text, section_title, source_id, sequence_index, chunks);
    }

    fn emit(
        &self,
        text: &str,
        section_title: &str,
        source_id: &str,
        sequence_index: &mut usize,
        chunks: &mut Vec<DocumentChunk>,
    ) {
        let text = text.trim();
        if text.chars().count() < self.config.min_chunk_chars {
            tracing::debug!(
                section = %section_title,
                chars = text.chars().count(),
                "dropping sub-minimum chunk"
            );
            return;
        }
        chunks.push(DocumentChunk {
            text: text.to_string(),
            section_title: section_title.to_string(),
            source_id: source_id.to_string(),
            sequence_index: *sequence_index,
        });
        *sequence_index += 1;
    }

    /// Cut an oversize paragraph into windows of at most `max_chunk_chars`,
    /// preferring a sentence boundary in the tail of each window.
    fn split_oversize(&self, paragraph: &str) -> Vec<String> {
        let max = self.config.max_chunk_chars;
        let chars: Vec<char> = paragraph.chars().collect();
        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < chars.len() {
            let end = (start + max).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let window = if end < chars.len() {
                trim_to_sentence_boundary(&window)
            } else {
                window
            };
            let consumed = window.chars().count().max(1);
            pieces.push(window.trim().to_string());
            start += consumed;
        }

        pieces
    }
}

/// Look for a sentence ending in the last fifth of the window and cut there.
/// Returns the window unchanged when no boundary is found.
fn trim_to_sentence_boundary(window: &str) -> String {
    const ENDINGS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let char_count = window.chars().count();
    let search_from_char = (char_count * 4) / 5;
    let search_from_byte = window
        .char_indices()
        .nth(search_from_char)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    let tail = &window[search_from_byte..];
    let mut best: Option<usize> = None;
    for ending in ENDINGS {
        if let Some(pos) = tail.rfind(ending) {
            let cut = search_from_byte + pos + ending.len();
            best = Some(best.map_or(cut, |b: usize| b.max(cut)));
        }
    }

    match best {
        Some(cut) => window[..cut].to_string(),
        None => window.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_config(markers: &[&str]) -> SegmenterConfig {
        SegmenterConfig {
            section_markers: markers.iter().map(|m| m.to_string()).collect(),
            ..SegmenterConfig::default()
        }
    }

    #[test]
    fn chunks_never_exceed_configured_maximum() {
        let config = SegmenterConfig {
            max_chunk_chars: 300,
            min_chunk_chars: 50,
            min_paragraph_chars: 10,
            min_section_chars: 10,
            ..marker_config(&["Intro"])
        };
        let segmenter = Segmenter::new(config);

        let paragraph = "A sentence with enough words to count. ".repeat(4);
        let text = format!("Intro\n{}\n\n{}\n\n{}", paragraph, paragraph, paragraph);
        let chunks = segmenter.segment(&text, "doc");

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 300, "oversize chunk emitted");
        }
    }

    #[test]
    fn excluded_sections_are_never_chunked() {
        let config = SegmenterConfig {
            min_section_chars: 10,
            min_paragraph_chars: 10,
            min_chunk_chars: 10,
            ..marker_config(&["History", "References"])
        };
        let segmenter = Segmenter::new(config);

        let text = "History\nRobots have a long and well documented history in industry.\n\nReferences\nSmith, Robotics Quarterly, volume twelve, pages one through nine.\n";
        let chunks = segmenter.segment(text, "doc");

        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.section_title == "History"));
    }

    #[test]
    fn oversize_paragraph_scenario_yields_single_chunk() {
        let config = SegmenterConfig {
            max_chunk_chars: 1500,
            min_chunk_chars: 200,
            ..marker_config(&["Header A", "Header B"])
        };
        let segmenter = Segmenter::new(config);

        let text = format!("Header A\nShort.\n\nHeader B\n{}", "x".repeat(1600));
        let chunks = segmenter.segment(&text, "doc");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_title, "Header B");
        assert!(chunks[0].text.chars().count() <= 1500);
    }

    #[test]
    fn headerless_text_falls_under_default_title() {
        let config = SegmenterConfig {
            min_section_chars: 10,
            min_paragraph_chars: 10,
            min_chunk_chars: 10,
            ..SegmenterConfig::default()
        };
        let segmenter = Segmenter::new(config);

        let chunks = segmenter.segment(
            "No headers here, just a plain paragraph of reasonable length.",
            "doc",
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_title, "Untitled");
    }

    #[test]
    fn link_lists_and_citations_are_stripped() {
        let config = SegmenterConfig {
            min_section_chars: 10,
            min_paragraph_chars: 10,
            min_chunk_chars: 10,
            ..marker_config(&["Body"])
        };
        let segmenter = Segmenter::new(config);

        let text = "Body\nActuators convert stored energy into movement [12] in most robots.\n\nSee https://example.com/robots for a full list of vendors online.\n";
        let chunks = segmenter.segment(text, "doc");

        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].text.contains("[12]"));
        assert!(!chunks[0].text.contains("http"));
    }

    #[test]
    fn whitespace_normalization_collapses_runs() {
        let segmenter = Segmenter::new(SegmenterConfig::default());
        let normalized = segmenter.normalize("a    b\n\n\n\nc");
        assert_eq!(normalized, "a b\n\nc");
    }

    #[test]
    fn sentence_boundary_cut_prefers_tail_endings() {
        let window = format!("{}. Tail starts here", "word ".repeat(50).trim_end());
        let cut = trim_to_sentence_boundary(&window);
        assert!(cut.ends_with(". "));
    }

    #[test]
    fn sequence_indices_are_contiguous() {
        let config = SegmenterConfig {
            max_chunk_chars: 120,
            min_chunk_chars: 20,
            min_paragraph_chars: 10,
            min_section_chars: 10,
            ..marker_config(&["One", "Two"])
        };
        let segmenter = Segmenter::new(config);

        let para = "Sensors let a robot perceive the world around it fully.";
        let text = format!("One\n{para}\n\n{para}\n\nTwo\n{para}\n\n{para}");
        let chunks = segmenter.segment(&text, "doc");

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
        }
    }
}
