// src/chunker.rs
// Splits cleaned article text into model-sized chunks, in document order.

use tracing::{debug, error};

/// Fetcher failures arrive as text with this prefix and are never split.
pub const ERROR_PREFIX: &str = "ERROR:";

/// One segment of source text submitted as a single model prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    pub source_label: Option<String>,
    pub source_url: Option<String>,
    pub text: String,
}

impl ContentChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            source_label: None,
            source_url: None,
            text: text.into(),
        }
    }

    pub fn from_source(label: &str, url: &str, text: impl Into<String>) -> Self {
        Self {
            source_label: Some(label.to_string()),
            source_url: Some(url.to_string()),
            text: text.into(),
        }
    }

    /// Text interpolated into the prompt, prefixed with its source when known.
    pub fn prompt_content(&self) -> String {
        match (&self.source_label, &self.source_url) {
            (Some(label), Some(url)) => format!("Source: {} ({})\n\n{}", label, url, self.text),
            (Some(label), None) => format!("Source: {}\n\n{}", label, self.text),
            (None, Some(url)) => format!("Source: {}\n\n{}", url, self.text),
            (None, None) => self.text.clone(),
        }
    }
}

/// Chunk a whole document, tagging every chunk with its source.
pub fn chunk_source(label: &str, url: &str, text: &str, max_chars: usize) -> Vec<ContentChunk> {
    split_content(text, max_chars)
        .into_iter()
        .map(|chunk| ContentChunk::from_source(label, url, chunk))
        .collect()
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Paragraphs (blank-line separated) are packed greedily; an oversized paragraph
/// falls back to sentences, and an oversized sentence to fixed windows. Joining
/// the chunks with the separators they were split on gives back the input.
pub fn split_content(text: &str, max_chars: usize) -> Vec<String> {
    if text.starts_with(ERROR_PREFIX) {
        return vec![text.to_string()];
    }
    if max_chars == 0 {
        error!("Refusing to split content with a zero chunk length");
        return vec![format!(
            "{} Error splitting content: chunk length must be positive",
            ERROR_PREFIX
        )];
    }
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let mut packer = Packer::new(max_chars, "\n\n");
    for paragraph in text.split("\n\n") {
        if packer.fits(paragraph) {
            packer.push(paragraph);
            continue;
        }
        packer.flush();
        if char_len(paragraph) > max_chars {
            split_sentences(paragraph, max_chars, &mut packer.chunks);
        } else {
            packer.push(paragraph);
        }
    }
    let mut chunks = packer.finish();
    if chunks.is_empty() {
        chunks.push(String::new());
    }

    debug!(chunks = chunks.len(), max_chars, "Split content");
    chunks
}

/// Greedy pack of `". "`-delimited sentences. Each sentence keeps its own period
/// so that sentences rejoin with a single space.
fn split_sentences(paragraph: &str, max_chars: usize, out: &mut Vec<String>) {
    let pieces: Vec<&str> = paragraph.split(". ").collect();
    let last = pieces.len() - 1;
    let mut packer = Packer::new(max_chars, " ");

    for (i, piece) in pieces.iter().enumerate() {
        let sentence = if i < last {
            format!("{}.", piece)
        } else {
            piece.to_string()
        };

        if packer.fits(&sentence) {
            packer.push(&sentence);
            continue;
        }
        packer.flush();
        if char_len(&sentence) > max_chars {
            out.append(&mut packer.chunks);
            out.extend(hard_slice(&sentence, max_chars));
        } else {
            packer.push(&sentence);
        }
    }

    out.extend(packer.finish());
}

/// Last resort: fixed windows of `max_chars` characters. Blank windows are dropped.
fn hard_slice(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect::<String>())
        .filter(|window| !window.trim().is_empty())
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

struct Packer {
    max_chars: usize,
    separator: &'static str,
    current: String,
    current_len: usize,
    chunks: Vec<String>,
}

impl Packer {
    fn new(max_chars: usize, separator: &'static str) -> Self {
        Self {
            max_chars,
            separator,
            current: String::new(),
            current_len: 0,
            chunks: Vec::new(),
        }
    }

    fn fits(&self, unit: &str) -> bool {
        let extra = if self.current.is_empty() {
            0
        } else {
            self.separator.len()
        };
        self.current_len + extra + char_len(unit) <= self.max_chars
    }

    fn push(&mut self, unit: &str) {
        if !self.current.is_empty() {
            self.current.push_str(self.separator);
            self.current_len += self.separator.len();
        }
        self.current.push_str(unit);
        self.current_len += char_len(unit);
    }

    fn flush(&mut self) {
        if !self.current.trim().is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
        self.current_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "Digital health funding rebounded in Q3.";
        assert_eq!(split_content(text, 100), vec![text.to_string()]);
        assert_eq!(split_content("", 10), vec![String::new()]);
    }

    #[test]
    fn test_hard_slice_of_unbroken_text() {
        let text = "A".repeat(100);
        let chunks = split_content(&text, 40);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 40));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_paragraphs_are_packed_greedily() {
        let text = "alpha alpha\n\nbeta beta\n\ngamma gamma gamma gamma";
        let chunks = split_content(text, 24);
        assert_eq!(chunks, vec!["alpha alpha\n\nbeta beta", "gamma gamma gamma gamma"]);
        assert_eq!(chunks.join("\n\n"), text);
    }

    #[test]
    fn test_long_paragraph_splits_on_sentences() {
        let paragraph = "Payments grew fast. Lending slowed down. Insurtech raised a record round. Regulators watched closely";
        let chunks = split_content(paragraph, 45);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 45));
        assert_eq!(chunks[0], "Payments grew fast. Lending slowed down.");
        assert_eq!(chunks.join(" "), paragraph);
    }

    #[test]
    fn test_order_and_content_preserved() {
        let text = format!(
            "{}\n\n{}\n\n{}",
            "First paragraph about telehealth adoption.",
            "Second paragraph. It has two sentences about wearables that run long enough.",
            "Z".repeat(70)
        );
        let chunks = split_content(&text, 30);

        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
        assert_eq!(squash(&chunks.join(" ")), squash(&text));
        assert!(chunks[0].starts_with("First"));
    }

    #[test]
    fn test_blank_runs_never_produce_empty_chunks() {
        let text = format!("{}\n\n\n\n\n\n{}", "x".repeat(20), "y".repeat(20));
        let chunks = split_content(&text, 20);
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
        assert_eq!(squash(&chunks.join(" ")), squash(&text));
    }

    #[test]
    fn test_whitespace_paragraph_is_not_sliced_into_chunks() {
        let text = format!("{}\n\n{}\n\n{}", "A".repeat(10), " ".repeat(50), "B".repeat(10));
        let chunks = split_content(&text, 20);
        assert_eq!(chunks, vec!["A".repeat(10), "B".repeat(10)]);

        let blank = " ".repeat(50);
        assert_eq!(split_content(&blank, 20), vec![String::new()]);
    }

    #[test]
    fn test_multibyte_text_is_sliced_on_char_boundaries() {
        let text = "é".repeat(25);
        let chunks = split_content(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_error_text_passes_through() {
        let text = format!("ERROR: Failed to fetch page {}", "x".repeat(200));
        assert_eq!(split_content(&text, 10), vec![text.clone()]);
    }

    #[test]
    fn test_zero_length_reports_error_chunk() {
        let chunks = split_content("some text", 0);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("ERROR:"));
    }

    #[test]
    fn test_prompt_content_includes_source() {
        let chunk = ContentChunk::from_source("Finextra", "https://www.finextra.com/", "Body");
        assert_eq!(
            chunk.prompt_content(),
            "Source: Finextra (https://www.finextra.com/)\n\nBody"
        );
        assert_eq!(ContentChunk::new("Body").prompt_content(), "Body");
    }

    #[test]
    fn test_chunk_source_tags_every_chunk() {
        let chunks = chunk_source("MedCityNews", "https://medcitynews.com/", &"B".repeat(50), 20);
        assert_eq!(chunks.len(), 3);
        assert!(chunks
            .iter()
            .all(|c| c.source_label.as_deref() == Some("MedCityNews")));
    }
}
