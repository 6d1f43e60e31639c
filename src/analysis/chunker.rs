/// A slice of the document plus where it starts in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub start_offset: usize,
    pub text: &'a str,
}

impl Chunk<'_> {
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.text.len()
    }
}

/// Splits text into overlapping chunks whose edges fall on whitespace.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// The overlap is clamped to a quarter of the chunk size.
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size / 4),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks covering it from start to end.
    ///
    /// Each cut is pushed forward past non-whitespace (up to `size + overlap`
    /// bytes) so words stay whole; if that runs out inside a word the cut
    /// moves back to the last whitespace instead. The next chunk restarts
    /// `overlap` bytes before the cut, aligned to a word edge. Only a single
    /// run of non-whitespace longer than the chunk itself is ever cut.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Chunk<'a>> {
        let mut chunks = Vec::new();
        let len = text.len();
        let cap = self.size + self.overlap;
        let mut start = 0;

        while start < len {
            let ideal = ceil_char_boundary(text, (start + self.size).min(len));
            let mut end = ideal;
            while end < len && end - start < cap {
                match text[end..].chars().next() {
                    Some(ch) if !ch.is_whitespace() => end += ch.len_utf8(),
                    _ => break,
                }
            }
            if splits_word(text, end) {
                if let Some(cut) = last_break(text, start, ideal) {
                    end = cut;
                }
            }

            chunks.push(Chunk {
                start_offset: start,
                text: &text[start..end],
            });
            if end >= len {
                break;
            }
            start = self.next_start(text, start, end);
        }

        chunks
    }

    /// Start of the chunk after `[start, end)`: in `(start, end]`, and on a
    /// word edge whenever one exists there.
    fn next_start(&self, text: &str, start: usize, end: usize) -> usize {
        let floor = ceil_char_boundary(text, start + 1);
        let next = ceil_char_boundary(text, end.saturating_sub(self.overlap)).max(floor);

        let mut back = next;
        while back > floor && splits_word(text, back) {
            match text[..back].chars().next_back() {
                Some(ch) => back -= ch.len_utf8(),
                None => break,
            }
        }
        if !splits_word(text, back) {
            return back;
        }

        // The word reaches back past `start`: resume after it instead.
        let mut forward = next;
        while forward < end && splits_word(text, forward) {
            match text[forward..].chars().next() {
                Some(ch) => forward += ch.len_utf8(),
                None => break,
            }
        }
        forward
    }
}

/// Position just after the last whitespace in `(start, limit]`.
fn last_break(text: &str, start: usize, limit: usize) -> Option<usize> {
    text[start..limit]
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| start + idx + ch.len_utf8())
}

/// True when `at` sits between two non-whitespace characters.
fn splits_word(text: &str, at: usize) -> bool {
    let before = text[..at].chars().next_back();
    let after = text[at..].chars().next();
    matches!((before, after), (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace())
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::tokenizer::words;

    fn sample_text() -> String {
        let mut text = String::new();
        for i in 0..400 {
            text.push_str(match i % 7 {
                0 => "The quick brown fox jumps over the lazy dog. ",
                1 => "Café naïve résumé déjà vu, ",
                2 => "don't long-term self-esteem\n",
                3 => "supercalifragilisticexpialidocious ",
                4 => "a b c d e f g ",
                5 => "\t\tindented   spacing\n\n",
                _ => "end. ",
            });
        }
        text
    }

    fn assert_invariants(text: &str, chunker: Chunker) {
        let chunks = chunker.split(text);
        let tokens: Vec<_> = words(text, 0).collect();

        assert_eq!(chunks.first().map(|c| c.start_offset), Some(0));
        assert_eq!(chunks.last().map(|c| c.end_offset()), Some(text.len()));

        for pair in chunks.windows(2) {
            assert!(pair[1].start_offset > pair[0].start_offset);
            assert!(pair[1].start_offset <= pair[0].end_offset(), "gap between chunks");
        }

        for chunk in &chunks {
            for edge in [chunk.start_offset, chunk.end_offset()] {
                assert!(
                    !tokens.iter().any(|t| t.start < edge && edge < t.end),
                    "edge {edge} splits a token"
                );
            }
        }
    }

    #[test]
    fn test_chunk_larger_than_text() {
        let text = "A short document.";
        let chunks = Chunker::new(4096, 128).split(text);
        assert_eq!(chunks, vec![Chunk { start_offset: 0, text }]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(Chunker::new(512, 64).split("").is_empty());
    }

    #[test]
    fn test_overlap_clamped() {
        let chunker = Chunker::new(300, 200);
        assert_eq!(chunker.overlap(), 75);
    }

    #[test]
    fn test_boundaries_and_coverage_across_sizes() {
        let text = sample_text();
        for (size, overlap) in [(257, 0), (300, 64), (512, 128), (1024, 4000), (64, 16), (40, 10)] {
            assert_invariants(&text, Chunker::new(size, overlap));
        }
    }

    #[test]
    fn test_cut_extends_to_whitespace() {
        let text = "aaaaaaaaaa bbbb cccc";
        let chunks = Chunker::new(12, 3).split(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "aaaaaaaaaa bbbb");
        // restarts at the start of "bbbb" rather than inside it
        assert_eq!(chunks[1].start_offset, 11);
    }

    #[test]
    fn test_cut_falls_back_to_last_whitespace() {
        let text = "aaaa bbbbbbbb cccc";
        let chunks = Chunker::new(7, 0).split(text);
        assert_eq!(chunks[0].text, "aaaa ");
        assert_eq!(chunks[1].start_offset, 5);
    }

    #[test]
    fn test_progress_with_oversized_word() {
        let text = "x".repeat(50);
        let chunks = Chunker::new(4, 1).split(&text);
        assert_eq!(chunks.last().unwrap().end_offset(), 50);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_offset > pair[0].start_offset);
        }
    }

    #[test]
    fn test_multibyte_text_never_split_inside_char() {
        let text = "ééééé ééééé ééééé ééééé";
        for size in 1..12 {
            for chunk in Chunker::new(size, size / 4).split(text) {
                assert!(text.is_char_boundary(chunk.start_offset));
                assert!(text.is_char_boundary(chunk.end_offset()));
            }
        }
    }
}
