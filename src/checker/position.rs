/// Table of line-start offsets for one document.
///
/// Entry 0 is always 0; every `\n` appends the offset right after it.
/// Columns are byte-based, matching the byte spans carried by tokens and issues.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { starts }
    }

    /// Map a byte offset to a 1-based `(line, col)` pair in O(log lines).
    pub fn offset_to_position(&self, offset: usize) -> (usize, usize) {
        let line_idx = self
            .starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.starts[line_idx];
        (line_idx + 1, offset - line_start + 1)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
