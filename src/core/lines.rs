/// Maps byte offsets to 1-based line numbers
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }

    /// Text of a 1-based line without its terminator
    pub fn line_text<'a>(&self, content: &'a str, line: usize) -> &'a str {
        let start = self.starts.get(line.saturating_sub(1)).copied().unwrap_or(content.len());
        let end = self.starts.get(line).map(|next| next - 1).unwrap_or(content.len());
        content[start..end.max(start)].trim_end_matches('\r')
    }
}
