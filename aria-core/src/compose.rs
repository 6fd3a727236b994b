/// Hard ceiling on the composition buffer, in whitespace-delimited words.
pub const WORD_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Accepted,

    /// The edit crossed the word limit. The buffer now holds the first
    /// `WORD_LIMIT` words; everything past that mark was rejected.
    Truncated,
}

/// Composition buffer for the message input field.
///
/// Owned independently of the session controller: a failed submission hands
/// the text back so the user can retry, and a successful one clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeBuffer {
    text: String,
}

impl ComposeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Replace the buffer with an edited value, enforcing the word limit on
    /// the edit itself.
    pub fn apply_edit(&mut self, edited: &str) -> EditOutcome {
        let words: Vec<&str> = edited.split_whitespace().collect();
        if words.len() > WORD_LIMIT {
            self.text = words[..WORD_LIMIT].join(" ");
            EditOutcome::Truncated
        } else {
            self.text = edited.to_string();
            EditOutcome::Accepted
        }
    }

    /// Take the contents for submission, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Hand back text after a failed submission so the user can retry.
    pub fn restore(&mut self, text: String) {
        self.text = text;
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}
