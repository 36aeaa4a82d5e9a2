//! Text editor state shared with input methods.
//!
//! Offsets are in runes (`char`s). Platforms that speak UTF-16 convert with
//! [`ImeState::utf16_index`] / [`ImeState::runes_index`], which are exact only
//! inside the cached snippet.

use crate::geom::PointF;

/// Rune range. `start > end` is allowed for selections (caret at `end`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn caret(at: usize) -> Self {
        Self::new(at, at)
    }

    /// Same range with `start <= end`.
    #[inline]
    pub fn normalized(self) -> Self {
        if self.start > self.end {
            Self::new(self.end, self.start)
        } else {
            self
        }
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Caret {
    pub pos: PointF,
    pub ascent: f32,
    pub descent: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection {
    pub range: TextRange,
    pub caret: Caret,
}

/// Window of text around the selection, cached for input methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snippet {
    pub range: TextRange,
    pub text: String,
}

/// What the focused editor publishes each frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub selection: Selection,
    pub snippet: Snippet,
}

/// Editor state as seen by the platform: the published state plus the
/// composing region the input method is working on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImeState {
    pub editor: EditorState,
    pub compose: Option<TextRange>,
}

impl ImeState {
    /// Replace the runes in `r` with `text`, keeping selection, composing
    /// region and snippet consistent with the edit.
    pub fn replace(&mut self, r: TextRange, text: &str) {
        let r = r.normalized();
        let inserted = text.chars().count();
        let new_end = r.start + inserted;

        let adjust = |pos: usize| -> usize {
            if new_end < pos && pos <= r.end {
                new_end
            } else if r.end < pos {
                pos - r.end + new_end
            } else {
                pos
            }
        };

        let sel = &mut self.editor.selection.range;
        sel.start = adjust(sel.start);
        sel.end = adjust(sel.end);
        if let Some(c) = self.compose.as_mut() {
            c.start = adjust(c.start);
            c.end = adjust(c.end);
        }

        let mut s = std::mem::take(&mut self.editor.snippet);
        if r.end < s.range.start || r.start > s.range.end {
            // Edit doesn't touch the cached window; restart it at the edit.
            s = Snippet {
                range: TextRange::caret(r.start),
                text: String::new(),
            };
        }

        let old: Vec<char> = s.text.chars().collect();
        let mut spliced = String::with_capacity(s.text.len() + text.len());
        if r.start > s.range.start {
            let n = (r.start - s.range.start).min(old.len());
            spliced.extend(&old[..n]);
        }
        spliced.push_str(text);
        if r.end < s.range.end {
            let from = (r.end - s.range.start).min(old.len());
            spliced.extend(&old[from..]);
        }

        if r.start < s.range.start {
            s.range.start = r.start;
        }
        s.range.end = s.range.start + spliced.chars().count();
        s.text = spliced;
        self.editor.snippet = s;
    }

    /// Rune offset to UTF-16 offset.
    pub fn utf16_index(&self, runes: usize) -> usize {
        let sn = &self.editor.snippet;
        if runes < sn.range.start {
            return runes;
        }
        let mut chars = sn.range.start;
        let mut left = runes - sn.range.start;
        for c in sn.text.chars() {
            if left == 0 {
                break;
            }
            left -= 1;
            chars += c.len_utf16();
        }
        chars + left
    }

    /// UTF-16 offset to rune offset. An offset in the middle of a surrogate
    /// pair resolves to the rune after the pair.
    pub fn runes_index(&self, chars: usize) -> usize {
        let sn = &self.editor.snippet;
        if chars < sn.range.start {
            return chars;
        }
        let mut runes = sn.range.start;
        let mut left = chars - sn.range.start;
        for c in sn.text.chars() {
            if left == 0 {
                break;
            }
            left = left.saturating_sub(c.len_utf16());
            runes += 1;
        }
        runes + left
    }
}
