//! Inline user mentions in post and comment content
//!
//! Offsets and lengths count characters (Unicode scalar values), not bytes.
//! A mention always covers the `@` and the handle after it.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::models::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub user_id: String,
    pub offset: usize,
    pub length: usize,
}

impl Mention {
    /// Offset just past the mention; `None` when it does not fit in `usize`
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}

/// Check that every mention points at an `@handle` inside `content`
/// and that no two overlap
pub fn validate_mentions(content: &str, mentions: &[Mention]) -> Result<()> {
    let chars: Vec<char> = content.chars().collect();
    let mut sorted: Vec<&Mention> = mentions.iter().collect();
    sorted.sort_by_key(|m| m.offset);

    let mut previous_end = 0;
    for mention in sorted {
        if mention.user_id.trim().is_empty() {
            return Err(ClientError::Validation(format!(
                "Mention at offset {} has no user",
                mention.offset
            )));
        }
        if mention.length < 2 {
            return Err(ClientError::Validation(format!(
                "Mention at offset {} is empty",
                mention.offset
            )));
        }
        let end = match mention.end() {
            Some(end) if end <= chars.len() => end,
            _ => {
                return Err(ClientError::Validation(format!(
                    "Mention at offset {} extends past the end of the content",
                    mention.offset
                )))
            }
        };
        if mention.offset < previous_end {
            return Err(ClientError::Validation(format!(
                "Mention at offset {} overlaps another mention",
                mention.offset
            )));
        }
        if chars[mention.offset] != '@' {
            return Err(ClientError::Validation(format!(
                "Mention at offset {} does not start with '@'",
                mention.offset
            )));
        }
        previous_end = end;
    }
    Ok(())
}

/// The `@query` being typed at the caret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionQuery {
    /// Offset of the `@`
    pub start: usize,
    /// Text typed after the `@`, possibly empty
    pub query: String,
}

fn is_handle_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Find the mention being typed immediately before `caret`
///
/// The `@` must start the text or follow whitespace, so e-mail addresses
/// do not open the picker.
pub fn active_mention_query(text: &str, caret: usize) -> Option<MentionQuery> {
    let chars: Vec<char> = text.chars().collect();
    if caret > chars.len() {
        return None;
    }

    let mut i = caret;
    while i > 0 {
        let c = chars[i - 1];
        if c == '@' {
            let start = i - 1;
            if start > 0 && !chars[start - 1].is_whitespace() {
                return None;
            }
            return Some(MentionQuery {
                start,
                query: chars[i..caret].iter().collect(),
            });
        }
        if !is_handle_char(c) {
            return None;
        }
        i -= 1;
    }
    None
}

/// Text after a picked user replaced the `@query`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionInsertion {
    pub text: String,
    /// Caret position after the inserted handle and trailing space
    pub caret: usize,
    pub mention: Mention,
}

/// Replace the `@query` ending at `caret` with `@username `
///
/// `mentions` is updated in place: mentions after the caret are shifted,
/// any mention overlapping the replaced range is dropped, and the new one
/// is added. The list stays sorted by offset.
pub fn insert_mention(
    text: &str,
    query: &MentionQuery,
    caret: usize,
    user: &UserSummary,
    mentions: &mut Vec<Mention>,
) -> MentionInsertion {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());
    let start = query.start.min(caret);

    let handle = format!("@{}", user.username);
    let inserted = format!("{} ", handle);
    let inserted_len = inserted.chars().count();
    let removed_len = caret - start;

    let mut new_text: String = chars[..start].iter().collect();
    new_text.push_str(&inserted);
    new_text.extend(chars[caret..].iter());

    let mention = Mention {
        user_id: user.id.clone(),
        offset: start,
        length: handle.chars().count(),
    };

    mentions.retain(|m| m.end().is_some_and(|end| end <= start) || m.offset >= caret);
    for m in mentions.iter_mut() {
        if m.offset >= caret {
            // offset >= caret >= removed_len
            m.offset = (m.offset - removed_len).saturating_add(inserted_len);
        }
    }
    mentions.push(mention.clone());
    mentions.sort_by_key(|m| m.offset);

    MentionInsertion {
        text: new_text,
        caret: start + inserted_len,
        mention,
    }
}

/// Keys the suggestion popover reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKey {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickerAction {
    /// Highlight moved to this index
    Moved(usize),
    /// Insert this user
    Select(UserSummary),
    /// Popover closed
    Dismiss,
    /// Key not handled; let the editor have it
    Ignored,
}

/// Keyboard state of the mention suggestion popover
#[derive(Debug, Clone, Default)]
pub struct MentionPicker {
    candidates: Vec<UserSummary>,
    highlighted: usize,
}

impl MentionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace suggestions; the highlight returns to the first one
    pub fn set_candidates(&mut self, candidates: Vec<UserSummary>) {
        self.candidates = candidates;
        self.highlighted = 0;
    }

    pub fn candidates(&self) -> &[UserSummary] {
        &self.candidates
    }

    pub fn is_open(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.is_open().then_some(self.highlighted)
    }

    pub fn highlighted(&self) -> Option<&UserSummary> {
        self.candidates.get(self.highlighted)
    }

    pub fn close(&mut self) {
        self.set_candidates(Vec::new());
    }

    fn next(&mut self) -> usize {
        self.highlighted = (self.highlighted + 1) % self.candidates.len();
        self.highlighted
    }

    fn previous(&mut self) -> usize {
        self.highlighted = self
            .highlighted
            .checked_sub(1)
            .unwrap_or(self.candidates.len() - 1);
        self.highlighted
    }

    pub fn handle_key(&mut self, key: PickerKey) -> PickerAction {
        if !self.is_open() {
            return PickerAction::Ignored;
        }
        match key {
            PickerKey::Down => PickerAction::Moved(self.next()),
            PickerKey::Up => PickerAction::Moved(self.previous()),
            PickerKey::Enter | PickerKey::Tab => {
                let selected = self.candidates[self.highlighted].clone();
                self.close();
                PickerAction::Select(selected)
            }
            PickerKey::Escape => {
                self.close();
                PickerAction::Dismiss
            }
        }
    }
}
