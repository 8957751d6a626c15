//! Vote gesture detection in free-form chat text.
//!
//! Two shapes are recognised, in priority order:
//!
//! 1. A meme-link trigger at the very start of the message (`!ytmnd bob`),
//!    which always reads as an upvote for the token after the prefix. When a
//!    trigger matches, nothing else in the message is scanned.
//! 2. Inline `++` / `--` gestures, either in front of a word (`++bob`) or
//!    behind it (`bob--`). Words are delimited by single spaces only.
//!
//! The scanner only proposes candidates, leftmost first. Whether one is
//! applied is up to [`VotePolicy`](crate::policy::VotePolicy); the caller
//! keeps pulling candidates until one is approved or the text runs out.

use crate::record::Direction;

/// Which syntax produced a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    MemeLink,
    /// `++name` / `--name`
    Prefix,
    /// `name++` / `name--`
    Suffix,
}

/// A candidate vote found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gesture<'a> {
    /// Raw target text; may be empty when the gesture has no adjacent word.
    pub target: &'a str,
    pub direction: Direction,
    pub kind: GestureKind,
    /// Byte offset of the gesture (or of the message start for meme links).
    pub offset: usize,
}

/// Iterator over the vote candidates of one message.
#[derive(Debug, Clone)]
pub enum Gestures<'a> {
    Meme(Option<Gesture<'a>>),
    Inline {
        text: &'a str,
        pos: usize,
        word_start: usize,
    },
}

/// Scan `text` for vote gestures.
///
/// `meme_prefixes` are matched ASCII case-insensitively against the start of
/// the message; the target is the token between the prefix and the next space.
pub fn scan<'a, S: AsRef<str>>(text: &'a str, meme_prefixes: &[S]) -> Gestures<'a> {
    for prefix in meme_prefixes {
        if let Some(rest) = strip_prefix_ignore_case(text, prefix.as_ref()) {
            return Gestures::Meme(Some(Gesture {
                target: first_word(rest),
                direction: Direction::Up,
                kind: GestureKind::MemeLink,
                offset: 0,
            }));
        }
    }

    Gestures::Inline {
        text,
        pos: 0,
        word_start: 0,
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

fn first_word(text: &str) -> &str {
    let end = text.find(' ').unwrap_or(text.len());
    &text[..end]
}

impl<'a> Iterator for Gestures<'a> {
    type Item = Gesture<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Gestures::Meme(pending) => pending.take(),
            Gestures::Inline {
                text,
                pos,
                word_start,
            } => {
                let bytes = text.as_bytes();
                while *pos < bytes.len() {
                    let p = *pos;
                    let b = bytes[p];
                    if b == b' ' {
                        *word_start = p + 1;
                    }

                    if (b == b'+' || b == b'-') && bytes.get(p + 1) == Some(&b) {
                        let direction = if b == b'+' {
                            Direction::Up
                        } else {
                            Direction::Down
                        };
                        // Gesture bytes are ASCII, so every slice bound below
                        // sits on a char boundary.
                        let (target, kind) = if p == *word_start {
                            (first_word(&text[p + 2..]), GestureKind::Prefix)
                        } else {
                            (&text[*word_start..p], GestureKind::Suffix)
                        };
                        *pos = p + 2;
                        return Some(Gesture {
                            target,
                            direction,
                            kind,
                            offset: p,
                        });
                    }

                    *pos += 1;
                }
                None
            }
        }
    }
}
