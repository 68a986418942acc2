//! Half-open spans over a document's text and the relations between them.
//!
//! Every structural decision made by the parser, the analyzers and the tree
//! model is derived from the four integer bounds of two references.
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

use crate::document::Document;

/// A `[position, position + length)` byte span in a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    document: Document,
    position: u32,
    length: u32,
}

impl Reference {
    /// Creates a reference, clamping it to the bounds of the document.
    pub fn new(document: &Document, position: u32, length: u32) -> Self {
        let position = position.min(document.len());
        let length = length.min(document.len() - position);
        Self {
            document: document.clone(),
            position,
            length,
        }
    }

    /// A reference covering the whole document.
    pub fn whole(document: &Document) -> Self {
        Self::new(document, 0, document.len())
    }

    /// Creates a reference from a start and an exclusive end.
    pub fn between(document: &Document, start: u32, end: u32) -> Self {
        Self::new(document, start, end.saturating_sub(start))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// The exclusive end of the span.
    pub fn end(&self) -> u32 {
        self.position + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The text this reference spans.
    pub fn text(&self) -> &str {
        &self.document.read()[self.position as usize..self.end() as usize]
    }

    /// The 1-based line the span starts on.
    pub fn line(&self) -> u32 {
        self.document.line_of(self.position)
    }

    /// A sub-span relative to this reference's start.
    pub fn subreference(&self, offset: u32, length: u32) -> Self {
        let position = (self.position + offset).min(self.end());
        let length = length.min(self.end() - position);
        Self {
            document: self.document.clone(),
            position,
            length,
        }
    }

    /// How `other` relates to this reference.
    pub fn relation(&self, other: &Reference) -> Relation {
        Relation::of(self, other)
    }
}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered by document, then position, then length descending, so that an
/// enclosing span sorts before the spans it contains.
impl Ord for Reference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.document
            .cmp(&other.document)
            .then(self.position.cmp(&other.position))
            .then(other.length.cmp(&self.length))
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.line())
    }
}

/// The relation a reference `b` has with a reference `a`.
///
/// ```text
/// a:           [=====)
/// SAME         [=====)
/// START        [==)
/// END             [==)
/// FRAGMENT      [==)
/// CONTAIN    [=========)
/// NEXT               [==)
/// PREVIOUS  [==)
/// AHEAD                 [==)
/// BEHIND [=)
/// OVERFLOW         [=====)
/// UNDERFLOW [=====)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Same,
    Start,
    End,
    Fragment,
    Contain,
    Next,
    Previous,
    Ahead,
    Behind,
    Overflow,
    Underflow,
    /// The references belong to different documents.
    None,
}

impl Relation {
    /// Computes how `b` relates to `a`.
    ///
    /// Adjacency is decided before containment: a zero-length span sitting on
    /// a boundary of another span is its neighbour, not its fragment.
    pub fn of(a: &Reference, b: &Reference) -> Relation {
        if a.document != b.document {
            return Relation::None;
        }

        Self::compute(a.position(), a.end(), b.position(), b.end())
    }

    /// Computes the relation of `[i, j)` to `[s, e)`.
    pub fn compute(s: u32, e: u32, i: u32, j: u32) -> Relation {
        if i == s && j == e {
            Relation::Same
        } else if i == e {
            Relation::Next
        } else if j == s {
            Relation::Previous
        } else if i >= s && j <= e {
            if i == s {
                Relation::Start
            } else if j == e {
                Relation::End
            } else {
                Relation::Fragment
            }
        } else if i <= s && j >= e {
            Relation::Contain
        } else if i > e {
            Relation::Ahead
        } else if j < s {
            Relation::Behind
        } else if i > s {
            Relation::Overflow
        } else {
            Relation::Underflow
        }
    }

    /// Returns the relations `a` may have with `b` given that `b` has this relation with `a`.
    pub fn inverse(self) -> &'static [Relation] {
        match self {
            Relation::Same => &[Relation::Same],
            Relation::Start | Relation::End | Relation::Fragment => &[Relation::Contain],
            Relation::Contain => &[Relation::Start, Relation::End, Relation::Fragment],
            Relation::Next => &[Relation::Previous],
            Relation::Previous => &[Relation::Next],
            Relation::Ahead => &[Relation::Behind],
            Relation::Behind => &[Relation::Ahead],
            Relation::Overflow => &[Relation::Underflow],
            Relation::Underflow => &[Relation::Overflow],
            Relation::None => &[Relation::None],
        }
    }

    /// `true` when `b` lies (not necessarily strictly) inside `a`.
    pub fn is_inside(self) -> bool {
        matches!(
            self,
            Relation::Same | Relation::Start | Relation::End | Relation::Fragment
        )
    }

    /// `true` when the two spans do not share a single position.
    pub fn is_disjoint(self) -> bool {
        matches!(
            self,
            Relation::Next
                | Relation::Previous
                | Relation::Ahead
                | Relation::Behind
                | Relation::None
        )
    }

    /// `true` when `b` lies entirely before `a`.
    pub fn is_before(self) -> bool {
        matches!(self, Relation::Previous | Relation::Behind)
    }
}
