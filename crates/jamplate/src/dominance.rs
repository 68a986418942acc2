use crate::reference::{Reference, Relation};

/// The coarse containment classification between two spans.
///
/// `Dominance::of(a, b)` describes `b` from the point of view of `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dominance {
    /// Disjoint.
    None,
    /// `a` strictly contains `b`.
    Part,
    /// `b` strictly contains `a`.
    Contain,
    /// Partial overlap.
    Share,
    /// Identical bounds.
    Exact,
}

impl Dominance {
    pub fn of(a: &Reference, b: &Reference) -> Dominance {
        Self::from(a.relation(b))
    }

    pub fn opposite(self) -> Dominance {
        match self {
            Dominance::Part => Dominance::Contain,
            Dominance::Contain => Dominance::Part,
            other => other,
        }
    }
}

impl From<Relation> for Dominance {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::Same => Dominance::Exact,
            Relation::Start | Relation::End | Relation::Fragment => Dominance::Part,
            Relation::Contain => Dominance::Contain,
            Relation::Overflow | Relation::Underflow => Dominance::Share,
            Relation::Next
            | Relation::Previous
            | Relation::Ahead
            | Relation::Behind
            | Relation::None => Dominance::None,
        }
    }
}

/// `true` when `inner` lies within `outer`, zero-length spans on either boundary included.
pub fn encloses(outer: &Reference, inner: &Reference) -> bool {
    outer.document() == inner.document()
        && inner.position() >= outer.position()
        && inner.end() <= outer.end()
}
