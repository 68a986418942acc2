//! The position-ordered forest every compilation builds over its document.
//!
//! Trees are stored in an [`Arena`] and linked by index: each tree knows its
//! parent, its first child and its two siblings. Nothing is ever removed from
//! the arena; restructuring only rewires links.
use std::ops::Index;

use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::{
    arena::{Arena, ArenaId},
    document::Document,
    dominance::{Dominance, encloses},
    reference::Reference,
    sketch::Sketch,
};

pub type TreeId = ArenaId<Tree>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Tree at {offered} partially overlaps the tree at {existing}")]
    Clash {
        existing: Reference,
        offered: Reference,
    },
    #[error("Tree at {offered} takes the place of an equally weighted tree")]
    TakenPlace {
        existing: Reference,
        offered: Reference,
    },
    #[error("Tree at {offered} is not inside of its parent at {parent}")]
    OutOfBounds {
        parent: Reference,
        offered: Reference,
    },
}

impl TreeError {
    #[cold]
    pub fn reference(&self) -> &Reference {
        match self {
            TreeError::Clash { offered, .. } => offered,
            TreeError::TakenPlace { offered, .. } => offered,
            TreeError::OutOfBounds { offered, .. } => offered,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    reference: Reference,
    sketch: Sketch,
    weight: i32,
    parent: Option<TreeId>,
    child: Option<TreeId>,
    previous: Option<TreeId>,
    next: Option<TreeId>,
}

impl Tree {
    fn detached(reference: Reference, sketch: Sketch, weight: i32) -> Self {
        Self {
            reference,
            sketch,
            weight,
            parent: None,
            child: None,
            previous: None,
            next: None,
        }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn sketch(&self) -> &Sketch {
        &self.sketch
    }

    pub fn kind(&self) -> &str {
        self.sketch.kind()
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn parent(&self) -> Option<TreeId> {
        self.parent
    }

    pub fn child(&self) -> Option<TreeId> {
        self.child
    }

    pub fn previous(&self) -> Option<TreeId> {
        self.previous
    }

    pub fn next(&self) -> Option<TreeId> {
        self.next
    }
}

#[derive(Debug, Clone)]
pub struct Forest {
    document: Document,
    trees: Arena<Tree>,
    root: TreeId,
}

impl Forest {
    /// Creates a forest whose root covers the whole document.
    pub fn new(document: &Document, sketch: Sketch) -> Self {
        let mut trees = Arena::new(256);
        let root = trees.alloc(Tree::detached(Reference::whole(document), sketch, 0));

        Self {
            document: document.clone(),
            trees,
            root,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> TreeId {
        self.root
    }

    pub fn get(&self, id: TreeId) -> Option<&Tree> {
        self.trees.get(id)
    }

    /// Allocates a detached tree. It joins the hierarchy once it is offered or wrapped.
    pub fn create(&mut self, reference: Reference, sketch: Sketch, weight: i32) -> TreeId {
        self.trees.alloc(Tree::detached(reference, sketch, weight))
    }

    pub fn reference(&self, id: TreeId) -> &Reference {
        &self.trees[id].reference
    }

    pub fn kind(&self, id: TreeId) -> &str {
        self.trees[id].sketch.kind()
    }

    pub fn text(&self, id: TreeId) -> &str {
        self.trees[id].reference.text()
    }

    pub fn sketch_mut(&mut self, id: TreeId) -> &mut Sketch {
        &mut self.trees[id].sketch
    }

    pub fn slot(&self, id: TreeId, key: &str) -> Option<TreeId> {
        self.trees[id].sketch.get(key)
    }

    pub fn set_slot(&mut self, id: TreeId, key: &str, target: TreeId) {
        self.trees[id].sketch.set(key, target);
    }

    pub fn parent(&self, id: TreeId) -> Option<TreeId> {
        self.trees[id].parent
    }

    pub fn children(&self, id: TreeId) -> Children<'_> {
        Children {
            forest: self,
            cursor: self.trees[id].child,
        }
    }

    /// The parents of a tree, nearest first. The tree itself is not included.
    pub fn ancestors(&self, id: TreeId) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            cursor: self.trees[id].parent,
        }
    }

    /// The tree itself followed by its ancestors.
    pub fn hierarchy(&self, id: TreeId) -> impl Iterator<Item = TreeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    /// Every tree under `id` in pre-order, `id` first.
    pub fn descendants(&self, id: TreeId) -> Vec<TreeId> {
        let mut result = Vec::new();
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            result.push(current);
            let children: Vec<_> = self.children(current).collect();
            pending.extend(children.into_iter().rev());
        }

        result
    }

    /// The sub-ranges of a tree not claimed by any of its children.
    pub fn gaps(&self, id: TreeId) -> Vec<Reference> {
        let reference = &self.trees[id].reference;
        let mut cursor = reference.position();
        let mut gaps = Vec::new();

        for child in self.children(id) {
            let claimed = &self.trees[child].reference;
            if claimed.position() > cursor {
                gaps.push(Reference::between(
                    &self.document,
                    cursor,
                    claimed.position(),
                ));
            }
            cursor = cursor.max(claimed.end());
        }

        if reference.end() > cursor {
            gaps.push(Reference::between(&self.document, cursor, reference.end()));
        }

        gaps
    }

    /// `true` when no child of `id` claims any part of `[start, end)`.
    pub fn is_free(&self, id: TreeId, start: u32, end: u32) -> bool {
        self.children(id).all(|child| {
            let claimed = &self.trees[child].reference;
            if start == end {
                start <= claimed.position() || start >= claimed.end()
            } else {
                end <= claimed.position() || start >= claimed.end()
            }
        })
    }

    /// Inserts the detached tree `other` somewhere under `parent`.
    ///
    /// Children of `parent` are compared with `other` in position order.
    /// `other` descends into a child that contains it, lifts the children it
    /// contains, or settles before the first child that follows it.
    pub fn offer(&mut self, parent: TreeId, other: TreeId) -> Result<(), TreeError> {
        if !encloses(&self.trees[parent].reference, &self.trees[other].reference) {
            return Err(TreeError::OutOfBounds {
                parent: self.trees[parent].reference.clone(),
                offered: self.trees[other].reference.clone(),
            });
        }

        let mut cursor = self.trees[parent].child;

        while let Some(sibling) = cursor {
            let relation = self.trees[sibling]
                .reference
                .relation(&self.trees[other].reference);

            match Dominance::from(relation) {
                Dominance::None if relation.is_before() => {
                    self.link_before(parent, Some(sibling), other);
                    return Ok(());
                }
                Dominance::None => cursor = self.trees[sibling].next,
                Dominance::Part => return self.offer(sibling, other),
                Dominance::Contain => return self.lift(parent, sibling, other),
                Dominance::Exact => return self.settle(parent, sibling, other),
                Dominance::Share => {
                    return Err(TreeError::Clash {
                        existing: self.trees[sibling].reference.clone(),
                        offered: self.trees[other].reference.clone(),
                    });
                }
            }
        }

        self.link_before(parent, None, other);
        Ok(())
    }

    /// Creates a tree over the run of siblings `first..=last` and moves the
    /// run under it. Without a run the new tree is inserted in position order
    /// among the children of `parent`.
    pub fn wrap(
        &mut self,
        parent: TreeId,
        run: Option<(TreeId, TreeId)>,
        reference: Reference,
        sketch: Sketch,
    ) -> Result<TreeId, TreeError> {
        if !encloses(&self.trees[parent].reference, &reference) {
            return Err(TreeError::OutOfBounds {
                parent: self.trees[parent].reference.clone(),
                offered: reference,
            });
        }

        let node = self.create(reference, sketch, 0);

        match run {
            Some((first, last)) => {
                for end in [first, last] {
                    if !encloses(&self.trees[node].reference, &self.trees[end].reference) {
                        return Err(TreeError::OutOfBounds {
                            parent: self.trees[node].reference.clone(),
                            offered: self.trees[end].reference.clone(),
                        });
                    }
                }

                let anchor = self.trees[last].next;
                let members = self.unlink(first, last);
                self.link_before(parent, anchor, node);
                for member in members {
                    self.link_before(node, None, member);
                }
            }
            None => {
                let anchor = self.children(parent).find(|child| {
                    self.trees[*child]
                        .reference
                        .relation(&self.trees[node].reference)
                        .is_before()
                });
                self.link_before(parent, anchor, node);
            }
        }

        Ok(node)
    }

    fn lift(&mut self, parent: TreeId, first: TreeId, other: TreeId) -> Result<(), TreeError> {
        let mut last = first;

        while let Some(next) = self.trees[last].next {
            match Dominance::of(&self.trees[next].reference, &self.trees[other].reference) {
                Dominance::Contain => last = next,
                Dominance::Share => {
                    return Err(TreeError::Clash {
                        existing: self.trees[next].reference.clone(),
                        offered: self.trees[other].reference.clone(),
                    });
                }
                _ => break,
            }
        }

        let anchor = self.trees[last].next;
        let members = self.unlink(first, last);
        self.link_before(parent, anchor, other);

        for member in members {
            self.offer(other, member)?;
        }

        Ok(())
    }

    /// Resolves two trees with identical bounds: the heavier one stays outside.
    fn settle(&mut self, parent: TreeId, existing: TreeId, other: TreeId) -> Result<(), TreeError> {
        match self.trees[other].weight.cmp(&self.trees[existing].weight) {
            std::cmp::Ordering::Equal => Err(TreeError::TakenPlace {
                existing: self.trees[existing].reference.clone(),
                offered: self.trees[other].reference.clone(),
            }),
            std::cmp::Ordering::Less => self.offer(existing, other),
            std::cmp::Ordering::Greater => {
                let anchor = self.trees[existing].next;
                self.unlink(existing, existing);
                self.link_before(parent, anchor, other);
                self.offer(other, existing)
            }
        }
    }

    /// Detaches the sibling run `first..=last`, returning its members in order.
    fn unlink(&mut self, first: TreeId, last: TreeId) -> SmallVec<[TreeId; 4]> {
        let mut members = smallvec![first];
        let mut cursor = first;
        while cursor != last {
            match self.trees[cursor].next {
                Some(next) => {
                    members.push(next);
                    cursor = next;
                }
                None => break,
            }
        }

        let previous = self.trees[first].previous;
        let next = self.trees[cursor].next;
        let parent = self.trees[first].parent;

        match previous {
            Some(previous) => self.trees[previous].next = next,
            None => {
                if let Some(parent) = parent {
                    self.trees[parent].child = next;
                }
            }
        }
        if let Some(next) = next {
            self.trees[next].previous = previous;
        }

        for member in &members {
            let tree = &mut self.trees[*member];
            tree.parent = None;
            tree.previous = None;
            tree.next = None;
        }

        members
    }

    /// Links the detached `node` under `parent` before `anchor`, or last when there is no anchor.
    fn link_before(&mut self, parent: TreeId, anchor: Option<TreeId>, node: TreeId) {
        let previous = match anchor {
            Some(anchor) => self.trees[anchor].previous,
            None => self.children(parent).last(),
        };

        {
            let tree = &mut self.trees[node];
            tree.parent = Some(parent);
            tree.previous = previous;
            tree.next = anchor;
        }

        match previous {
            Some(previous) => self.trees[previous].next = Some(node),
            None => self.trees[parent].child = Some(node),
        }
        if let Some(anchor) = anchor {
            self.trees[anchor].previous = Some(node);
        }
    }
}

impl Index<TreeId> for Forest {
    type Output = Tree;

    fn index(&self, index: TreeId) -> &Self::Output {
        &self.trees[index]
    }
}

pub struct Children<'a> {
    forest: &'a Forest,
    cursor: Option<TreeId>,
}

impl Iterator for Children<'_> {
    type Item = TreeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.forest.trees[current].next;
        Some(current)
    }
}

pub struct Ancestors<'a> {
    forest: &'a Forest,
    cursor: Option<TreeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TreeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.forest.trees[current].parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn forest() -> Forest {
        Forest::new(&Document::new("doc", "0123456789abcdefghij"), Sketch::new("root"))
    }

    fn offer(forest: &mut Forest, position: u32, length: u32, weight: i32) -> TreeId {
        let reference = Reference::new(forest.document(), position, length);
        let id = forest.create(reference, Sketch::new("node"), weight);
        forest.offer(forest.root(), id).unwrap();
        id
    }

    fn spans(forest: &Forest, id: TreeId) -> Vec<(u32, u32)> {
        forest
            .children(id)
            .map(|child| (forest[child].reference().position(), forest[child].reference().length()))
            .collect()
    }

    #[rstest]
    fn test_offer_orders_siblings(mut forest: Forest) {
        offer(&mut forest, 10, 2, 0);
        offer(&mut forest, 2, 2, 0);
        offer(&mut forest, 5, 1, 0);
        assert_eq!(spans(&forest, forest.root()), vec![(2, 2), (5, 1), (10, 2)]);
    }

    #[rstest]
    fn test_offer_descends_into_container(mut forest: Forest) {
        let outer = offer(&mut forest, 2, 10, 0);
        let inner = offer(&mut forest, 4, 2, 0);
        assert_eq!(forest.parent(inner), Some(outer));
        assert_eq!(spans(&forest, forest.root()), vec![(2, 10)]);
    }

    #[rstest]
    fn test_offer_lifts_contained_siblings(mut forest: Forest) {
        let a = offer(&mut forest, 2, 2, 0);
        let b = offer(&mut forest, 5, 2, 0);
        let c = offer(&mut forest, 12, 2, 0);
        let outer = offer(&mut forest, 1, 8, 0);

        assert_eq!(forest.parent(a), Some(outer));
        assert_eq!(forest.parent(b), Some(outer));
        assert_eq!(forest.parent(c), Some(forest.root()));
        assert_eq!(spans(&forest, forest.root()), vec![(1, 8), (12, 2)]);
        assert_eq!(spans(&forest, outer), vec![(2, 2), (5, 2)]);
    }

    #[rstest]
    fn test_offer_exact_heavier_goes_outside(mut forest: Forest) {
        let light = offer(&mut forest, 3, 4, 0);
        let heavy = offer(&mut forest, 3, 4, 5);
        assert_eq!(forest.parent(light), Some(heavy));
        assert_eq!(forest.parent(heavy), Some(forest.root()));
    }

    #[rstest]
    fn test_offer_exact_lighter_goes_inside(mut forest: Forest) {
        let heavy = offer(&mut forest, 3, 4, 5);
        let light = offer(&mut forest, 3, 4, 0);
        assert_eq!(forest.parent(light), Some(heavy));
    }

    #[rstest]
    fn test_offer_exact_equal_weight_is_rejected(mut forest: Forest) {
        offer(&mut forest, 3, 4, 1);
        let twin = forest.create(Reference::new(forest.document(), 3, 4), Sketch::new("node"), 1);
        assert!(matches!(
            forest.offer(forest.root(), twin),
            Err(TreeError::TakenPlace { .. })
        ));
    }

    #[rstest]
    fn test_offer_share_is_rejected(mut forest: Forest) {
        offer(&mut forest, 3, 4, 0);
        let overlapping = forest.create(Reference::new(forest.document(), 5, 4), Sketch::new("node"), 0);
        assert!(matches!(
            forest.offer(forest.root(), overlapping),
            Err(TreeError::Clash { .. })
        ));
    }

    #[rstest]
    fn test_offer_out_of_bounds(mut forest: Forest) {
        let outer = offer(&mut forest, 2, 3, 0);
        let outside = forest.create(Reference::new(forest.document(), 8, 1), Sketch::new("node"), 0);
        assert!(matches!(
            forest.offer(outer, outside),
            Err(TreeError::OutOfBounds { .. })
        ));
    }

    #[rstest]
    fn test_zero_length_on_boundaries(mut forest: Forest) {
        let bracket = offer(&mut forest, 4, 2, 0);
        let open = forest.create(Reference::new(forest.document(), 4, 1), Sketch::new("open"), 0);
        let body = forest.create(Reference::new(forest.document(), 5, 0), Sketch::new("body"), 0);
        let close = forest.create(Reference::new(forest.document(), 5, 1), Sketch::new("close"), 0);
        forest.offer(bracket, open).unwrap();
        forest.offer(bracket, body).unwrap();
        forest.offer(bracket, close).unwrap();
        assert_eq!(forest.children(bracket).collect::<Vec<_>>(), vec![open, body, close]);
    }

    #[rstest]
    fn test_gaps_and_is_free(mut forest: Forest) {
        offer(&mut forest, 2, 3, 0);
        offer(&mut forest, 8, 2, 0);
        let gaps: Vec<_> = forest
            .gaps(forest.root())
            .iter()
            .map(|gap| (gap.position(), gap.end()))
            .collect();
        assert_eq!(gaps, vec![(0, 2), (5, 8), (10, 20)]);
        assert!(forest.is_free(forest.root(), 5, 8));
        assert!(!forest.is_free(forest.root(), 4, 6));
        assert!(forest.is_free(forest.root(), 2, 2));
        assert!(!forest.is_free(forest.root(), 3, 3));
    }

    #[rstest]
    fn test_wrap_run(mut forest: Forest) {
        let a = offer(&mut forest, 2, 2, 0);
        let b = offer(&mut forest, 5, 2, 0);
        let c = offer(&mut forest, 9, 2, 0);
        let reference = Reference::between(forest.document(), 2, 7);
        let wrapper = forest
            .wrap(forest.root(), Some((a, b)), reference, Sketch::new("flow"))
            .unwrap();

        assert_eq!(forest.children(forest.root()).collect::<Vec<_>>(), vec![wrapper, c]);
        assert_eq!(forest.children(wrapper).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(forest.ancestors(a).collect::<Vec<_>>(), vec![wrapper, forest.root()]);
    }

    #[rstest]
    fn test_wrap_empty(mut forest: Forest) {
        let a = offer(&mut forest, 2, 2, 0);
        let b = offer(&mut forest, 4, 2, 0);
        let reference = Reference::new(forest.document(), 4, 0);
        let empty = forest
            .wrap(forest.root(), None, reference, Sketch::new("body"))
            .unwrap();
        assert_eq!(forest.children(forest.root()).collect::<Vec<_>>(), vec![a, empty, b]);
    }

    #[rstest]
    fn test_descendants_pre_order(mut forest: Forest) {
        let outer = offer(&mut forest, 0, 10, 0);
        let inner = offer(&mut forest, 2, 2, 0);
        let tail = offer(&mut forest, 12, 2, 0);
        assert_eq!(
            forest.descendants(forest.root()),
            vec![forest.root(), outer, inner, tail]
        );
    }
}
