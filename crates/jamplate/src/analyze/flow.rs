use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{
    reference::Reference,
    sketch::{Sketch, key},
    tree::{Forest, TreeError, TreeId},
};

use super::Analyzer;

type Middles = SmallVec<[TreeId; 4]>;

/// Groups a start command, its middle commands and its end command, all
/// siblings, into one flow tree.
///
/// The flow gets the slots `start`, `body` and `end`. A middle command opens
/// a nested flow of the same kind, linked through `middle` and `sub`, whose
/// own `end` slot points at the shared end command.
///
/// ```text
/// #if a          flow { start: #if a, body, middle: #elif b, sub, end: #endif }
///   ...            sub { start: #elif b, body, middle: #else, sub, end: #endif }
/// #elif b            sub { start: #else, body, end: #endif }
///   ...
/// #else
///   ...
/// #endif
/// ```
#[derive(Debug, Clone)]
pub struct FlowAnalyzer {
    kind: SmolStr,
    start: Vec<SmolStr>,
    middle: Vec<SmolStr>,
    end: Vec<SmolStr>,
    body: SmolStr,
}

impl FlowAnalyzer {
    pub fn new(kind: &str, start: &[&str], middle: &[&str], end: &[&str]) -> Self {
        let kinds = |kinds: &[&str]| kinds.iter().map(|kind| SmolStr::new(kind)).collect();
        Self {
            kind: kind.into(),
            start: kinds(start),
            middle: kinds(middle),
            end: kinds(end),
            body: key::BODY.into(),
        }
    }

    pub fn with_body_kind(mut self, kind: &str) -> Self {
        self.body = kind.into();
        self
    }

    fn is(kinds: &[SmolStr], kind: &str) -> bool {
        kinds.iter().any(|k| k == kind)
    }

    /// Finds the middles and the end closing the start at `index`, skipping
    /// nested flows of the same family.
    fn close(&self, forest: &Forest, children: &[TreeId], index: usize) -> Option<(Middles, TreeId)> {
        let mut depth = 0usize;
        let mut middles = Middles::new();

        for &sibling in &children[index + 1..] {
            let kind = forest.kind(sibling);
            if Self::is(&self.start, kind) {
                depth += 1;
            } else if Self::is(&self.end, kind) {
                if depth == 0 {
                    return Some((middles, sibling));
                }
                depth -= 1;
            } else if depth == 0 && Self::is(&self.middle, kind) {
                middles.push(sibling);
            }
        }

        None
    }

    fn fill(
        &self,
        forest: &mut Forest,
        flow: TreeId,
        start: TreeId,
        middles: &[TreeId],
        end: TreeId,
    ) -> Result<(), TreeError> {
        let stop = middles.first().copied().unwrap_or(end);
        let body = self.body(forest, flow, start, stop)?;

        forest.set_slot(flow, key::START, start);
        forest.set_slot(flow, key::BODY, body);
        forest.set_slot(flow, key::END, end);

        let Some((&middle, rest)) = middles.split_first() else {
            return Ok(());
        };

        let last = run_until(forest, middle, end);
        let reference = Reference::between(
            forest.document(),
            forest.reference(middle).position(),
            forest.reference(end).position(),
        );
        let sub = forest.wrap(flow, Some((middle, last)), reference, Sketch::new(self.kind.clone()))?;

        forest.set_slot(flow, key::MIDDLE, middle);
        forest.set_slot(flow, key::SUB, sub);

        self.fill(forest, sub, middle, rest, end)
    }

    /// Wraps everything between `start` and `stop` into a body tree.
    fn body(&self, forest: &mut Forest, parent: TreeId, start: TreeId, stop: TreeId) -> Result<TreeId, TreeError> {
        let limit = if forest.parent(stop) == Some(parent) {
            forest.reference(stop).position()
        } else {
            forest.reference(parent).end()
        };
        let reference = Reference::between(forest.document(), forest.reference(start).end(), limit);

        let run = forest[start]
            .next()
            .filter(|first| *first != stop)
            .map(|first| (first, run_until(forest, first, stop)));

        forest.wrap(parent, run, reference, Sketch::new(self.body.clone()))
    }
}

/// The last sibling from `first` onward that comes before `stop`.
fn run_until(forest: &Forest, first: TreeId, stop: TreeId) -> TreeId {
    let mut last = first;
    while let Some(next) = forest[last].next() {
        if next == stop {
            break;
        }
        last = next;
    }
    last
}

impl Analyzer for FlowAnalyzer {
    fn analyze(&self, forest: &mut Forest, tree: TreeId) -> Result<bool, TreeError> {
        if forest.kind(tree) == self.kind {
            return Ok(false);
        }

        let children: Vec<_> = forest.children(tree).collect();

        for (index, &start) in children.iter().enumerate() {
            if !Self::is(&self.start, forest.kind(start)) {
                continue;
            }

            let Some((middles, end)) = self.close(forest, &children, index) else {
                continue;
            };

            let reference = Reference::between(
                forest.document(),
                forest.reference(start).position(),
                forest.reference(end).end(),
            );
            let flow = forest.wrap(tree, Some((start, end)), reference, Sketch::new(self.kind.clone()))?;
            self.fill(forest, flow, start, &middles, end)?;

            tracing::trace!(kind = %self.kind, at = %forest.reference(flow), "flow");
            return Ok(true);
        }

        Ok(false)
    }
}
