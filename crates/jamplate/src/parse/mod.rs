//! Pattern-driven parsers and the fixed-point driver that plants their
//! candidates into a forest.
pub mod candidate;
pub mod combinator;
pub mod enclosure;
pub mod merge;
pub mod pattern;
pub mod symbol;

use rayon::prelude::*;
use regex_lite::{Captures, Regex};

use crate::tree::{Forest, TreeError, TreeId};

pub use candidate::Candidate;
pub use combinator::{MergeParser, ScopedParser};
pub use enclosure::EnclosureParser;
pub use pattern::PatternParser;
pub use symbol::SymbolParser;

/// Proposes candidate trees over the unclaimed text of a tree.
///
/// An empty result is a miss, not an error. Parsers never mutate the forest.
pub trait Parser: Send + Sync {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate>;
}

impl<P: Parser + ?Sized> Parser for Box<P> {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate> {
        (**self).parse(forest, tree)
    }
}

/// Runs `parser` over every tree of the forest, round after round, until a
/// round proposes nothing. Returns the number of productive rounds.
///
/// Trees are parsed in parallel within a round; candidates are planted
/// between rounds in a deterministic order.
#[tracing::instrument(level = "debug", skip_all, fields(document = %forest.document()))]
pub fn parse(forest: &mut Forest, parser: &dyn Parser, max_rounds: usize) -> Result<usize, TreeError> {
    for round in 0..max_rounds {
        let snapshot: &Forest = forest;
        let trees = snapshot.descendants(snapshot.root());
        let found: Vec<(TreeId, Vec<Candidate>)> = trees
            .par_iter()
            .map(|tree| (*tree, parser.parse(snapshot, *tree)))
            .filter(|(_, candidates)| !candidates.is_empty())
            .collect();

        if found.is_empty() {
            tracing::debug!(rounds = round, "parse reached a fixed point");
            return Ok(round);
        }

        tracing::trace!(
            round,
            candidates = found.iter().map(|(_, c)| c.len()).sum::<usize>(),
            "planting candidates"
        );

        for (origin, mut candidates) in found {
            candidates.sort_by(|a, b| a.reference().cmp(b.reference()));
            for candidate in &candidates {
                candidate.plant(forest, origin)?;
            }
        }
    }

    tracing::warn!(max_rounds, "parse stopped before reaching a fixed point");
    Ok(max_rounds)
}

/// Every match of `regex` that lies inside `tree` and over text no child of
/// `tree` has claimed.
///
/// The whole document is searched so that anchors see their real context.
/// A rejected match is retried one character later.
pub(crate) fn free_matches<'a>(regex: &Regex, forest: &'a Forest, tree: TreeId) -> Vec<Captures<'a>> {
    let text = forest.document().read();
    let bounds = forest.reference(tree);
    let (start, end) = (bounds.position() as usize, bounds.end() as usize);
    let mut matches = Vec::new();
    let mut at = start;

    while at < end {
        let Some(captures) = regex.captures_at(text, at) else {
            break;
        };
        let Some(whole) = captures.get(0) else {
            break;
        };
        if whole.start() >= end {
            break;
        }

        let accepted = !whole.is_empty()
            && whole.end() <= end
            && forest.is_free(tree, whole.start() as u32, whole.end() as u32);

        at = if accepted {
            whole.end()
        } else {
            whole.start()
                + text[whole.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8)
        };

        if accepted {
            matches.push(captures);
        }
    }

    matches
}
