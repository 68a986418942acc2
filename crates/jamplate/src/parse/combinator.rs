use rayon::prelude::*;
use smol_str::SmolStr;

use crate::tree::{Forest, TreeId};

use super::{Candidate, Parser, merge::merge};

/// Runs a parser only over trees of the `within` kinds that have no ancestor
/// of the `excluding` kinds.
pub struct ScopedParser {
    parser: Box<dyn Parser>,
    within: Vec<SmolStr>,
    excluding: Vec<SmolStr>,
}

impl ScopedParser {
    pub fn new(parser: impl Parser + 'static, within: &[&str]) -> Self {
        Self {
            parser: Box::new(parser),
            within: within.iter().map(|kind| SmolStr::new(kind)).collect(),
            excluding: Vec::new(),
        }
    }

    pub fn excluding(mut self, kinds: &[&str]) -> Self {
        self.excluding = kinds.iter().map(|kind| SmolStr::new(kind)).collect();
        self
    }

    fn applies(&self, forest: &Forest, tree: TreeId) -> bool {
        self.within.iter().any(|kind| kind == forest.kind(tree))
            && !forest
                .ancestors(tree)
                .any(|ancestor| self.excluding.iter().any(|kind| kind == forest.kind(ancestor)))
    }
}

impl Parser for ScopedParser {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate> {
        if self.applies(forest, tree) {
            self.parser.parse(forest, tree)
        } else {
            Vec::new()
        }
    }
}

/// Combines parsers, resolving clashes between their candidates by priority.
///
/// Parsers listed first win. A flat merge also refuses nesting between the
/// candidates of different parsers.
pub struct MergeParser {
    parsers: Vec<Box<dyn Parser>>,
    flat: bool,
}

impl MergeParser {
    pub fn new(parsers: Vec<Box<dyn Parser>>) -> Self {
        Self {
            parsers,
            flat: false,
        }
    }

    pub fn flat(parsers: Vec<Box<dyn Parser>>) -> Self {
        Self { parsers, flat: true }
    }
}

impl Parser for MergeParser {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate> {
        let groups: Vec<Vec<Candidate>> = self
            .parsers
            .par_iter()
            .map(|parser| parser.parse(forest, tree))
            .collect();

        merge(groups, self.flat)
    }
}
