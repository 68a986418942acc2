use regex_lite::Regex;
use smol_str::SmolStr;

use crate::{
    reference::Reference,
    tree::{Forest, TreeId},
};

use super::{Candidate, Parser, free_matches};

/// Parses every free match of a single pattern.
///
/// Named groups registered with [`PatternParser::with_group`] become
/// components keyed by the group name. Groups that did not take part in a
/// match are left out.
#[derive(Debug, Clone)]
pub struct PatternParser {
    kind: SmolStr,
    regex: Regex,
    groups: Vec<(SmolStr, SmolStr)>,
    weight: i32,
}

impl PatternParser {
    pub fn new(kind: &str, pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            kind: kind.into(),
            regex: Regex::new(pattern)?,
            groups: Vec::new(),
            weight: 0,
        })
    }

    /// Turns the named group `name` into a component of kind `kind`.
    pub fn with_group(mut self, name: &str, kind: &str) -> Self {
        self.groups.push((name.into(), kind.into()));
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }
}

impl Parser for PatternParser {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate> {
        let document = forest.document();
        let reference = |start: usize, end: usize| {
            Reference::between(document, start as u32, end as u32)
        };

        free_matches(&self.regex, forest, tree)
            .into_iter()
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let candidate = Candidate::new(reference(whole.start(), whole.end()), self.kind.clone())
                    .with_weight(self.weight);

                Some(self.groups.iter().fold(candidate, |candidate, (name, kind)| {
                    match captures.name(name) {
                        Some(group) => candidate.with_component(
                            name.clone(),
                            Candidate::new(reference(group.start(), group.end()), kind.clone()),
                        ),
                        None => candidate,
                    }
                }))
            })
            .collect()
    }
}
