use regex_lite::Regex;
use smol_str::SmolStr;

use crate::{
    reference::Reference,
    sketch::key,
    tree::{Forest, TreeId},
};

use super::{Candidate, Parser, free_matches};

/// Parses `open ... close` pairs, producing the slots `open`, `body` and `close`.
///
/// Every closing match is paired with the nearest unpaired opening match
/// before it, so the innermost pairs are found first and disjoint pairs of the
/// same construct never clash.
///
/// The body outweighs the enclosure, so a tree with the same bounds as the
/// body, such as a nested enclosure, settles inside it.
#[derive(Debug, Clone)]
pub struct EnclosureParser {
    kind: SmolStr,
    open: Regex,
    close: Regex,
    open_kind: SmolStr,
    body_kind: SmolStr,
    close_kind: SmolStr,
    weight: i32,
}

impl EnclosureParser {
    pub fn new(kind: &str, open: &str, close: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            kind: kind.into(),
            open: Regex::new(open)?,
            close: Regex::new(close)?,
            open_kind: key::OPEN.into(),
            body_kind: key::BODY.into(),
            close_kind: key::CLOSE.into(),
            weight: 0,
        })
    }

    pub fn with_body_kind(mut self, kind: &str) -> Self {
        self.body_kind = kind.into();
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    fn pairs(&self, forest: &Forest, tree: TreeId) -> Vec<((usize, usize), (usize, usize))> {
        let span = |captures: regex_lite::Captures<'_>| {
            captures.get(0).map(|m| (m.start(), m.end()))
        };
        let opens: Vec<_> = free_matches(&self.open, forest, tree)
            .into_iter()
            .filter_map(span)
            .collect();
        let closes: Vec<_> = free_matches(&self.close, forest, tree)
            .into_iter()
            .filter_map(span)
            .collect();

        let mut paired = vec![false; opens.len()];
        let mut pairs = Vec::new();

        for close in closes {
            let nearest = (0..opens.len())
                .rev()
                .find(|i| !paired[*i] && opens[*i].1 <= close.0);

            if let Some(i) = nearest {
                paired[i] = true;
                pairs.push((opens[i], close));
            }
        }

        pairs
    }
}

impl Parser for EnclosureParser {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate> {
        let document = forest.document();

        self.pairs(forest, tree)
            .into_iter()
            .map(|((open_start, open_end), (close_start, close_end))| {
                let between =
                    |start: usize, end: usize| Reference::between(document, start as u32, end as u32);

                Candidate::new(between(open_start, close_end), self.kind.clone())
                    .with_weight(self.weight)
                    .with_component(
                        key::OPEN,
                        Candidate::new(between(open_start, open_end), self.open_kind.clone()),
                    )
                    .with_component(
                        key::BODY,
                        Candidate::new(between(open_end, close_start), self.body_kind.clone())
                            .with_weight(self.weight + 1),
                    )
                    .with_component(
                        key::CLOSE,
                        Candidate::new(between(close_start, close_end), self.close_kind.clone()),
                    )
            })
            .collect()
    }
}
