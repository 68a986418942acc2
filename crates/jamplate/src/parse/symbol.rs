use itertools::Itertools;
use regex_lite::Regex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{
    reference::Reference,
    tree::{Forest, TreeId},
};

use super::{Candidate, Parser, free_matches};

/// Parses fixed symbols, longest first, so that `<=` never reads as `<` `=`.
#[derive(Debug, Clone)]
pub struct SymbolParser {
    regex: Regex,
    kinds: FxHashMap<SmolStr, SmolStr>,
}

impl SymbolParser {
    /// `symbols` pairs each symbol with the kind of the trees it produces.
    pub fn new<'a>(symbols: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, regex_lite::Error> {
        let kinds: FxHashMap<SmolStr, SmolStr> = symbols
            .into_iter()
            .map(|(symbol, kind)| (SmolStr::new(symbol), SmolStr::new(kind)))
            .collect();

        let pattern = kinds
            .keys()
            .sorted_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)))
            .map(|symbol| regex_lite::escape(symbol))
            .join("|");

        Ok(Self {
            regex: Regex::new(&format!("(?:{pattern})"))?,
            kinds,
        })
    }
}

impl Parser for SymbolParser {
    fn parse(&self, forest: &Forest, tree: TreeId) -> Vec<Candidate> {
        let document = forest.document();

        free_matches(&self.regex, forest, tree)
            .into_iter()
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let kind = self.kinds.get(whole.as_str())?;
                Some(Candidate::new(
                    Reference::between(document, whole.start() as u32, whole.end() as u32),
                    kind.clone(),
                ))
            })
            .collect()
    }
}
