use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{
    reference::Reference,
    sketch::{Sketch, key},
    tree::{Forest, TreeError, TreeId},
};

use super::Analyzer;

/// Which sibling kinds can never be operands.
#[derive(Debug, Clone)]
struct Operands {
    sign: SmolStr,
    punctuation: Vec<SmolStr>,
}

impl Operands {
    fn new(sign: &str, punctuation: &[&str]) -> Self {
        Self {
            sign: sign.into(),
            punctuation: punctuation.iter().map(|kind| SmolStr::new(kind)).collect(),
        }
    }

    fn is_operand(&self, forest: &Forest, tree: TreeId) -> bool {
        let kind = forest.kind(tree);
        kind != self.sign && !self.punctuation.iter().any(|k| k == kind)
    }

    /// The operator kind of `tree` when it is a sign listed in `signs`.
    fn operator<'a>(
        &self,
        forest: &Forest,
        tree: TreeId,
        signs: &'a FxHashMap<SmolStr, SmolStr>,
    ) -> Option<&'a SmolStr> {
        if forest.kind(tree) != self.sign {
            return None;
        }
        signs.get(forest.text(tree).trim())
    }
}

fn signs(signs: &[(&str, &str)]) -> FxHashMap<SmolStr, SmolStr> {
    signs
        .iter()
        .map(|(sign, kind)| (SmolStr::new(sign), SmolStr::new(kind)))
        .collect()
}

/// Groups `left sign right` siblings into an operator tree with the slots
/// `left`, `sign` and `right`, leftmost first.
#[derive(Debug, Clone)]
pub struct BinaryOperatorAnalyzer {
    signs: FxHashMap<SmolStr, SmolStr>,
    operands: Operands,
}

impl BinaryOperatorAnalyzer {
    /// `sign` is the kind of sign trees, `signs` maps each sign text to the
    /// kind of operator it forms, `punctuation` lists other non-operand kinds.
    pub fn new(sign: &str, signs: &[(&str, &str)], punctuation: &[&str]) -> Self {
        Self {
            signs: self::signs(signs),
            operands: Operands::new(sign, punctuation),
        }
    }
}

impl Analyzer for BinaryOperatorAnalyzer {
    fn analyze(&self, forest: &mut Forest, tree: TreeId) -> Result<bool, TreeError> {
        let children: Vec<_> = forest.children(tree).collect();

        for window in children.windows(3) {
            let [left, sign, right] = [window[0], window[1], window[2]];
            let Some(kind) = self.operands.operator(forest, sign, &self.signs).cloned() else {
                continue;
            };
            if !self.operands.is_operand(forest, left) || !self.operands.is_operand(forest, right) {
                continue;
            }

            let reference = Reference::between(
                forest.document(),
                forest.reference(left).position(),
                forest.reference(right).end(),
            );
            let operator = forest.wrap(tree, Some((left, right)), reference, Sketch::new(kind))?;
            forest.set_slot(operator, key::LEFT, left);
            forest.set_slot(operator, key::SIGN, sign);
            forest.set_slot(operator, key::RIGHT, right);
            return Ok(true);
        }

        Ok(false)
    }
}

/// Groups a prefix sign and the operand after it into an operator tree with
/// the slots `sign` and `right`.
///
/// A sign is a prefix when nothing but another sign or punctuation precedes it.
#[derive(Debug, Clone)]
pub struct UnaryOperatorAnalyzer {
    signs: FxHashMap<SmolStr, SmolStr>,
    operands: Operands,
}

impl UnaryOperatorAnalyzer {
    pub fn new(sign: &str, signs: &[(&str, &str)], punctuation: &[&str]) -> Self {
        Self {
            signs: self::signs(signs),
            operands: Operands::new(sign, punctuation),
        }
    }
}

impl Analyzer for UnaryOperatorAnalyzer {
    fn analyze(&self, forest: &mut Forest, tree: TreeId) -> Result<bool, TreeError> {
        let children: Vec<_> = forest.children(tree).collect();

        for (index, &sign) in children.iter().enumerate() {
            let Some(kind) = self.operands.operator(forest, sign, &self.signs).cloned() else {
                continue;
            };
            let prefix = index == 0 || !self.operands.is_operand(forest, children[index - 1]);
            let Some(&right) = children.get(index + 1) else {
                continue;
            };
            if !prefix || !self.operands.is_operand(forest, right) {
                continue;
            }

            let reference = Reference::between(
                forest.document(),
                forest.reference(sign).position(),
                forest.reference(right).end(),
            );
            let operator = forest.wrap(tree, Some((sign, right)), reference, Sketch::new(kind))?;
            forest.set_slot(operator, key::SIGN, sign);
            forest.set_slot(operator, key::RIGHT, right);
            return Ok(true);
        }

        Ok(false)
    }
}
