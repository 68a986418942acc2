use smol_str::SmolStr;

use crate::{
    reference::Reference,
    sketch::Sketch,
    tree::{Forest, TreeError, TreeId},
};

/// A tree proposed by a parser, not yet part of any forest.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    reference: Reference,
    kind: SmolStr,
    weight: i32,
    components: Vec<(SmolStr, Candidate)>,
}

impl Candidate {
    pub fn new(reference: Reference, kind: impl Into<SmolStr>) -> Self {
        Self {
            reference,
            kind: kind.into(),
            weight: 0,
            components: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_component(mut self, key: impl Into<SmolStr>, component: Candidate) -> Self {
        self.components.push((key.into(), component));
        self
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, &Candidate)> {
        self.components
            .iter()
            .map(|(key, component)| (key.as_str(), component))
    }

    /// Offers this candidate into `parent`, then its components into the new
    /// tree, filling the matching slots.
    pub fn plant(&self, forest: &mut Forest, parent: TreeId) -> Result<TreeId, TreeError> {
        let id = forest.create(self.reference.clone(), Sketch::new(self.kind.clone()), self.weight);
        forest.offer(parent, id)?;

        for (key, component) in &self.components {
            let child = component.plant(forest, id)?;
            forest.set_slot(id, key, child);
        }

        Ok(id)
    }
}
