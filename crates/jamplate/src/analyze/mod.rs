//! Passes that regroup already parsed siblings into synthetic trees.
pub mod flow;
pub mod operator;

use smol_str::SmolStr;

use crate::tree::{Forest, TreeError, TreeId};

pub use flow::FlowAnalyzer;
pub use operator::{BinaryOperatorAnalyzer, UnaryOperatorAnalyzer};

/// Restructures the children of one tree.
///
/// Returns `true` when the hierarchy changed and analysis must start over.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, forest: &mut Forest, tree: TreeId) -> Result<bool, TreeError>;
}

/// Runs an analyzer only over trees of the `within` kinds.
pub struct ScopedAnalyzer {
    analyzer: Box<dyn Analyzer>,
    within: Vec<SmolStr>,
}

impl ScopedAnalyzer {
    pub fn new(analyzer: impl Analyzer + 'static, within: &[&str]) -> Self {
        Self {
            analyzer: Box::new(analyzer),
            within: within.iter().map(|kind| SmolStr::new(kind)).collect(),
        }
    }
}

impl Analyzer for ScopedAnalyzer {
    fn analyze(&self, forest: &mut Forest, tree: TreeId) -> Result<bool, TreeError> {
        if self.within.iter().any(|kind| kind == forest.kind(tree)) {
            self.analyzer.analyze(forest, tree)
        } else {
            Ok(false)
        }
    }
}

/// Applies `analyzers`, in order, depth-first over the whole forest.
///
/// After any change analysis restarts from the first analyzer, so earlier
/// analyzers always bind tighter. Returns the number of changes made.
#[tracing::instrument(level = "debug", skip_all, fields(document = %forest.document()))]
pub fn analyze(
    forest: &mut Forest,
    analyzers: &[Box<dyn Analyzer>],
    max_passes: usize,
) -> Result<usize, TreeError> {
    for pass in 0..max_passes {
        if !analyze_once(forest, analyzers)? {
            tracing::debug!(changes = pass, "analysis reached a fixed point");
            return Ok(pass);
        }
        tracing::trace!(pass, "hierarchy changed");
    }

    tracing::warn!(max_passes, "analysis stopped before reaching a fixed point");
    Ok(max_passes)
}

fn analyze_once(forest: &mut Forest, analyzers: &[Box<dyn Analyzer>]) -> Result<bool, TreeError> {
    for analyzer in analyzers {
        for tree in forest.descendants(forest.root()) {
            if analyzer.analyze(forest, tree)? {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
