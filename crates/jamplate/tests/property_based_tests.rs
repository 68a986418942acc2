//! Property-based tests for the tree model and the parse driver.
use jamplate::{
    Document, Forest, Reference, Relation, Sketch, TreeId,
    dominance::encloses,
    flavor::{self, kind},
    parse::{self, Candidate, merge},
};
use proptest::prelude::*;

mod strategies {
    use super::*;

    /// Spans inside a document of length 24, zero-length ones included.
    pub fn span() -> impl Strategy<Value = (u32, u32)> {
        (0u32..=24).prop_flat_map(|start| (Just(start), start..=24))
    }

    /// Sources assembled from fragments of the flavor, balanced or not.
    pub fn source() -> impl Strategy<Value = String> {
        let fragment = prop::sample::select(vec![
            "text ", "\n", "#{", "}#", "#*", "*#", "(", ")", "[", "]", "{", "}", "1", "+", " * ", "'q'", "\"",
            ", ", "a.b", "#if x\n", "#else\n", "#endif\n", "#for i [1]\n", "#endfor\n", "#declare n 2\n",
        ]);
        prop::collection::vec(fragment, 0..24).prop_map(|fragments| fragments.concat())
    }
}

fn document() -> Document {
    Document::new("doc", "0123456789abcdefghijklmn")
}

fn parsed(source: &str) -> Option<Forest> {
    let spec = flavor::spec().ok()?;
    let mut forest = Forest::new(&Document::new("doc", source), Sketch::new(kind::ROOT));
    parse::parse(&mut forest, &spec.parser, 1_000).ok()?;
    Some(forest)
}

/// Every child lies inside its parent, and siblings are ordered and disjoint.
fn assert_well_formed(forest: &Forest, tree: TreeId) -> Result<(), TestCaseError> {
    let parent = forest.reference(tree);
    let children: Vec<_> = forest.children(tree).collect();

    for child in &children {
        prop_assert!(encloses(parent, forest.reference(*child)));
        assert_well_formed(forest, *child)?;
    }
    for pair in children.windows(2) {
        prop_assert!(forest.reference(pair[0]).end() <= forest.reference(pair[1]).position());
    }

    Ok(())
}

proptest! {
    #[test]
    fn test_relation_inverse_is_documented((s, e) in strategies::span(), (i, j) in strategies::span()) {
        let relation = Relation::compute(s, e, i, j);
        let opposite = Relation::compute(i, j, s, e);
        prop_assert!(
            relation.inverse().contains(&opposite),
            "[{s}, {e}) -> [{i}, {j}) is {relation:?}, back is {opposite:?}"
        );
    }

    #[test]
    fn test_parsed_forest_is_well_formed(source in strategies::source()) {
        if let Some(forest) = parsed(&source) {
            assert_well_formed(&forest, forest.root())?;
        }
    }

    #[test]
    fn test_parse_is_idempotent(source in strategies::source()) {
        let spec = flavor::spec().unwrap();
        let mut forest = Forest::new(&Document::new("doc", source.as_str()), Sketch::new(kind::ROOT));
        if parse::parse(&mut forest, &spec.parser, 1_000).is_ok() {
            let trees = forest.descendants(forest.root()).len();
            prop_assert_eq!(parse::parse(&mut forest, &spec.parser, 1_000).unwrap(), 0);
            prop_assert_eq!(forest.descendants(forest.root()).len(), trees);
        }
    }

    #[test]
    fn test_merge_groups_in_one_pass(
        spans in prop::collection::vec((strategies::span(), 0i32..3), 0..12),
        split in 0usize..12,
        flat in any::<bool>(),
    ) {
        let document = document();
        let candidates: Vec<_> = spans
            .into_iter()
            .map(|((start, end), weight)| {
                Candidate::new(Reference::between(&document, start, end), "leaf").with_weight(weight)
            })
            .collect();
        let split = split.min(candidates.len());
        let (first, second) = candidates.split_at(split);

        let stepwise = merge::merge([first.to_vec(), second.to_vec()], flat);
        let at_once = merge::merge([candidates.clone()], flat);
        prop_assert_eq!(stepwise, at_once);
    }

    #[test]
    fn test_merged_candidates_never_share(
        spans in prop::collection::vec(strategies::span(), 0..12),
        flat in any::<bool>(),
    ) {
        let document = document();
        let groups = spans
            .into_iter()
            .map(|(start, end)| vec![Candidate::new(Reference::between(&document, start, end), "leaf")]);

        let accepted = merge::merge(groups, flat);
        for (index, a) in accepted.iter().enumerate() {
            for b in &accepted[index + 1..] {
                let relation = a.reference().relation(b.reference());
                prop_assert!(!matches!(relation, Relation::Overflow | Relation::Underflow));
            }
        }
    }
}
