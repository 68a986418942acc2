use crate::analyze::{Analyzer, BinaryOperatorAnalyzer, FlowAnalyzer, ScopedAnalyzer, UnaryOperatorAnalyzer};

use super::kind::*;

/// The analyzers of the jamplate flavor: flows first, then operators from the
/// tightest binding to the loosest.
pub fn analyzers() -> Vec<Box<dyn Analyzer>> {
    let flows = [
        FlowAnalyzer::new(IF_FLOW, &[IF], &[ELIF, ELSE], &[ENDIF]),
        FlowAnalyzer::new(FOR_FLOW, &[FOR], &[], &[ENDFOR]),
        FlowAnalyzer::new(WHILE_FLOW, &[WHILE], &[], &[ENDWHILE]),
        FlowAnalyzer::new(CAPTURE_FLOW, &[CAPTURE], &[], &[ENDCAPTURE]),
    ];

    let binary = |signs: &[(&str, &str)]| -> Box<dyn Analyzer> {
        Box::new(ScopedAnalyzer::new(
            BinaryOperatorAnalyzer::new(SIGN, signs, &[COMMA]),
            &[PARAMETER],
        ))
    };

    let mut analyzers: Vec<Box<dyn Analyzer>> = flows
        .into_iter()
        .map(|flow| Box::new(ScopedAnalyzer::new(flow.with_body_kind(BODY), &[ROOT, BODY])) as Box<dyn Analyzer>)
        .collect();

    analyzers.push(binary(&[(".", GETTER)]));
    analyzers.push(Box::new(ScopedAnalyzer::new(
        UnaryOperatorAnalyzer::new(SIGN, &[("!", NOT), ("-", NEGATE)], &[COMMA]),
        &[PARAMETER],
    )));
    analyzers.push(binary(&[("*", PRODUCT), ("/", QUOTIENT), ("%", MODULO)]));
    analyzers.push(binary(&[("+", SUM), ("-", DIFFERENCE)]));
    analyzers.push(binary(&[
        ("<", LESS),
        (">", GREATER),
        ("<=", LESS_EQUAL),
        (">=", GREATER_EQUAL),
    ]));
    analyzers.push(binary(&[("==", EQUAL), ("!=", NOT_EQUAL)]));
    analyzers.push(binary(&[("&&", AND)]));
    analyzers.push(binary(&[("||", OR)]));
    analyzers.push(binary(&[(":", PAIR)]));
    analyzers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyze, document::Document, flavor::parser::parser, parse, sketch::Sketch, tree::Forest,
        tree::TreeId,
    };
    use rstest::rstest;

    fn forest(source: &str) -> Forest {
        let document = Document::new("doc", source);
        let mut forest = Forest::new(&document, Sketch::new(ROOT));
        parse::parse(&mut forest, &parser().unwrap(), 100).unwrap();
        analyze::analyze(&mut forest, &analyzers(), 1000).unwrap();
        forest
    }

    /// Renders an operator tree as nested parentheses.
    fn render(forest: &Forest, tree: TreeId) -> String {
        let kind = forest.kind(tree);
        match (forest.slot(tree, "left"), forest.slot(tree, "right")) {
            (Some(left), Some(right)) => {
                format!("({} {kind} {})", render(forest, left), render(forest, right))
            }
            (None, Some(right)) => format!("({kind} {})", render(forest, right)),
            _ => forest.text(tree).trim().to_string(),
        }
    }

    fn expression(source: &str) -> String {
        let forest = forest(&format!("#{{{source}}}#"));
        let injection = forest.children(forest.root()).next().unwrap();
        let body = forest.slot(injection, "body").unwrap();
        forest
            .children(body)
            .map(|child| render(&forest, child))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[rstest]
    #[case::precedence("1 + 2 * 3", "(1 sum (2 product 3))")]
    #[case::left_associative("1 - 2 - 3", "((1 difference 2) difference 3)")]
    #[case::negation("-a * b", "((negate a) product b)")]
    #[case::negated_getter("!a.b", "(not (a getter b))")]
    #[case::comparison("a < b && c >= d", "((a less b) and (c greater-equal d))")]
    #[case::logic("a || b && c", "(a or (b and c))")]
    #[case::pair("a: 1 + 2", "(a pair (1 sum 2))")]
    #[case::binary_minus_after_operand("a -1", "(a difference 1)")]
    fn test_operator_precedence(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(expression(source), expected);
    }

    #[test]
    fn test_commas_separate_operands() {
        let forest = forest("#{[a, -b]}#");
        let injection = forest.children(forest.root()).next().unwrap();
        let body = forest.slot(injection, "body").unwrap();
        let array = forest.children(body).next().unwrap();
        let items = forest.slot(array, "body").unwrap();
        let rendered: Vec<_> = forest.children(items).map(|child| render(&forest, child)).collect();
        assert_eq!(rendered, vec!["a", ",", "(negate b)"]);
    }

    #[test]
    fn test_flows_nest() {
        let forest = forest("#for i x\n#if i\ny\n#endif\n#endfor\n");
        let root_children: Vec<_> = forest.children(forest.root()).collect();
        assert_eq!(root_children.len(), 1);

        let flow = root_children[0];
        assert_eq!(forest.kind(flow), FOR_FLOW);
        let body = forest.slot(flow, "body").unwrap();
        let inner: Vec<_> = forest.children(body).map(|child| forest.kind(child).to_string()).collect();
        assert_eq!(inner, vec![IF_FLOW]);
    }

    #[test]
    fn test_unmatched_commands_stay_put() {
        let forest = forest("#endif\n#if x\n");
        let kinds: Vec<_> = forest
            .children(forest.root())
            .map(|child| forest.kind(child).to_string())
            .collect();
        assert_eq!(kinds, vec![ENDIF, IF]);
    }
}
