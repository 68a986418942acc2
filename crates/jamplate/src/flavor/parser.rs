use crate::parse::{EnclosureParser, MergeParser, Parser, PatternParser, ScopedParser, SymbolParser};

use super::kind::*;

/// Consumes the indentation of a command that starts its line.
const INDENT: &str = r"(?m)(?:^[ \t]*)?";
/// The rest of the line, up to and including the line break.
const PARAMETER_TAIL: &str = r"(?:[ \t]+(?P<parameter>[^\r\n]*?))?[ \t]*(?:\r?\n|$)";

const SIGNS: &[&str] = &[
    ".", "!", "-", "*", "/", "%", "+", "<", ">", "<=", ">=", "==", "!=", "&&", "||", ":",
];

/// The shape of a command line.
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// `#name` alone.
    Bare,
    /// `#name KEY`.
    Key,
    /// `#name expression`.
    Parameter,
    /// `#name KEY expression`.
    KeyParameter,
}

fn command(name: &str, shape: Shape) -> Result<PatternParser, regex_lite::Error> {
    let pattern = match shape {
        Shape::Bare => format!(r"{INDENT}#{name}\b[ \t]*(?:\r?\n)?"),
        Shape::Key => format!(r"{INDENT}#{name}[ \t]+(?P<key>\w+)[ \t]*(?:\r?\n|$)"),
        Shape::Parameter => format!(r"{INDENT}#{name}{PARAMETER_TAIL}"),
        Shape::KeyParameter => format!(r"{INDENT}#{name}[ \t]+(?P<key>\w+){PARAMETER_TAIL}"),
    };

    Ok(PatternParser::new(name, &pattern)?
        .with_group("key", KEY)
        .with_group("parameter", PARAMETER))
}

/// Literals, references and signs: the atoms of an expression.
fn atoms() -> Result<MergeParser, regex_lite::Error> {
    let symbols = SIGNS
        .iter()
        .map(|sign| (*sign, SIGN))
        .chain(std::iter::once((",", COMMA)));

    Ok(MergeParser::flat(vec![
        Box::new(PatternParser::new(STRING, r#""(?P<body>(?:[^"\\]|\\.)*)""#)?.with_group("body", TEXT)),
        Box::new(PatternParser::new(STRING, r"'(?P<body>(?:[^'\\]|\\.)*)'")?.with_group("body", TEXT)),
        Box::new(PatternParser::new(NUMBER, r"\d+(?:\.\d+)?")?),
        Box::new(PatternParser::new(REFERENCE, r"[A-Za-z_][A-Za-z0-9_]*")?),
        Box::new(SymbolParser::new(symbols)?),
    ]))
}

/// The parser of the jamplate flavor, highest priority first.
pub fn parser() -> Result<Box<dyn Parser>, regex_lite::Error> {
    let commands = [
        (DECLARE, Shape::KeyParameter),
        (DEFINE, Shape::KeyParameter),
        (FOR, Shape::KeyParameter),
        (UNDEF, Shape::Key),
        (CAPTURE, Shape::Key),
        (CONSOLE, Shape::Parameter),
        (MESSAGE, Shape::Parameter),
        (ERROR, Shape::Parameter),
        (IF, Shape::Parameter),
        (ELIF, Shape::Parameter),
        (WHILE, Shape::Parameter),
        (ELSE, Shape::Bare),
        (ENDIF, Shape::Bare),
        (ENDFOR, Shape::Bare),
        (ENDWHILE, Shape::Bare),
        (ENDCAPTURE, Shape::Bare),
    ];

    let mut parsers: Vec<Box<dyn Parser>> = vec![
        Box::new(ScopedParser::new(atoms()?, &[PARAMETER])),
        Box::new(ScopedParser::new(
            EnclosureParser::new(COMMENT, r"#\*", r"\*#")?.with_body_kind(TEXT),
            &[ROOT],
        )),
    ];

    // Commands come before injections so that an injection on a command line
    // lands in its parameter.
    for (name, shape) in commands {
        parsers.push(Box::new(ScopedParser::new(command(name, shape)?, &[ROOT])));
    }

    // Lighter than a parameter it fills entirely, so it nests inside.
    parsers.push(Box::new(ScopedParser::new(
        EnclosureParser::new(INJECTION, r"#\{", r"\}#")?
            .with_body_kind(PARAMETER)
            .with_weight(-1),
        &[ROOT],
    )));

    for (kind, open, close) in [(GROUP, r"\(", r"\)"), (ARRAY, r"\[", r"\]"), (OBJECT, r"\{", r"\}")] {
        parsers.push(Box::new(ScopedParser::new(
            EnclosureParser::new(kind, open, close)?.with_body_kind(PARAMETER),
            &[PARAMETER],
        )));
    }

    Ok(Box::new(MergeParser::new(parsers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{document::Document, parse, sketch::Sketch, tree::Forest};
    use rstest::rstest;

    fn forest(source: &str) -> Forest {
        let document = Document::new("doc", source);
        let mut forest = Forest::new(&document, Sketch::new(ROOT));
        parse::parse(&mut forest, &parser().unwrap(), 100).unwrap();
        forest
    }

    fn kinds(forest: &Forest, tree: crate::tree::TreeId) -> Vec<(String, String)> {
        forest
            .children(tree)
            .map(|child| (forest.kind(child).to_string(), forest.text(child).to_string()))
            .collect()
    }

    #[rstest]
    #[case::bare("#endif\n", ENDIF, "#endif\n")]
    #[case::indented("  #else  \nx", ELSE, "  #else  \n")]
    #[case::parameter("#if a < 2\nx", IF, "#if a < 2\n")]
    #[case::key("#capture out\n", CAPTURE, "#capture out\n")]
    #[case::last_line("#message done", MESSAGE, "#message done")]
    fn test_commands(#[case] source: &str, #[case] kind: &str, #[case] text: &str) {
        let forest = forest(source);
        let children = kinds(&forest, forest.root());
        assert_eq!(children[0], (kind.to_string(), text.to_string()));
    }

    #[test]
    fn test_command_names_need_a_boundary() {
        let forest = forest("#ifdef\n#elsewhere\n");
        assert_eq!(forest.children(forest.root()).count(), 0);
    }

    #[test]
    fn test_command_after_injection() {
        let forest = forest("#{i}##endfor\n");
        let children = kinds(&forest, forest.root());
        assert_eq!(
            children,
            vec![
                (INJECTION.to_string(), "#{i}#".to_string()),
                (ENDFOR.to_string(), "#endfor\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_declare_components() {
        let forest = forest("#declare x 1 + 2\n");
        let declare = forest.children(forest.root()).next().unwrap();
        let key = forest.slot(declare, "key").unwrap();
        let parameter = forest.slot(declare, "parameter").unwrap();
        assert_eq!(forest.text(key), "x");
        assert_eq!(forest.kind(parameter), PARAMETER);
        assert_eq!(
            kinds(&forest, parameter),
            vec![
                (NUMBER.to_string(), "1".to_string()),
                (SIGN.to_string(), "+".to_string()),
                (NUMBER.to_string(), "2".to_string()),
            ]
        );
    }

    #[rstest]
    #[case::whole("#declare x #{1}#\n", vec![INJECTION])]
    #[case::among_values("#message 'a' #{b}# c\n", vec![STRING, INJECTION, REFERENCE])]
    fn test_injections_in_parameters(#[case] source: &str, #[case] expected: Vec<&str>) {
        let forest = forest(source);
        let children: Vec<_> = forest.children(forest.root()).collect();
        assert_eq!(children.len(), 1);

        let parameter = forest.slot(children[0], "parameter").unwrap();
        let kinds: Vec<_> = forest.children(parameter).map(|child| forest.kind(child).to_string()).collect();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn test_comments_hide_their_contents() {
        let forest = forest("a #* #{ x }# *# b");
        let children = kinds(&forest, forest.root());
        assert_eq!(children, vec![(COMMENT.to_string(), "#* #{ x }# *#".to_string())]);
    }

    #[test]
    fn test_strings_hide_brackets_and_signs() {
        let forest = forest(r#"#{ "[a + b" (c) }#"#);
        let injection = forest.children(forest.root()).next().unwrap();
        let body = forest.slot(injection, "body").unwrap();
        let children: Vec<_> = kinds(&forest, body).into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(children, vec![STRING.to_string(), GROUP.to_string()]);
    }

    #[test]
    fn test_signs_prefer_the_longest() {
        let forest = forest("#{a<=b}#");
        let injection = forest.children(forest.root()).next().unwrap();
        let body = forest.slot(injection, "body").unwrap();
        let texts: Vec<_> = kinds(&forest, body).into_iter().map(|(_, text)| text).collect();
        assert_eq!(texts, vec!["a", "<=", "b"]);
    }

    #[test]
    fn test_nested_objects_in_an_injection() {
        let forest = forest("#{ {a: [1, 2]}}#");
        let injection = forest.children(forest.root()).next().unwrap();
        let body = forest.slot(injection, "body").unwrap();
        let object = forest.children(body).next().unwrap();
        assert_eq!(forest.kind(object), OBJECT);
        assert_eq!(forest.text(object), "{a: [1, 2]}");

        let inner = forest.slot(object, "body").unwrap();
        let children: Vec<_> = kinds(&forest, inner).into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(children, vec![REFERENCE, SIGN, ARRAY]);
    }
}
