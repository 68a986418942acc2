//! The built-in "jamplate" flavor.
//!
//! ```text
//! #* a comment *#
//! #declare name "world"
//! #if name != ""
//! Hello #{name}#!
//! #endif
//! ```
pub mod analyzer;
pub mod builtin;
pub mod compiler;
pub mod expression;
pub mod kind;
pub mod parser;

use crate::unit::Spec;

pub const NAME: &str = "jamplate";

/// Assembles the flavor. Fails only if one of its patterns does not compile.
pub fn spec() -> Result<Spec, regex_lite::Error> {
    Ok(Spec {
        name: NAME.into(),
        root: kind::ROOT.into(),
        parser: parser::parser()?,
        analyzers: analyzer::analyzers(),
        compiler: compiler::compiler(),
        hooks: vec![Box::new(builtin::Builtins)],
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use crate::{
        compile::CompileError,
        diagnostic::DiagnosticBuffer,
        document::Document,
        error::InnerError,
        runtime::{BufferConsole, Console, ExecutionError},
        unit::Unit,
    };

    fn unit() -> Unit {
        Unit::new(Arc::new(super::spec().unwrap())).with_diagnostic(Arc::new(DiagnosticBuffer::new()))
    }

    fn render(source: &str) -> String {
        let console = BufferConsole::new();
        unit()
            .process(&Document::new("doc", source), Box::new(console.clone()))
            .unwrap();
        console.read()
    }

    fn failure(source: &str) -> InnerError {
        unit()
            .process(&Document::new("doc", source), Box::new(BufferConsole::new()))
            .unwrap_err()
            .cause
    }

    #[rstest]
    #[case::text("plain text\n", "plain text\n")]
    #[case::comment("a#* hidden #{x}# *#b", "ab")]
    #[case::glue(r#"#{"a" 1 'b'}#"#, "a1b")]
    #[case::arithmetic("#{(1 + 2) * 3 - 4 / 2}#", "7")]
    #[case::modulo("#{7 % 4}#", "3")]
    #[case::tiny_divisor("#{1 / 0.0000000000000000001 > 1}#", "true")]
    #[case::tiny_equality("#{0.0000000000000000001 == 0}#", "false")]
    #[case::concatenation(r#"#{"a" + 1}#"#, "a1")]
    #[case::negation("#{-(2 * 3)}#", "-6")]
    #[case::comparisons("#{1 < 2}# #{2 <= 1}# #{3 >= 3}# #{2 > 10}#", "true false true false")]
    #[case::equality(r#"#{"a" == "a"}# #{1 != 1}#"#, "true false")]
    #[case::logic("#{true && !false}# #{false || null}#", "true false")]
    #[case::array("#{[1, 'two', [3]]}#", r#"[1,"two",[3]]"#)]
    #[case::object("#{{a: 1, 'b c': [true]}}#", r#"{"a":1,"b c":[true]}"#)]
    #[case::getter("#{{a: {b: 'deep'}}.a.b}# #{[10, 20].1}#", "deep 20")]
    #[case::escapes(r#"#{"tab\there"}#"#, "tab\there")]
    fn test_expressions(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(render(source), expected);
    }

    #[rstest]
    #[case::declare("#declare x 4\n#{x * x}#", "16")]
    #[case::declare_null("#declare x\n[#{x}#]", "[]")]
    #[case::define("#define NAME \"Bob\"\nHi NAME, NAMES\n", "Hi Bob, Bobs\n")]
    #[case::undef("#define A \"1\"\nA\n#undef A\nA\n", "1\nA\n")]
    #[case::define_longest_first("#define A \"x\"\n#define AB \"y\"\nAB A\n", "y x\n")]
    #[case::define_single_pass("#define AA 'B'\n#define B 'X'\nAA B\n", "B X\n")]
    #[case::injected_parameter("#declare x #{1 + 1}#\n#{x * 3}#", "6")]
    #[case::injection_among_values("#declare x 'a' #{'b'}# 'c'\n#{x}#", "abc")]
    #[case::line("a\n#{__LINE__}#\n", "a\n2\n")]
    #[case::flavor("#{__FLAVOR__}#", "jamplate")]
    fn test_commands(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(render(source), expected);
    }

    #[rstest]
    #[case::then("#declare x 1\n#if x == 1\none\n#elif x == 2\ntwo\n#else\nother\n#endif\n", "one\n")]
    #[case::elif("#declare x 2\n#if x == 1\none\n#elif x == 2\ntwo\n#else\nother\n#endif\n", "two\n")]
    #[case::otherwise("#declare x 3\n#if x == 1\none\n#elif x == 2\ntwo\n#else\nother\n#endif\n", "other\n")]
    #[case::no_branch("#if false\nno\n#endif\nafter\n", "after\n")]
    #[case::nested("#if true\n#if false\nx\n#else\ny\n#endif\n#endif\n", "y\n")]
    #[case::tiny_condition("#if 0.0000000000000000001\nT\n#else\nF\n#endif\n", "T\n")]
    fn test_if(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(render(source), expected);
    }

    #[test]
    fn test_for_prints_each_item() {
        assert_eq!(render("#for i [1, 2, 3]\n#{i}##endfor\n"), "123");
        assert_eq!(render("#for i [1, 2, 3]\n#{i}#\n#endfor\n"), "1\n2\n3\n");
    }

    #[test]
    fn test_for_resets_its_variable_and_line() {
        let source = "#for i ['a', 'b']\n#{i}##endfor\n[#{i}#] #{__LINE__}#";
        assert_eq!(render(source), "ab[] 3");
    }

    #[test]
    fn test_for_over_nothing() {
        assert_eq!(render("#for i []\nnever\n#endfor\ndone"), "done");
    }

    #[test]
    fn test_while_counts_down() {
        let source = "#declare n 3\n#while n > 0\n#{n}#\n#declare n n - 1\n#endwhile\n";
        assert_eq!(render(source), "3\n2\n1\n");
    }

    #[test]
    fn test_capture() {
        let source = "#capture greeting\nHello #{'you'}#\n#endcapture\n[#{greeting}#]";
        assert_eq!(render(source), "[Hello you\n]");
    }

    #[test]
    fn test_console_redirects_output() {
        let console = BufferConsole::new();
        let memory = unit()
            .process(
                &Document::new("doc", "main\n#console \"side.txt\"\nside #{__OUTPUT__}#\n"),
                Box::new(console.clone()),
            )
            .unwrap();

        assert_eq!(console.read(), "main\n");
        let outputs: Vec<_> = memory.outputs().collect();
        assert_eq!(outputs, vec![("side.txt", "side side.txt\n".to_string())]);
    }

    #[test]
    fn test_message_reports_a_note() {
        let diagnostic = Arc::new(DiagnosticBuffer::new());
        let mut unit = Unit::new(Arc::new(super::spec().unwrap())).with_diagnostic(diagnostic.clone());
        unit.process(
            &Document::new("doc", "#message 'hi ' 1 + 1\n"),
            Box::new(BufferConsole::new()),
        )
        .unwrap();

        let titles: Vec<_> = diagnostic.messages().into_iter().map(|message| message.title).collect();
        assert_eq!(titles, vec!["hi 2"]);
    }

    #[rstest]
    #[case::endif("text\n#endif\n")]
    #[case::unclosed_for("#for i [1]\nbody\n")]
    #[case::else_alone("#else\n")]
    fn test_outside_flow(#[case] source: &str) {
        assert!(matches!(
            failure(source),
            InnerError::Compile(CompileError::OutsideFlow(_))
        ));
    }

    #[test]
    fn test_unrecognized_expression() {
        let error = failure("#{1 +}#");
        assert_eq!(error.to_string(), "Unrecognized `+`");
    }

    #[test]
    fn test_missing_parameter() {
        assert!(matches!(
            failure("#if\nx\n#endif\n"),
            InnerError::Compile(CompileError::MissingComponent { .. })
        ));
    }

    #[test]
    fn test_division_by_zero() {
        let error = failure("#{10 / 0}#");
        assert!(matches!(error, InnerError::Execution(ExecutionError::ZeroDivision(_))));
        assert_eq!(error.reference().map(|reference| reference.text()), Some("10 / 0"));
    }

    #[test]
    fn test_error_command() {
        let error = failure("#error 'bad ' 'input'\n");
        assert!(matches!(error, InnerError::Execution(ExecutionError::UserDefined { .. })));
        assert_eq!(error.to_string(), "bad input");
    }

    #[test]
    fn test_iteration_limit() {
        let mut unit = unit();
        unit.set_max_iterations(Some(50));
        let error = unit
            .process(
                &Document::new("doc", "#while true\n#endwhile\n"),
                Box::new(BufferConsole::new()),
            )
            .unwrap_err();
        assert!(matches!(
            error.cause,
            InnerError::Execution(ExecutionError::IterationLimit { limit: 50, .. })
        ));
    }
}
