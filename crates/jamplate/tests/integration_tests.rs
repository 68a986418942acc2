use std::sync::Arc;

use jamplate::{
    BufferConsole, Console, DiagnosticBuffer, Document, ExecutionError, InnerError, Instruction, Memory, MessageKind, Op,
    Optimization, Unit, Value,
    flavor::{self, kind},
    instruction::Arithmetic,
    runtime::Environment,
    sketch::key,
};
use rstest::{fixture, rstest};

#[fixture]
fn unit() -> Unit {
    Unit::new(Arc::new(flavor::spec().unwrap())).with_diagnostic(Arc::new(DiagnosticBuffer::new()))
}

fn render(unit: &mut Unit, source: &str) -> String {
    let console = BufferConsole::new();
    unit.process(&Document::new("doc", source), Box::new(console.clone()))
        .unwrap();
    console.read()
}

#[rstest]
#[case::greeting(
    "#declare name \"world\"\n#if name != \"\"\nHello #{name}#!\n#endif\n",
    "Hello world!\n"
)]
#[case::table(
    "#for row [{name: 'a', size: 1}, {name: 'b', size: 22}]\n| #{row.name}# | #{row.size * 2}# |\n#endfor\n",
    "| a | 2 |\n| b | 44 |\n"
)]
#[case::header_guard(
    "#define VERSION \"1.2\"\n#if __FLAVOR__ == 'jamplate'\nconst char *version = \"VERSION\";\n#endif\n",
    "const char *version = \"1.2\";\n"
)]
#[case::fizzbuzz(
    "#declare i 1\n#while i <= 5\n#if i % 3 == 0\nfizz\n#else\n#{i}#\n#endif\n#declare i i + 1\n#endwhile\n",
    "1\n2\nfizz\n4\n5\n"
)]
#[case::captured_list(
    "#capture list\n#for x ['a', 'b']\n- #{x}#\n#endfor\n#endcapture\n#{list}##{list}#",
    "- a\n- b\n- a\n- b\n"
)]
#[case::comment_in_body("#if true\n#* not printed *#yes\n#endif\n", "yes\n")]
#[case::indented_commands("  #if 1 < 2\n    inner\n  #endif\n", "    inner\n")]
#[case::empty("", "")]
fn test_render(mut unit: Unit, #[case] source: &str, #[case] expected: &str) {
    assert_eq!(render(&mut unit, source), expected);
}

#[rstest]
fn test_both_optimizations_agree(mut unit: Unit) {
    let source = "#for n [1, 2, 3]\n#if n != 2\n#{n * n}# #endif\n#endfor\n";
    let basic = render(&mut unit, source);
    unit.set_optimization(Optimization::None);
    let none = render(&mut unit, source);

    assert_eq!(basic, "1 9 ");
    assert_eq!(basic, none);
}

#[rstest]
fn test_documents_are_independent(mut unit: Unit) {
    let good = Document::new("good", "#{1 + 1}#");
    let bad = Document::new("bad", "#{1 / 0}#");

    assert!(unit.process(&bad, Box::new(BufferConsole::new())).is_err());
    let console = BufferConsole::new();
    unit.process(&good, Box::new(console.clone())).unwrap();
    assert_eq!(console.read(), "2");
}

#[rstest]
fn test_for_loop_resets_variable_and_line(mut unit: Unit) {
    let document = Document::new("doc", "#for i [1,2,3]\n#{i}##endfor\n#{__LINE__}#");
    let console = BufferConsole::new();
    let memory = unit.process(&document, Box::new(console.clone())).unwrap();

    assert_eq!(console.read(), "1233");
    assert!(memory.access("i").is_null());
}

#[rstest]
fn test_nested_flow_keeps_inner_flow_in_body(mut unit: Unit) {
    let document = Document::new("doc", "#if a\n#if b\n#endif\n#else\n#endif\n");
    unit.initialize(&document);
    unit.parse(&document).unwrap();
    unit.analyze(&document).unwrap();

    let forest = unit.compilation(&document).unwrap().forest();
    let outer = forest.children(forest.root()).next().unwrap();
    assert_eq!(forest.kind(outer), kind::IF_FLOW);
    assert_eq!(forest.text(forest.slot(outer, key::END).unwrap()), "#endif\n");
    assert_eq!(forest.reference(forest.slot(outer, key::END).unwrap()).position(), 25);

    let body = forest.slot(outer, key::BODY).unwrap();
    let inner = forest.children(body).next().unwrap();
    assert_eq!(forest.kind(inner), kind::IF_FLOW);
    assert_eq!(forest.text(inner), "#if b\n#endif\n");
}

#[rstest]
fn test_errors_point_at_their_source(mut unit: Unit) {
    let error = unit
        .process(&Document::new("doc", "line\n#{2 / 0}#\n"), Box::new(BufferConsole::new()))
        .unwrap_err();

    assert!(matches!(error.cause, InnerError::Execution(ExecutionError::ZeroDivision(_))));
    assert_eq!(&error.source_code[error.location.offset()..][..error.location.len()], "2 / 0");
}

#[test]
fn test_failures_reach_the_diagnostic() {
    let diagnostic = Arc::new(DiagnosticBuffer::new());
    let mut unit = Unit::new(Arc::new(flavor::spec().unwrap())).with_diagnostic(diagnostic.clone());
    let _ = unit.process(&Document::new("doc", "#endif\n"), Box::new(BufferConsole::new()));

    let messages = diagnostic.take();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Error);
    assert!(diagnostic.messages().is_empty());
}

fn exec(instruction: &Instruction, memory: &mut Memory) -> Result<(), ExecutionError> {
    instruction.exec(&Environment::new(Arc::new(DiagnosticBuffer::new())), memory)
}

#[test]
fn test_capture_leaves_outer_output_alone() {
    let console = BufferConsole::new();
    let mut memory = Memory::new(Box::new(console.clone()));
    let instruction = Instruction::block([
        Instruction::new(Op::PrintConst("A".into())),
        Instruction::capture(Instruction::new(Op::PrintConst("X".into()))),
        Instruction::new(Op::PrintConst("B".into())),
    ]);

    exec(&instruction, &mut memory).unwrap();
    assert_eq!(console.read(), "AB");
    assert_eq!(memory.peek().map(|value| value.eval(&memory)), Some("X".to_string()));
}

#[test]
fn test_division_by_zero_is_an_execution_error() {
    let mut memory = Memory::new(Box::new(BufferConsole::new()));
    let instruction = Instruction::block([
        Instruction::push("10"),
        Instruction::push("0"),
        Instruction::new(Op::Arithmetic(Arithmetic::Quotient)),
    ]);

    assert!(matches!(
        exec(&instruction, &mut memory),
        Err(ExecutionError::ZeroDivision(_))
    ));
}

#[rstest]
#[case(Value::Null, Value::Null, 0)]
#[case(Value::Null, Value::new(""), -1)]
#[case(Value::new("x"), Value::Null, 1)]
#[case(Value::new("2"), Value::new("10"), -1)]
#[case(Value::new("b"), Value::new("a"), 1)]
fn test_compare(#[case] left: Value, #[case] right: Value, #[case] expected: i32) {
    let memory = Memory::new(Box::new(BufferConsole::new()));
    assert_eq!(left.compare(&right, &memory), expected);
}
