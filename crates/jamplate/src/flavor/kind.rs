//! Tree kinds of the jamplate flavor.

pub const ROOT: &str = "root";
/// The body of a flow. Scanned for flows, printed as text.
pub const BODY: &str = "body";
/// Text that is never scanned: comment and string contents.
pub const TEXT: &str = "text";
/// An expression: injection contents, command parameters and bracket contents.
pub const PARAMETER: &str = "parameter";
pub const KEY: &str = "key";

pub const COMMENT: &str = "comment";
pub const INJECTION: &str = "injection";

pub const DECLARE: &str = "declare";
pub const DEFINE: &str = "define";
pub const UNDEF: &str = "undef";
pub const CONSOLE: &str = "console";
pub const MESSAGE: &str = "message";
pub const ERROR: &str = "error";
pub const IF: &str = "if";
pub const ELIF: &str = "elif";
pub const ELSE: &str = "else";
pub const ENDIF: &str = "endif";
pub const FOR: &str = "for";
pub const ENDFOR: &str = "endfor";
pub const WHILE: &str = "while";
pub const ENDWHILE: &str = "endwhile";
pub const CAPTURE: &str = "capture";
pub const ENDCAPTURE: &str = "endcapture";

pub const IF_FLOW: &str = "if-flow";
pub const FOR_FLOW: &str = "for-flow";
pub const WHILE_FLOW: &str = "while-flow";
pub const CAPTURE_FLOW: &str = "capture-flow";

pub const REFERENCE: &str = "reference";
pub const NUMBER: &str = "number";
pub const STRING: &str = "string";
pub const SIGN: &str = "sign";
pub const COMMA: &str = "comma";
pub const GROUP: &str = "group";
pub const ARRAY: &str = "array";
pub const OBJECT: &str = "object";

pub const GETTER: &str = "getter";
pub const NOT: &str = "not";
pub const NEGATE: &str = "negate";
pub const PRODUCT: &str = "product";
pub const QUOTIENT: &str = "quotient";
pub const MODULO: &str = "modulo";
pub const SUM: &str = "sum";
pub const DIFFERENCE: &str = "difference";
pub const LESS: &str = "less";
pub const GREATER: &str = "greater";
pub const LESS_EQUAL: &str = "less-equal";
pub const GREATER_EQUAL: &str = "greater-equal";
pub const EQUAL: &str = "equal";
pub const NOT_EQUAL: &str = "not-equal";
pub const AND: &str = "and";
pub const OR: &str = "or";
pub const PAIR: &str = "pair";

/// Commands that only make sense as part of a flow.
pub const FLOW_COMMANDS: &[&str] = &[
    IF, ELIF, ELSE, ENDIF, FOR, ENDFOR, WHILE, ENDWHILE, CAPTURE, ENDCAPTURE,
];
