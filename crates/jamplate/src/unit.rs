use std::{collections::BTreeMap, fmt, path::PathBuf, sync::Arc};

use smol_str::SmolStr;

use crate::{
    analyze::{self, Analyzer},
    compilation::Compilation,
    compile::{self, Compiler},
    diagnostic::{Diagnostic, Message, MessageKind, TracingDiagnostic},
    document::Document,
    error::{Error, InnerError},
    instruction::Optimization,
    parse::{self, Parser},
    runtime::{Console, Environment, Memory, Value},
};

/// Callbacks a flavor gets around every compilation.
pub trait Hook: Send + Sync {
    /// Called once a compilation is created, before it is parsed.
    fn on_create_compilation(&self, _options: &Options, _compilation: &mut Compilation) {}

    /// Called once the top-level instruction finished, whether it failed or not.
    fn on_destroy_memory(&self, _compilation: &Compilation, _memory: &mut Memory) {}
}

/// Everything that makes up a flavor of the language.
pub struct Spec {
    pub name: SmolStr,
    /// The kind of the root tree of every compilation.
    pub root: SmolStr,
    pub parser: Box<dyn Parser>,
    /// Ordered from the tightest binding to the loosest.
    pub analyzers: Vec<Box<dyn Analyzer>>,
    pub compiler: Box<dyn Compiler>,
    pub hooks: Vec<Box<dyn Hook>>,
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("analyzers", &self.analyzers.len())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub optimization: Optimization,
    /// Total loop iterations allowed per execution. Unbounded when `None`.
    pub max_iterations: Option<u64>,
    pub max_rounds: usize,
    pub project: Option<PathBuf>,
    /// Globals set on every compilation after the flavor's own.
    pub globals: Vec<(SmolStr, String)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            optimization: Optimization::default(),
            max_iterations: None,
            max_rounds: 10_000,
            project: None,
            globals: Vec::new(),
        }
    }
}

/// Drives documents through every phase of a [`Spec`].
pub struct Unit {
    spec: Arc<Spec>,
    options: Options,
    diagnostic: Arc<dyn Diagnostic>,
    compilations: BTreeMap<String, Compilation>,
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("spec", &self.spec)
            .field("options", &self.options)
            .field("compilations", &self.compilations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Unit {
    pub fn new(spec: Arc<Spec>) -> Self {
        Self {
            spec,
            options: Options::default(),
            diagnostic: Arc::new(TracingDiagnostic),
            compilations: BTreeMap::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Arc<dyn Diagnostic>) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_optimization(&mut self, optimization: Optimization) {
        self.options.optimization = optimization;
    }

    pub fn set_max_iterations(&mut self, max_iterations: Option<u64>) {
        self.options.max_iterations = max_iterations;
    }

    pub fn set_max_rounds(&mut self, max_rounds: usize) {
        self.options.max_rounds = max_rounds;
    }

    pub fn set_project(&mut self, project: Option<PathBuf>) {
        self.options.project = project;
    }

    /// Sets a global on every compilation initialized from now on.
    pub fn define_global(&mut self, name: &str, value: &str) {
        let name = SmolStr::new(name);
        self.options.globals.retain(|(existing, _)| *existing != name);
        self.options.globals.push((name, value.to_string()));
    }

    pub fn compilation(&self, document: &Document) -> Option<&Compilation> {
        self.compilations.get(document.name())
    }

    /// Creates a fresh compilation for `document`, replacing any previous one.
    pub fn initialize(&mut self, document: &Document) {
        let mut compilation = Compilation::new(document, &self.spec.root);
        for hook in &self.spec.hooks {
            hook.on_create_compilation(&self.options, &mut compilation);
        }
        for (name, value) in &self.options.globals {
            compilation.set_global(name.clone(), Value::new(value.as_str()));
        }

        tracing::debug!(document = %document, flavor = %self.spec.name, "initialized");
        self.compilations.insert(document.name().to_string(), compilation);
    }

    #[allow(clippy::result_large_err)]
    pub fn parse(&mut self, document: &Document) -> Result<(), Error> {
        self.run(document, |spec, options, compilation| {
            parse::parse(compilation.forest_mut(), &spec.parser, options.max_rounds)?;
            Ok(())
        })
    }

    #[allow(clippy::result_large_err)]
    pub fn analyze(&mut self, document: &Document) -> Result<(), Error> {
        self.run(document, |spec, _, compilation| {
            // Every change consumes a start command or a sign, so analysis
            // always reaches its fixed point.
            analyze::analyze(compilation.forest_mut(), &spec.analyzers, usize::MAX)?;
            Ok(())
        })
    }

    #[allow(clippy::result_large_err)]
    pub fn compile(&mut self, document: &Document) -> Result<(), Error> {
        self.run(document, |spec, _, compilation| {
            let instruction = compile::compile(spec.compiler.as_ref(), compilation)?;
            compilation.set_instruction(instruction);
            Ok(())
        })
    }

    #[allow(clippy::result_large_err)]
    pub fn optimize(&mut self, document: &Document) -> Result<(), Error> {
        self.run(document, |_, options, compilation| {
            let instruction = compilation
                .take_instruction()
                .ok_or_else(|| InnerError::Uncompiled(compilation.document().name().to_string()))?;
            compilation.set_instruction(instruction.optimize(options.optimization));
            Ok(())
        })
    }

    /// Runs the compiled instruction of `document` against a fresh memory
    /// printing to `console`, and returns that memory.
    #[allow(clippy::result_large_err)]
    pub fn execute(&mut self, document: &Document, console: Box<dyn Console>) -> Result<Memory, Error> {
        let environment = Environment::new(Arc::clone(&self.diagnostic));

        self.run(document, |spec, options, compilation| {
            let instruction = compilation
                .instruction()
                .ok_or_else(|| InnerError::Uncompiled(compilation.document().name().to_string()))?;

            let mut memory = Memory::new(console).with_max_iterations(options.max_iterations);
            for (name, value) in compilation.globals() {
                memory.alloc(name.clone(), value.clone());
            }

            let result = instruction.exec(&environment, &mut memory);
            for hook in &spec.hooks {
                hook.on_destroy_memory(compilation, &mut memory);
            }
            memory.close();

            result?;
            Ok(memory)
        })
    }

    /// Every phase, in order.
    #[allow(clippy::result_large_err)]
    pub fn process(&mut self, document: &Document, console: Box<dyn Console>) -> Result<Memory, Error> {
        self.initialize(document);
        self.parse(document)?;
        self.analyze(document)?;
        self.compile(document)?;
        self.optimize(document)?;
        self.execute(document, console)
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    #[allow(clippy::result_large_err)]
    fn run<T>(
        &mut self,
        document: &Document,
        phase: impl FnOnce(&Spec, &Options, &mut Compilation) -> Result<T, InnerError>,
    ) -> Result<T, Error> {
        let result = match self.compilations.get_mut(document.name()) {
            Some(compilation) => phase(&self.spec, &self.options, compilation),
            None => Err(InnerError::Uninitialized(document.name().to_string())),
        };

        result.map_err(|cause| self.fail(document, cause))
    }

    /// Reports `cause` to the diagnostic and turns it into an [`Error`].
    fn fail(&self, document: &Document, cause: InnerError) -> Error {
        let mut message = Message::new(MessageKind::Error, cause.to_string());
        if let Some(reference) = cause.reference() {
            message = message.with_reference(reference.clone());
        }
        self.diagnostic.print(message);

        Error::from_error(document.read(), cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostic::DiagnosticBuffer,
        flavor,
        runtime::{BufferConsole, ExecutionError},
    };
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[fixture]
    fn unit() -> Unit {
        Unit::new(Arc::new(flavor::spec().unwrap()))
    }

    #[test]
    fn test_options_default() {
        let options = Options::default();
        assert_eq!(options.optimization, Optimization::Basic);
        assert_eq!(options.max_iterations, None);
        assert_eq!(options.max_rounds, 10_000);
    }

    #[rstest]
    fn test_setters(mut unit: Unit) {
        unit.set_optimization(Optimization::None);
        unit.set_max_iterations(Some(5));
        unit.set_max_rounds(3);
        unit.set_project(Some(PathBuf::from("/project")));
        assert_eq!(unit.options().optimization, Optimization::None);
        assert_eq!(unit.options().max_iterations, Some(5));
        assert_eq!(unit.options().max_rounds, 3);
        assert_eq!(unit.options().project, Some(PathBuf::from("/project")));
    }

    #[rstest]
    fn test_phases_need_initialize(mut unit: Unit) {
        let document = Document::new("doc", "text");
        let error = unit.parse(&document).unwrap_err();
        assert!(matches!(error.cause, InnerError::Uninitialized(_)));
    }

    #[rstest]
    fn test_execute_needs_compile(mut unit: Unit) {
        let document = Document::new("doc", "text");
        unit.initialize(&document);
        unit.parse(&document).unwrap();
        let error = unit.execute(&document, Box::new(BufferConsole::new())).unwrap_err();
        assert!(matches!(error.cause, InnerError::Uncompiled(_)));
    }

    #[rstest]
    fn test_process(mut unit: Unit) {
        let document = Document::new("doc", "a #{1 + 2}# b");
        let console = BufferConsole::new();
        unit.process(&document, Box::new(console.clone())).unwrap();
        assert_eq!(console.read(), "a 3 b");
        assert!(unit.compilation(&document).and_then(Compilation::instruction).is_some());
    }

    #[rstest]
    fn test_defined_globals_override_builtins(mut unit: Unit) {
        unit.define_global("name", "first");
        unit.define_global("name", "world");
        unit.define_global("__FLAVOR__", "custom");
        let document = Document::new("doc", "hello #{name}# from #{__FLAVOR__}#");
        let console = BufferConsole::new();
        unit.process(&document, Box::new(console.clone())).unwrap();
        assert_eq!(console.read(), "hello world from custom");
    }

    #[rstest]
    fn test_failures_are_reported(unit: Unit) {
        let diagnostic = Arc::new(DiagnosticBuffer::new());
        let mut unit = unit.with_diagnostic(diagnostic.clone());
        let document = Document::new("doc", "x #{1 / 0}#");

        let error = unit.process(&document, Box::new(BufferConsole::new())).unwrap_err();
        assert!(matches!(
            error.cause,
            InnerError::Execution(ExecutionError::ZeroDivision(_))
        ));

        let messages = diagnostic.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Error);
        assert_eq!(messages[0].title, "Divided by 0");
        assert_eq!(messages[0].references[0].text(), "1 / 0");
    }

    /// Adds 1 per created compilation and 10 per destroyed memory.
    struct Counter(Arc<AtomicUsize>);

    impl Hook for Counter {
        fn on_create_compilation(&self, _: &Options, _: &mut Compilation) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn on_destroy_memory(&self, _: &Compilation, _: &mut Memory) {
            self.0.fetch_add(10, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_hooks_run_even_on_failure() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut spec = flavor::spec().unwrap();
        spec.hooks.push(Box::new(Counter(Arc::clone(&count))));
        let mut unit = Unit::new(Arc::new(spec)).with_diagnostic(Arc::new(DiagnosticBuffer::new()));

        let document = Document::new("doc", "#error \"stop\"\n");
        assert!(unit.process(&document, Box::new(BufferConsole::new())).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 11);
    }
}
