use clap::Parser;
use colored::Colorize;
use jamplate::{
    BufferConsole, Compilation, Console, Diagnostic, Document, Message, MessageKind, Optimization, Spec, TracingDiagnostic,
    Unit, dump_instruction,
};
use miette::IntoDiagnostic;
use miette::miette;
use rayon::prelude::*;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

/// The extension stripped from a template to name its output.
const EXTENSION: &str = "jamplate";
const STDIN: &str = "<stdin>";

#[derive(Parser, Debug, Default)]
#[command(name = "jamplate")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To render a template to standard output:\n\
    jamplate --stdout page.html.jamplate\n\n\
    ## To render templates into a directory:\n\
    jamplate -o build/ *.jamplate\n\n\
    ## To define a global:\n\
    jamplate -D name=world greeting.txt.jamplate\n\n\
    ## To read a template from standard input:\n\
    echo '#{1 + 2}#' | jamplate")]
#[command(
    about = "jamplate is a text preprocessor with declarations, conditions, loops and expressions.",
    long_about = None
)]
pub struct Cli {
    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,

    /// Raise the log level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of files to process before switching to parallel processing
    #[arg(short = 'P', default_value_t = 10)]
    parallel_threshold: usize,

    /// Template files. Standard input is read when none are given.
    files: Vec<PathBuf>,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct InputArgs {
    /// Define a global visible to every document
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_definition)]
    definitions: Vec<(String, String)>,

    /// Set the value of `__PROJECT__`
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Fail a document after this many loop iterations
    #[arg(long, value_name = "COUNT")]
    max_iterations: Option<u64>,

    /// Run instructions exactly as compiled
    #[arg(long, default_value_t = false)]
    no_optimize: bool,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct OutputArgs {
    /// Write outputs into the directory instead of next to each template
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print the main output of every template to standard output
    #[arg(long, default_value_t = false)]
    stdout: bool,

    /// Print the instruction tree of every template instead of running it
    #[arg(long, default_value_t = false)]
    dump: bool,
}

fn parse_definition(definition: &str) -> Result<(String, String), String> {
    match definition.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, found `{definition}`")),
    }
}

/// What running one template produced.
#[derive(Debug, Default)]
struct Rendered {
    main: String,
    /// Buffers the template redirected to with `#console`.
    outputs: Vec<(String, String)>,
}

/// Prints notes and warnings to standard error. Errors are rendered once
/// their document failed, so they are not printed here.
#[derive(Debug, Default, Clone, Copy)]
struct StderrDiagnostic;

impl Diagnostic for StderrDiagnostic {
    fn print(&self, message: Message) {
        let location = message
            .references
            .first()
            .map(|reference| format!(" ({}:{})", reference.document(), reference.line()))
            .unwrap_or_default();

        match message.kind {
            MessageKind::Note => eprintln!("{} {}{}", "note:".cyan().bold(), message.title, location.dimmed()),
            MessageKind::Warning => {
                eprintln!("{} {}{}", "warning:".yellow().bold(), message.title, location.dimmed())
            }
            MessageKind::Error => {}
            MessageKind::Debug | MessageKind::Progress => TracingDiagnostic.print(message),
        }
    }
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        self.init_tracing();

        let spec = Arc::new(jamplate::flavor::spec().into_diagnostic()?);
        let documents = self.read_documents()?;
        tracing::debug!(documents = documents.len(), "processing");

        let results: Vec<_> = if documents.len() > self.parallel_threshold {
            documents
                .par_iter()
                .map(|document| self.process(&spec, document))
                .collect()
        } else {
            documents
                .iter()
                .map(|document| self.process(&spec, document))
                .collect()
        };

        let mut errors = Vec::new();
        for (document, result) in documents.iter().zip(results) {
            match result {
                Ok(rendered) => self.write(document, rendered)?,
                Err(error) => errors.push(error),
            }
        }

        match (documents.len(), errors.len()) {
            (_, 0) => Ok(()),
            (1, _) => Err(errors.remove(0).into()),
            (total, failed) => {
                for error in errors {
                    eprintln!("{:?}", miette::Report::new(error));
                }
                Err(miette!("{failed} of {total} templates failed"))
            }
        }
    }

    fn init_tracing(&self) {
        let filter = match self.verbose {
            0 => EnvFilter::try_from_env("JAMPLATE_LOG").unwrap_or_else(|_| EnvFilter::new("jamplate=warn")),
            1 => EnvFilter::new("jamplate=debug"),
            _ => EnvFilter::new("jamplate=trace"),
        };

        // A subscriber may already be installed when running more than once.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }

    fn read_documents(&self) -> miette::Result<Vec<Document>> {
        if self.files.is_empty() {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content).into_diagnostic()?;
            return Ok(vec![Document::new(STDIN, content)]);
        }

        self.files
            .iter()
            .map(|file| {
                if !file.exists() {
                    return Err(miette!("File not found: {}", file.display()));
                }
                Document::from_path(file).into_diagnostic()
            })
            .collect()
    }

    fn create_unit(&self, spec: &Arc<Spec>) -> Unit {
        let mut unit = Unit::new(Arc::clone(spec)).with_diagnostic(Arc::new(StderrDiagnostic));

        if self.input.no_optimize {
            unit.set_optimization(Optimization::None);
        }
        unit.set_max_iterations(self.input.max_iterations);
        unit.set_project(self.input.project.clone());
        for (name, value) in &self.input.definitions {
            unit.define_global(name, value);
        }

        unit
    }

    #[allow(clippy::result_large_err)]
    fn process(&self, spec: &Arc<Spec>, document: &Document) -> Result<Rendered, jamplate::Error> {
        let mut unit = self.create_unit(spec);

        if self.output.dump {
            unit.initialize(document);
            unit.parse(document)?;
            unit.analyze(document)?;
            unit.compile(document)?;
            unit.optimize(document)?;

            let main = unit
                .compilation(document)
                .and_then(Compilation::instruction)
                .map(dump_instruction)
                .unwrap_or_default();
            return Ok(Rendered {
                main,
                outputs: Vec::new(),
            });
        }

        let console = BufferConsole::new();
        let memory = unit.process(document, Box::new(console.clone()))?;
        let outputs = memory
            .outputs()
            .map(|(name, text)| (name.to_string(), text))
            .collect();

        Ok(Rendered {
            main: console.read(),
            outputs,
        })
    }

    fn write(&self, document: &Document, rendered: Rendered) -> miette::Result<()> {
        let directory = self
            .output
            .output_dir
            .clone()
            .or_else(|| document.path().and_then(Path::parent).map(Path::to_path_buf))
            .unwrap_or_default();

        match document.path() {
            Some(path) if !self.output.stdout && !self.output.dump => {
                write_file(&directory.join(output_name(path)), &rendered.main)?
            }
            _ => print(&rendered.main)?,
        }

        for (name, text) in rendered.outputs {
            write_file(&directory.join(name), &text)?;
        }

        Ok(())
    }
}

/// `page.html.jamplate` renders into `page.html`, any other file gets `.out` appended.
fn output_name(path: &Path) -> PathBuf {
    match (path.extension(), path.file_stem()) {
        (Some(extension), Some(stem)) if extension == EXTENSION => PathBuf::from(stem),
        _ => {
            let mut name = path.file_name().unwrap_or_default().to_os_string();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

fn write_file(path: &Path, text: &str) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    tracing::debug!(path = %path.display(), bytes = text.len(), "writing output");
    fs::write(path, text).into_diagnostic()
}

fn print(text: &str) -> miette::Result<()> {
    let stdout = io::stdout();
    let mut handle = BufWriter::new(stdout.lock());
    handle.write_all(text.as_bytes()).into_diagnostic()?;
    handle.flush().into_diagnostic()
}
