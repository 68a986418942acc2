//! Globals every jamplate document starts with.
use std::path::Path;

use crate::{
    compilation::Compilation,
    runtime::{Memory, Value},
    unit::{Hook, Options},
};

pub const LINE: &str = "__LINE__";
pub const FILE: &str = "__FILE__";
pub const PATH: &str = "__PATH__";
pub const DIR: &str = "__DIR__";
/// A JSON object of every `#define`d name and its replacement.
pub const DEFINE: &str = "__DEFINE__";
pub const RANDOM: &str = "__RANDOM__";
pub const DATE: &str = "__DATE__";
pub const TIME: &str = "__TIME__";
/// The name of the buffer `#console` redirected to, `Null` before that.
pub const OUTPUT: &str = "__OUTPUT__";
pub const PROJECT: &str = "__PROJECT__";
pub const FLAVOR: &str = "__FLAVOR__";
pub const JAMPLATE: &str = "__JAMPLATE__";
pub const GLUCOSE: &str = "__GLUCOSE__";

fn random(_: &Memory) -> String {
    rand::random::<u32>().to_string()
}

fn date(_: &Memory) -> String {
    chrono::Local::now().format("%b %d %Y").to_string()
}

fn time(_: &Memory) -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Builtins;

impl Hook for Builtins {
    fn on_create_compilation(&self, options: &Options, compilation: &mut Compilation) {
        let document = compilation.document().clone();
        let path = document.path();
        let file = path
            .and_then(Path::file_name)
            .map_or_else(|| document.name().to_string(), |name| name.to_string_lossy().into_owned());
        let full_path = path.map_or_else(|| document.name().to_string(), |path| path.display().to_string());
        let dir = path
            .and_then(Path::parent)
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        let project = options
            .project
            .as_ref()
            .map_or(Value::Null, |project| Value::new(project.display().to_string()));

        let globals = [
            (LINE, Value::new("1")),
            (FILE, Value::new(file)),
            (PATH, Value::new(full_path)),
            (DIR, Value::new(dir)),
            (DEFINE, Value::new("{}")),
            (RANDOM, Value::lazy(random)),
            (DATE, Value::lazy(date)),
            (TIME, Value::lazy(time)),
            (OUTPUT, Value::Null),
            (PROJECT, project),
            (FLAVOR, Value::new(super::NAME)),
            (JAMPLATE, Value::new(env!("CARGO_PKG_VERSION"))),
            (GLUCOSE, Value::new(env!("CARGO_PKG_VERSION"))),
        ];

        for (name, value) in globals {
            compilation.set_global(name, value);
        }
    }

    fn on_destroy_memory(&self, compilation: &Compilation, memory: &mut Memory) {
        if !memory.stack().is_empty() {
            tracing::debug!(
                document = %compilation.document(),
                depth = memory.stack().len(),
                "execution left values on the operand stack"
            );
        }
    }
}
