//! Module handles and the invocations they build.

use crate::{HandleFactory, InvocationError, Invoker, ModuleOutput, Validation};
use grassmod_interface::{ModuleInterface, parse_script};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Value of a module option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    /// Rendered comma-joined: `coordinates=640000,220500`.
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Everything needed to run one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Invocation {
    /// Fully qualified command name.
    pub name: String,
    pub options: BTreeMap<String, Value>,
    pub flags: BTreeSet<char>,
    pub overwrite: bool,
    pub quiet: bool,
    pub verbose: bool,
    /// Arguments appended verbatim after everything else.
    pub extra: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Arguments passed to the executable, without the command name.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .options
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if !self.flags.is_empty() {
            args.push(format!("-{}", self.flags.iter().collect::<String>()));
        }
        for (set, switch) in [(self.overwrite, "--o"), (self.quiet, "--q"), (self.verbose, "--v")] {
            if set {
                args.push(switch.to_string());
            }
        }
        args.extend(self.extra.iter().cloned());
        args
    }

    /// Command name followed by [`args`](Self::args).
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.name.clone()];
        argv.extend(self.args());
        argv
    }
}

/// Runnable handle bound to one fully qualified command.
///
/// Builder methods consume and return the handle, so parameters chain:
///
/// ```ignore
/// shortcuts.raster().resolve("slope_aspect")
///     .option("elevation", "elevation")
///     .option("slope", "slope")
///     .overwrite(true)
///     .run()?;
/// ```
#[derive(Clone)]
pub struct Module {
    invocation: Invocation,
    validation: Validation,
    invoker: Arc<dyn Invoker>,
}

impl Module {
    pub fn new(name: impl Into<String>, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            invocation: Invocation::new(name),
            validation: Validation::Unvalidated,
            invoker,
        }
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn name(&self) -> &str {
        &self.invocation.name
    }

    pub fn validation(&self) -> Validation {
        self.validation
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.invocation.options.insert(key.into(), value.into());
        self
    }

    pub fn flag(mut self, flag: char) -> Self {
        self.invocation.flags.insert(flag);
        self
    }

    /// Add every character of `flags`, e.g. `"ab"`. A leading `-` is ignored.
    pub fn flags(mut self, flags: &str) -> Self {
        self.invocation
            .flags
            .extend(flags.trim_start_matches('-').chars());
        self
    }

    pub fn overwrite(mut self, on: bool) -> Self {
        self.invocation.overwrite = on;
        self
    }

    pub fn quiet(mut self, on: bool) -> Self {
        self.invocation.quiet = on;
        self
    }

    pub fn verbose(mut self, on: bool) -> Self {
        self.invocation.verbose = on;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.invocation.extra.push(arg.into());
        self
    }

    pub fn stdin(mut self, text: impl Into<String>) -> Self {
        self.invocation.stdin = Some(text.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.invocation.env.insert(key.into(), value.into());
        self
    }

    pub fn argv(&self) -> Vec<String> {
        self.invocation.argv()
    }

    pub fn run(&self) -> Result<ModuleOutput, InvocationError> {
        self.invoker.invoke(&self.invocation)
    }

    /// Run with extra options merged over the ones already set. The handle
    /// itself is left unchanged.
    pub fn call<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Result<ModuleOutput, InvocationError>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut invocation = self.invocation.clone();
        invocation
            .options
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self.invoker.invoke(&invocation)
    }

    /// Ask the module for its interface (`--script`) and parse it.
    pub fn describe(&self) -> Result<ModuleInterface, InvocationError> {
        let invocation = Invocation {
            extra: vec!["--script".to_string()],
            ..Invocation::new(self.name())
        };
        let output = self.invoker.invoke(&invocation)?;
        parse_script(&output.stdout).map_err(|source| InvocationError::Interface {
            command: self.name().to_string(),
            source,
        })
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("invocation", &self.invocation)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

/// Produces [`Module`] handles that share one invoker.
#[derive(Clone)]
pub struct ModuleFactory {
    invoker: Arc<dyn Invoker>,
}

impl ModuleFactory {
    pub fn new(invoker: Arc<dyn Invoker>) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &Arc<dyn Invoker> {
        &self.invoker
    }
}

impl HandleFactory for ModuleFactory {
    type Handle = Module;

    fn create(&self, name: String, validation: Validation) -> Module {
        Module::new(name, self.invoker.clone()).with_validation(validation)
    }
}
