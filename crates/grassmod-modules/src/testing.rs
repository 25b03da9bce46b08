//! Test doubles.

use crate::{Invocation, InvocationError, Invoker, ModuleOutput};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Records every invocation and answers with canned stdout per command.
#[derive(Default)]
pub struct ScriptedInvoker {
    responses: HashMap<String, String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses.insert(command.to_string(), stdout.to_string());
        self
    }

    /// argv of every call, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.invocations().iter().map(Invocation::argv).collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<ModuleOutput, InvocationError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(ModuleOutput {
            command: invocation.name.clone(),
            code: 0,
            stdout: self.responses.get(&invocation.name).cloned().unwrap_or_default(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
        })
    }
}
