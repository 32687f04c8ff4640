// src/core/template.rs

//! # Command template engine
//!
//! Parses a declarative command specification into a sequence of typed
//! tokens, accepts incremental argument binding (positional values filled
//! left-to-right, named values set by key), and resolves the whole template
//! into an [`ExecutionContext`] on demand. Resolution is a pure read of the
//! current bindings, so one template can be resolved repeatedly with
//! different bindings in between.

use crate::{
    constants::{CURRENT_PATH_KEY, EXECUTABLE_KEY, USE_PATH_KEY},
    models::{CommandSpec, SpecValue},
    system::process::{ExecutionContext, ProcessRunner, SystemProcess},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while parsing a command specification or resolving a
/// template against its bindings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder type '{0}' in command specification.")]
    UnknownPlaceholderType(String),
    #[error("Specification entry must hold exactly one `key = value` pair, found {0}.")]
    MalformedEntry(usize),
    #[error("Placeholder '{key}' expects {expected}.")]
    InvalidValue { key: String, expected: &'static str },
    #[error("Command line '{0}' could not be split into arguments.")]
    CommandParse(String),
    #[error("Positional slot {0} was never bound.")]
    UnboundPositional(usize),
    #[error("Named slot '{0}' was never bound.")]
    UnboundNamed(String),
}

/// A placeholder identity: one binding slot of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Zero-based index into the positional slot table.
    Positional(usize),
    /// Key into the named slot table.
    Named(String),
}

/// One element of an argument template. Tokens within a single argument
/// concatenate left-to-right, so an argument may mix literal text with any
/// number of placeholders (e.g. `"--out=" + positional 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Placeholder(Reference),
}

/// A to-be-resolved command line.
///
/// Holds an ordered sequence of argument templates (argument 0 is the
/// program name) together with the positional and named binding tables the
/// placeholders resolve against. Templates have value semantics: cloning is
/// cheap enough that the one-shot entry points ([`Self::sync_with`],
/// [`Self::run_with`]) operate on a private copy and leave the receiver
/// untouched, so a single parsed template can back many invocations.
#[derive(Debug, Clone, Default)]
pub struct CommandTemplate {
    arguments: Vec<Vec<Token>>,
    positional: Vec<Option<String>>,
    next_positional: usize,
    named: HashMap<String, String>,
}

impl CommandTemplate {
    /// Template invoking `program` with no further arguments. The string is
    /// taken verbatim as argument 0; it is not split on whitespace.
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        log::trace!("Creating command template from \"{program}\"");
        Self {
            arguments: vec![vec![Token::Literal(program)]],
            ..Self::default()
        }
    }

    /// Template invoking the program at `path` with no further arguments.
    pub fn from_path(program: &Path) -> Self {
        Self::new(program.to_string_lossy().into_owned())
    }

    /// Splits a full command line into one literal argument per word.
    /// Empty or unparsable lines are an error.
    pub fn from_command_line(line: &str) -> Result<Self, TemplateError> {
        let words =
            shlex::split(line).ok_or_else(|| TemplateError::CommandParse(line.to_string()))?;
        if words.is_empty() {
            return Err(TemplateError::CommandParse(line.to_string()));
        }
        Ok(Self {
            arguments: words
                .into_iter()
                .map(|word| vec![Token::Literal(word)])
                .collect(),
            ..Self::default()
        })
    }

    /// Compiles a declarative specification into a template.
    ///
    /// Each entry becomes one argument template, except `definition`
    /// entries, whose pairs are merged into the named slot table as
    /// pre-bound defaults. Referencing positional index `i` grows the slot
    /// table to `i + 1` entries; the table never shrinks.
    pub fn from_spec(spec: &CommandSpec) -> Result<Self, TemplateError> {
        log::trace!("Creating command template from a declarative specification");
        let mut template = Self::default();
        for entry in &spec.0 {
            let (key, value) = entry
                .single()
                .ok_or(TemplateError::MalformedEntry(entry.0.len()))?;
            match key {
                "c" | "complex" => {
                    let children = match value {
                        SpecValue::Children(children) => children,
                        _ => {
                            return Err(TemplateError::InvalidValue {
                                key: key.to_string(),
                                expected: "a list of child entries",
                            });
                        }
                    };
                    let mut argument = Vec::with_capacity(children.len());
                    for child in children {
                        let (child_key, child_value) = child
                            .single()
                            .ok_or(TemplateError::MalformedEntry(child.0.len()))?;
                        argument.push(template.process(child_key, child_value)?);
                    }
                    template.arguments.push(argument);
                }
                "d" | "definition" => {
                    let pairs = match value {
                        SpecValue::Pairs(pairs) => pairs,
                        _ => {
                            return Err(TemplateError::InvalidValue {
                                key: key.to_string(),
                                expected: "a table of string pairs",
                            });
                        }
                    };
                    for (name, default) in pairs {
                        log::trace!("definition \"{name}\" = \"{default}\"");
                        template.named.insert(name.clone(), default.clone());
                    }
                }
                _ => {
                    let token = template.process(key, value)?;
                    template.arguments.push(vec![token]);
                }
            }
        }
        Ok(template)
    }

    /// Translates one scalar specification entry into a token, growing the
    /// positional slot table as needed. Only `text`, `positional` and
    /// `named` are valid here; anything else is an unknown placeholder
    /// type, including `complex`/`definition` nested inside a `complex`.
    fn process(&mut self, key: &str, value: &SpecValue) -> Result<Token, TemplateError> {
        match key {
            "t" | "text" => {
                let text = value.as_text().ok_or(TemplateError::InvalidValue {
                    key: key.to_string(),
                    expected: "literal text",
                })?;
                log::trace!("text token \"{text}\"");
                Ok(Token::Literal(text))
            }
            "p" | "positional" => {
                let index = value.as_index().ok_or(TemplateError::InvalidValue {
                    key: key.to_string(),
                    expected: "an unsigned slot index",
                })?;
                log::trace!("positional placeholder {index}");
                if self.positional.len() <= index {
                    self.positional.resize(index + 1, None);
                }
                Ok(Token::Placeholder(Reference::Positional(index)))
            }
            "n" | "named" => {
                let name = value.as_text().ok_or(TemplateError::InvalidValue {
                    key: key.to_string(),
                    expected: "a slot key",
                })?;
                log::trace!("named placeholder \"{name}\"");
                Ok(Token::Placeholder(Reference::Named(name)))
            }
            other => Err(TemplateError::UnknownPlaceholderType(other.to_string())),
        }
    }

    // --- BINDING OPERATIONS ---

    /// Binds `value` to the lowest still-unbound positional slot. Once every
    /// slot is filled, further values are appended as new trailing literal
    /// arguments. Binding always proceeds left-to-right; out-of-order
    /// rebinding of a specific slot is not supported.
    pub fn add_argument(&mut self, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        log::trace!("Adding argument \"{value}\"");
        let cursor = self.next_positional;
        if let Some(slot) = self.positional.get_mut(cursor) {
            *slot = Some(value);
            self.next_positional += 1;
        } else {
            self.arguments.push(vec![Token::Literal(value)]);
        }
        self
    }

    /// [`Self::add_argument`] over a sequence of values, bound in order.
    pub fn add_arguments<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for value in values {
            self.add_argument(value);
        }
        self
    }

    /// Upserts the named slot `key`. Last write wins.
    pub fn set_argument(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let (key, value) = (key.into(), value.into());
        log::trace!("Setting named argument \"{key}\" to \"{value}\"");
        self.named.insert(key, value);
        self
    }

    /// Sets the working directory for the spawned process (the reserved
    /// `current_path` named slot).
    pub fn current_path(&mut self, cwd: impl AsRef<Path>) -> &mut Self {
        self.set_argument(CURRENT_PATH_KEY, cwd.as_ref().to_string_lossy())
    }

    /// Sets the executable to spawn (the reserved `executable` named slot).
    /// Without it, argument 0 is used.
    pub fn executable(&mut self, exe: impl AsRef<Path>) -> &mut Self {
        self.set_argument(EXECUTABLE_KEY, exe.as_ref().to_string_lossy())
    }

    // --- RESOLUTION ---

    fn resolve_token<'a>(&'a self, token: &'a Token) -> Result<&'a str, TemplateError> {
        match token {
            Token::Literal(text) => Ok(text),
            Token::Placeholder(Reference::Positional(index)) => self
                .positional
                .get(*index)
                .and_then(|slot| slot.as_deref())
                .ok_or(TemplateError::UnboundPositional(*index)),
            Token::Placeholder(Reference::Named(key)) => self
                .named
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| TemplateError::UnboundNamed(key.clone())),
        }
    }

    /// Resolves the template against its current bindings.
    ///
    /// Fails on the first placeholder whose slot was never bound; no
    /// default is ever substituted. The reserved named slots become the
    /// context's metadata fields and are not part of the argument vector
    /// unless an explicit named placeholder targets them. For `use_path`,
    /// exactly the literals `"true"`, `"yes"` and `"1"` count as true.
    pub fn context(&self) -> Result<ExecutionContext, TemplateError> {
        log::trace!("Resolving command template into an execution context");
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            let mut resolved = String::new();
            for token in argument {
                resolved.push_str(self.resolve_token(token)?);
            }
            arguments.push(resolved);
        }

        let mut context = ExecutionContext::new(arguments);
        if let Some(exe) = self.named.get(EXECUTABLE_KEY) {
            context.executable = Some(PathBuf::from(exe));
        }
        if let Some(cwd) = self.named.get(CURRENT_PATH_KEY) {
            context.current_path = Some(PathBuf::from(cwd));
        }
        if let Some(flag) = self.named.get(USE_PATH_KEY) {
            context.use_path = flag == "true" || flag == "yes" || flag == "1";
        }
        Ok(context)
    }

    // --- EXECUTION ---

    /// Resolves and runs the command, returning the raw exit code.
    pub fn sync(&self) -> crate::Result<i32> {
        self.sync_on(&SystemProcess)
    }

    /// [`Self::sync`] against a caller-supplied process boundary.
    pub fn sync_on(&self, runner: &dyn ProcessRunner) -> crate::Result<i32> {
        let context = self.context()?;
        Ok(runner.sync_execute(&context)?)
    }

    /// Resolves and runs the command, treating a nonzero exit code as an
    /// error carrying that code.
    pub fn run(&self) -> crate::Result<()> {
        self.run_on(&SystemProcess)
    }

    /// [`Self::run`] against a caller-supplied process boundary.
    pub fn run_on(&self, runner: &dyn ProcessRunner) -> crate::Result<()> {
        let context = self.context()?;
        Ok(runner.check_sync_execute(&context)?)
    }

    /// One-shot: binds `values` positionally on a private copy and runs it,
    /// returning the exit code. The receiver is left unmodified.
    pub fn sync_with<I>(&self, values: I) -> crate::Result<i32>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.sync_with_on(values, &SystemProcess)
    }

    /// [`Self::sync_with`] against a caller-supplied process boundary.
    pub fn sync_with_on<I>(&self, values: I, runner: &dyn ProcessRunner) -> crate::Result<i32>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut bound = self.clone();
        bound.add_arguments(values);
        bound.sync_on(runner)
    }

    /// One-shot checking variant of [`Self::sync_with`].
    pub fn run_with<I>(&self, values: I) -> crate::Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.run_with_on(values, &SystemProcess)
    }

    /// [`Self::run_with`] against a caller-supplied process boundary.
    pub fn run_with_on<I>(&self, values: I, runner: &dyn ProcessRunner) -> crate::Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut bound = self.clone();
        bound.add_arguments(values);
        bound.run_on(runner)
    }
}

// MARK: --- UNIT TESTS ---
