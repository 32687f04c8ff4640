// src/core/maker.rs

//! "Maker"-style invocation facades: one command template per logical tool
//! (a build tool, a formatter, ...) behind a narrow run-these-targets entry
//! point. Instances come from a resolver lookup of the tool name, or from a
//! declared command specification in a [`ToolsConfig`].

use crate::{
    core::{resolver::Resolver, template::CommandTemplate},
    models::ToolsConfig,
    system::process::{ProcessRunner, SystemProcess},
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Capability object for an external tool invoked against a working
/// directory and a list of targets.
pub trait Maker {
    /// Runs the tool in `cwd`, appending each target as a positional
    /// argument. A nonzero exit is an error.
    fn exec(&self, cwd: &Path, targets: &[String]) -> crate::Result<()>;
}

/// A [`Maker`] backed by a command template. Every `exec` binds a private
/// copy of the template, so one maker serves any number of invocations.
pub struct CommandMaker {
    template: CommandTemplate,
    runner: Box<dyn ProcessRunner>,
}

impl CommandMaker {
    pub fn new(template: CommandTemplate) -> Self {
        Self::with_runner(template, Box::new(SystemProcess))
    }

    /// Maker with a caller-supplied process boundary.
    pub fn with_runner(template: CommandTemplate, runner: Box<dyn ProcessRunner>) -> Self {
        Self { template, runner }
    }

    /// Named-instance lookup: resolve `name` to an executable and wrap it.
    pub fn instance(name: &str, resolver: &Resolver) -> crate::Result<Self> {
        let exe = resolver.find_executable(Path::new(name))?;
        log::debug!("Tool '{name}' resolved to '{}'", exe.display());
        Ok(Self::new(CommandTemplate::from_path(&exe)))
    }

    /// The underlying template, for callers that need richer binding than
    /// [`Maker::exec`] offers.
    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }
}

impl Maker for CommandMaker {
    fn exec(&self, cwd: &Path, targets: &[String]) -> crate::Result<()> {
        let mut bound = self.template.clone();
        bound.current_path(cwd);
        bound.add_arguments(targets.iter().cloned());
        bound.run_on(self.runner.as_ref())
    }
}

impl fmt::Debug for CommandMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMaker")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// A configured registry of tools. Declared specifications win; anything
/// else falls back to a resolver lookup of the bare name.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: HashMap<String, CommandTemplate>,
    resolver: Resolver,
}

impl ToolSet {
    /// Compiles every declared tool specification up front, so malformed
    /// configuration surfaces at load time rather than on first use.
    pub fn from_config(config: &ToolsConfig) -> crate::Result<Self> {
        let resolver = Resolver::from_config(&config.resolver)?;
        let mut tools = HashMap::with_capacity(config.tools.len());
        for (name, spec) in &config.tools {
            let template = CommandTemplate::from_spec(spec)
                .inspect_err(|e| log::debug!("Tool '{name}' failed to compile: {e}"))?;
            tools.insert(name.clone(), template);
        }
        Ok(Self { tools, resolver })
    }

    /// Named-instance lookup across the declared tools and the resolver.
    pub fn instance(&self, name: &str) -> crate::Result<CommandMaker> {
        match self.tools.get(name) {
            Some(template) => Ok(CommandMaker::new(template.clone())),
            None => CommandMaker::instance(name, &self.resolver),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolsConfig;
    use crate::system::process::{ExecutionContext, ProcessError};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct RecordingRunner {
        contexts: Arc<Mutex<Vec<ExecutionContext>>>,
        exit_code: i32,
    }

    impl ProcessRunner for RecordingRunner {
        fn sync_execute(&self, context: &ExecutionContext) -> Result<i32, ProcessError> {
            self.contexts.lock().unwrap().push(context.clone());
            Ok(self.exit_code)
        }
    }

    fn make_resolver() -> Resolver {
        // Map "make" onto itself so lookups stay deterministic regardless
        // of what the host has installed.
        let config = crate::models::ResolverConfig {
            absolute: [("make".to_string(), "make".to_string())].into_iter().collect(),
            ..Default::default()
        };
        Resolver::from_config(&config).unwrap()
    }

    #[test]
    fn exec_binds_cwd_and_targets() {
        let runner = RecordingRunner::default();
        let exe = make_resolver().find_executable(Path::new("make")).unwrap();
        let maker =
            CommandMaker::with_runner(CommandTemplate::from_path(&exe), Box::new(runner.clone()));

        maker
            .exec(Path::new("cwd"), &["target1".to_string(), "target2".to_string()])
            .unwrap();

        let contexts = runner.contexts.lock().unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].arguments, ["make", "target1", "target2"]);
        assert_eq!(contexts[0].current_path.as_deref(), Some(Path::new("cwd")));
    }

    #[test]
    fn exec_does_not_accumulate_state_across_calls() {
        let runner = RecordingRunner::default();
        let maker =
            CommandMaker::with_runner(CommandTemplate::new("make"), Box::new(runner.clone()));

        maker.exec(Path::new("a"), &["one".to_string()]).unwrap();
        maker.exec(Path::new("b"), &["two".to_string()]).unwrap();

        let contexts = runner.contexts.lock().unwrap();
        assert_eq!(contexts[0].arguments, ["make", "one"]);
        assert_eq!(contexts[1].arguments, ["make", "two"]);
        assert_eq!(contexts[1].current_path.as_deref(), Some(Path::new("b")));
    }

    #[test]
    fn exec_surfaces_nonzero_exit() {
        let runner = RecordingRunner {
            exit_code: 2,
            ..RecordingRunner::default()
        };
        let maker = CommandMaker::with_runner(CommandTemplate::new("make"), Box::new(runner));
        match maker.exec(Path::new("cwd"), &[]) {
            Err(crate::Error::Process(ProcessError::NonZeroExit { code, .. })) => {
                assert_eq!(code, 2);
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn toolset_prefers_declared_specs() {
        let config = ToolsConfig::from_toml_str(
            r#"
            [tools]
            build = [{ t = "ninja" }, { t = "-C" }, { p = 0 }]
            "#,
        )
        .unwrap();
        let tools = ToolSet::from_config(&config).unwrap();
        let maker = tools.instance("build").unwrap();

        let mut bound = maker.template().clone();
        bound.add_argument("out");
        assert_eq!(bound.context().unwrap().arguments, ["ninja", "-C", "out"]);
    }

    #[test]
    #[cfg(unix)]
    fn toolset_falls_back_to_the_resolver() {
        let tools = ToolSet::from_config(&ToolsConfig::default()).unwrap();
        let maker = tools.instance("sh").unwrap();
        let argv0 = maker.template().context().unwrap().arguments[0].clone();
        assert!(argv0.ends_with("sh"), "unexpected argv0 {argv0:?}");
    }

    #[test]
    fn toolset_reports_unknown_tools() {
        let tools = ToolSet::from_config(&ToolsConfig::default()).unwrap();
        assert!(matches!(
            tools.instance("definitely-not-a-real-tool-xyz"),
            Err(crate::Error::Resolve(_))
        ));
    }
}
