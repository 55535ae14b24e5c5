use anyhow::{Result, bail};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::builders::html_patch::patch_output_dir;
use crate::builders::reporter::TransformReport;
use crate::core::config::MarkerShuffleConfig;
use crate::core::engine::transform_directory;
use crate::core::sink::LogSink;

/// The extension points a host build tool calls into, in the order they
/// normally fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    ConfigSetup,
    RouteSetup,
    RoutesResolved,
    ConfigDone,
    ServerSetup,
    ServerStart,
    ServerDone,
    BuildStart,
    BuildSetup,
    BuildSsr,
    BuildGenerated,
    BuildDone,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 12] = [
        LifecycleHook::ConfigSetup,
        LifecycleHook::RouteSetup,
        LifecycleHook::RoutesResolved,
        LifecycleHook::ConfigDone,
        LifecycleHook::ServerSetup,
        LifecycleHook::ServerStart,
        LifecycleHook::ServerDone,
        LifecycleHook::BuildStart,
        LifecycleHook::BuildSetup,
        LifecycleHook::BuildSsr,
        LifecycleHook::BuildGenerated,
        LifecycleHook::BuildDone,
    ];

    /// The hooks a static build fires, in order.
    pub const BUILD: [LifecycleHook; 6] = [
        LifecycleHook::ConfigSetup,
        LifecycleHook::ConfigDone,
        LifecycleHook::BuildStart,
        LifecycleHook::BuildSetup,
        LifecycleHook::BuildGenerated,
        LifecycleHook::BuildDone,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleHook::ConfigSetup => "config:setup",
            LifecycleHook::RouteSetup => "route:setup",
            LifecycleHook::RoutesResolved => "routes:resolved",
            LifecycleHook::ConfigDone => "config:done",
            LifecycleHook::ServerSetup => "server:setup",
            LifecycleHook::ServerStart => "server:start",
            LifecycleHook::ServerDone => "server:done",
            LifecycleHook::BuildStart => "build:start",
            LifecycleHook::BuildSetup => "build:setup",
            LifecycleHook::BuildSsr => "build:ssr",
            LifecycleHook::BuildGenerated => "build:generated",
            LifecycleHook::BuildDone => "build:done",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LifecycleHook {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match LifecycleHook::ALL.iter().find(|h| h.name() == s) {
            Some(hook) => Ok(*hook),
            None => bail!("Unknown lifecycle hook: {s}"),
        }
    }
}

/// What the host knows at the moment it fires a hook.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub project_root: PathBuf,
    /// Where rendered pages are written, once known.
    pub output_dir: Option<PathBuf>,
    /// Free-form facts worth logging, e.g. the command or a route count.
    pub details: Vec<(String, String)>,
}

impl HookContext {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            ..Self::default()
        }
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }
}

pub trait Integration {
    fn name(&self) -> &str;

    /// Called for every hook. Integrations ignore the hooks they do not
    /// care about.
    fn on_hook(&mut self, hook: LifecycleHook, ctx: &HookContext, sink: &dyn LogSink) -> Result<()>;
}

/// Logs every hook invocation together with its context.
pub struct HookLogger;

impl Integration for HookLogger {
    fn name(&self) -> &str {
        "hook-logger"
    }

    fn on_hook(&mut self, hook: LifecycleHook, ctx: &HookContext, sink: &dyn LogSink) -> Result<()> {
        sink.info(&format!("{hook} hook called"));
        for (key, value) in &ctx.details {
            sink.info(&format!("- {key}: {value}"));
        }
        if let Some(output_dir) = &ctx.output_dir {
            sink.debug(&format!("- Output directory: {}", output_dir.display()));
        }
        Ok(())
    }
}

/// Shuffles marked components before the build renders them, and patches
/// the rendered pages once the build is done.
pub struct MarkerShuffleIntegration {
    config: MarkerShuffleConfig,
    last_transform: Option<TransformReport>,
}

impl MarkerShuffleIntegration {
    pub fn new(config: MarkerShuffleConfig) -> Self {
        Self {
            config,
            last_transform: None,
        }
    }

    pub fn last_transform(&self) -> Option<&TransformReport> {
        self.last_transform.as_ref()
    }
}

impl Integration for MarkerShuffleIntegration {
    fn name(&self) -> &str {
        "marker-shuffle"
    }

    fn on_hook(&mut self, hook: LifecycleHook, ctx: &HookContext, sink: &dyn LogSink) -> Result<()> {
        match hook {
            LifecycleHook::BuildSetup => {
                let report = transform_directory(&self.config.transform, &ctx.project_root, sink);
                self.last_transform = Some(report);
            }
            LifecycleHook::BuildDone => {
                let Some(output_dir) = &ctx.output_dir else {
                    sink.debug("No output directory known, skipping HTML patches");
                    return Ok(());
                };
                let report = patch_output_dir(output_dir, &self.config.html_patches, sink);
                sink.info(&format!("Patched {} rendered pages", report.files.len()));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Dispatches hooks to registered integrations, in registration order.
///
/// An integration's error is logged and never reaches the caller, so one
/// misbehaving integration cannot fail a build.
pub struct IntegrationHost<'a> {
    integrations: Vec<Box<dyn Integration + 'a>>,
    sink: &'a dyn LogSink,
}

impl<'a> IntegrationHost<'a> {
    pub fn new(sink: &'a dyn LogSink) -> Self {
        Self {
            integrations: Vec::new(),
            sink,
        }
    }

    pub fn register(&mut self, integration: Box<dyn Integration + 'a>) {
        self.integrations.push(integration);
    }

    /// Registers what the configuration asks for: the hook logger (when
    /// enabled) followed by the shuffle integration.
    pub fn from_config(config: &MarkerShuffleConfig, sink: &'a dyn LogSink) -> Self {
        let mut host = Self::new(sink);
        if config.global_settings.log_hooks {
            host.register(Box::new(HookLogger));
        }
        host.register(Box::new(MarkerShuffleIntegration::new(config.clone())));
        host
    }

    pub fn dispatch(&mut self, hook: LifecycleHook, ctx: &HookContext) {
        for integration in self.integrations.iter_mut() {
            if let Err(err) = integration.on_hook(hook, ctx, self.sink) {
                self.sink.error(&format!(
                    "Integration {} failed during {hook}: {err:#}",
                    integration.name()
                ));
            }
        }
    }

    /// Fires the static build sequence.
    pub fn run_build(&mut self, ctx: &HookContext) {
        for hook in LifecycleHook::BUILD {
            self.dispatch(hook, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::MemorySink;
    use log::Level;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        seen: Rc<RefCell<Vec<LifecycleHook>>>,
        fail_on: Option<LifecycleHook>,
    }

    impl Integration for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_hook(&mut self, hook: LifecycleHook, _ctx: &HookContext, _sink: &dyn LogSink) -> Result<()> {
            self.seen.borrow_mut().push(hook);
            if self.fail_on == Some(hook) {
                bail!("boom");
            }
            Ok(())
        }
    }

    #[test]
    fn test_names_round_trip() {
        for hook in LifecycleHook::ALL {
            assert_eq!(hook.name().parse::<LifecycleHook>().unwrap(), hook);
        }
        assert!("build:nope".parse::<LifecycleHook>().is_err());
    }

    #[test]
    fn test_build_sequence_order() {
        let sink = MemorySink::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut host = IntegrationHost::new(&sink);
        host.register(Box::new(Recorder {
            seen: Rc::clone(&seen),
            fail_on: None,
        }));

        host.run_build(&HookContext::default());
        assert_eq!(*seen.borrow(), LifecycleHook::BUILD.to_vec());
    }

    #[test]
    fn test_failing_integration_is_logged_and_others_still_run() {
        let sink = MemorySink::new();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut host = IntegrationHost::new(&sink);
        host.register(Box::new(Recorder {
            seen: Rc::clone(&first),
            fail_on: Some(LifecycleHook::BuildStart),
        }));
        host.register(Box::new(Recorder {
            seen: Rc::clone(&second),
            fail_on: None,
        }));

        host.dispatch(LifecycleHook::BuildStart, &HookContext::default());
        assert_eq!(first.borrow().len(), 1);
        assert_eq!(second.borrow().len(), 1);
        assert!(sink.contains(Level::Error, "recorder failed during build:start: boom"));
    }

    #[test]
    fn test_hook_logger_prints_details() {
        let sink = MemorySink::new();
        let mut logger = HookLogger;
        let ctx = HookContext::default()
            .with_detail("Command", "build")
            .with_detail("Number of routes", 3);

        logger
            .on_hook(LifecycleHook::ConfigSetup, &ctx, &sink)
            .unwrap();
        assert_eq!(
            sink.messages_at(Level::Info),
            vec![
                "config:setup hook called",
                "- Command: build",
                "- Number of routes: 3"
            ]
        );
    }
}
