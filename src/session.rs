use crate::action::{ActionId, ActionRequest, CompileActionRegistry};
use crate::build_options::BuildOptions;
use crate::diagnostic::DiagnosticEngine;
use crate::error::DriverError;

/// State of one build: its options, its compile actions and the diagnostics
/// reported so far.
///
/// Builds are single-threaded; everything that mutates a session takes it by
/// `&mut`. Run concurrent builds in separate sessions.
#[derive(Debug)]
pub struct BuildSession {
    pub options: BuildOptions,
    pub registry: CompileActionRegistry,
    pub diagnostics: DiagnosticEngine,
}

impl BuildSession {
    pub fn new(options: BuildOptions) -> Self {
        BuildSession {
            options,
            registry: CompileActionRegistry::new(),
            diagnostics: DiagnosticEngine::new(),
        }
    }

    pub fn add_unit(&mut self, request: ActionRequest) -> Result<ActionId, DriverError> {
        self.registry.create_action(request)
    }

    pub fn has_errored(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Forget the previous build; pending generated sources are removed.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.diagnostics.clear();
    }
}
