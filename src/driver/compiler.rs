//! Compile pipeline orchestration
//!
//! One call to [`CompileOrchestrator::compile`] runs a single whole-program
//! toolchain invocation: detect the toolchain, assemble the command, execute
//! it, then parse, remap and report its diagnostics. The primary action is
//! owned for the whole call, so its generated source outlives every
//! invocation and is removed on every exit path.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::action::{ActionId, CompileAction};
use crate::diagnostic::NormalizedDiagnostic;
use crate::diagnostic::remap::{RemapUnit, SourceRemapper};
use crate::error::{ConfigFault, DriverError};
use crate::process::{CommandLine, ExecResult, ProcessRunner};
use crate::session::BuildSession;
use crate::toolchain::{GENERIC_DRIVER, ToolchainFamily, msvc};

use super::artifact::{BuildStatus, CompilePhase, CompileReport};
use super::command::{CommandInputs, assemble};
use super::output::OutputHandler;

/// Toolchain chosen for an invocation.
#[derive(Debug, Clone)]
struct Toolchain {
    family: ToolchainFamily,
    compiler: String,
    /// Set on the native MSVC path
    env_script: Option<PathBuf>,
}

/// Drives toolchain invocations for a [`BuildSession`].
pub struct CompileOrchestrator<'r> {
    runner: &'r dyn ProcessRunner,
    output_handler: OutputHandler,
    phase: CompilePhase,
}

impl<'r> CompileOrchestrator<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        CompileOrchestrator {
            runner,
            output_handler: OutputHandler::new(),
            phase: CompilePhase::default(),
        }
    }

    pub fn with_output(mut self, output_handler: OutputHandler) -> Self {
        self.output_handler = output_handler;
        self
    }

    /// Phase the last compile reached
    pub fn phase(&self) -> CompilePhase {
        self.phase
    }

    fn enter(&mut self, phase: CompilePhase) {
        debug!("phase: {}", phase);
        self.phase = phase;
    }

    /// Compile the build with `primary` as the entry unit.
    ///
    /// Every other registered unit takes part in the same invocation.
    pub fn build(&mut self, session: &mut BuildSession, primary: ActionId) -> Result<CompileReport, DriverError> {
        let action = session
            .registry
            .take(primary)
            .ok_or(ConfigFault::UnknownAction(primary))?;
        self.compile(session, action)
    }

    /// Run one invocation for `action`, consuming it.
    pub fn compile(&mut self, session: &mut BuildSession, mut action: CompileAction) -> Result<CompileReport, DriverError> {
        let result = self.run_action(session, &mut action);
        if let Err(e) = &result {
            debug!("{} failed: {}", self.phase, e);
        }
        self.enter(CompilePhase::Cleanup);
        action.cleanup();
        result
    }

    fn run_action(&mut self, session: &mut BuildSession, action: &mut CompileAction) -> Result<CompileReport, DriverError> {
        self.enter(CompilePhase::Detect);
        let core_header = &session.options.core_header;
        if !core_header.is_file() {
            return Err(DriverError::MissingRuntime(core_header.clone()));
        }

        if action.compiler().is_empty()
            && let Some(compiler) = &session.options.compiler
        {
            action.set_compiler(compiler.clone());
        }

        if !action.compiler().is_empty() {
            let toolchain = self.detect(action.compiler())?;
            return self.invoke(session, action, toolchain);
        }

        if session.options.host.is_windows() {
            match msvc::locate_build_tools(self.runner) {
                Ok(vcvars) => {
                    let toolchain = Toolchain {
                        family: ToolchainFamily::Msvc,
                        compiler: msvc::CL.to_string(),
                        env_script: Some(vcvars),
                    };
                    let report = self.invoke(session, action, toolchain);
                    remove_msvc_objects(action);
                    return report;
                }
                Err(DriverError::ToolchainNotFound { reason, .. }) => {
                    warn!("native toolchain unavailable ({}), falling back to {}", reason, GENERIC_DRIVER);
                }
                Err(e) => return Err(e),
            }
        }

        action.set_compiler(GENERIC_DRIVER);
        self.enter(CompilePhase::Detect);
        let toolchain = self.detect(GENERIC_DRIVER)?;
        self.invoke(session, action, toolchain)
    }

    /// Probe `compiler --version` and classify the result.
    fn detect(&self, compiler: &str) -> Result<Toolchain, DriverError> {
        let mut probe = CommandLine::new(compiler);
        probe.arg("--version").merge_stderr();
        let result = self.runner.run(&probe)?;
        if !result.success() {
            return Err(DriverError::not_found(
                compiler,
                format!("`{} --version` exited with {}", compiler, result.exit_code),
            ));
        }

        let family = ToolchainFamily::detect(&result.output);
        debug!("detected {} toolchain for {}", family, compiler);
        Ok(Toolchain {
            family,
            compiler: compiler.to_string(),
            env_script: None,
        })
    }

    fn invoke(
        &mut self,
        session: &mut BuildSession,
        action: &CompileAction,
        toolchain: Toolchain,
    ) -> Result<CompileReport, DriverError> {
        self.enter(CompilePhase::Assemble);
        let command = {
            let options = &session.options;
            let inputs = CommandInputs {
                family: toolchain.family,
                compiler: &toolchain.compiler,
                core_header: &options.core_header,
                flags: action.flags(),
                dry_run: options.dry_run,
                host: options.host,
                output: action.output(),
                other_sources: session.registry.iter().map(|(_, a)| a.generated_path()).collect(),
                extra_args: action.extra_args(),
                source: action.generated_path(),
                env_script: toolchain.env_script.as_deref(),
            };
            assemble(&inputs)?
        };

        self.enter(CompilePhase::Execute);
        debug!("compile command: {}", command.render(self.runner.host()));
        let result = self.runner.run(&command)?;
        debug!("compiler output:\n{}", result.output);

        let Some(syntax) = toolchain.family.diagnostic_syntax() else {
            self.enter(CompilePhase::Report);
            self.output_handler.dump_raw_output(&result.output);
            let status = if result.success() {
                BuildStatus::Success
            } else {
                BuildStatus::Error
            };
            return Ok(self.finish(session, action, toolchain.family, status, result));
        };

        self.enter(CompilePhase::Parse);
        let raw = syntax.parse_output(&result.output);
        debug!("{} diagnostic(s) parsed", raw.len());

        self.enter(CompilePhase::Remap);
        let diagnostics: Vec<NormalizedDiagnostic> = {
            let mut remapper = SourceRemapper::new(&session.options.core_header, session.options.remap_policy);
            remapper.add_unit(unit_of(action));
            for (_, other) in session.registry.iter() {
                remapper.add_unit(unit_of(other));
            }
            raw.into_iter().filter_map(|d| remapper.translate(d)).collect()
        };

        self.enter(CompilePhase::Report);
        self.output_handler.print_diagnostics(&diagnostics);
        for diagnostic in diagnostics {
            session.diagnostics.report(diagnostic);
        }

        let status = if result.success() && !session.has_errored() {
            BuildStatus::Success
        } else {
            BuildStatus::Error
        };
        if !result.success() && !session.has_errored() {
            self.output_handler.dump_unexplained_failure(result.exit_code, &result.output);
        }
        Ok(self.finish(session, action, toolchain.family, status, result))
    }

    fn finish(
        &self,
        session: &BuildSession,
        action: &CompileAction,
        family: ToolchainFamily,
        status: BuildStatus,
        result: ExecResult,
    ) -> CompileReport {
        if status == BuildStatus::Success {
            info!("lowered {} and compiled cxir", action.original().display());
            if session.options.dry_run {
                info!("syntax check passed");
            } else {
                info!("compiled successfully to {}", action.output().display());
            }
        }
        CompileReport {
            status,
            family,
            exit_code: result.exit_code,
            errors: session.diagnostics.error_count(),
            output: action.output().to_path_buf(),
            raw_output: result.output,
        }
    }
}

fn unit_of(action: &CompileAction) -> RemapUnit<'_> {
    RemapUnit {
        generated: action.generated_path(),
        original: action.original(),
        line_map: action.line_map(),
    }
}

/// Remove the `.obj` that `cl` leaves next to the working and output directories.
fn remove_msvc_objects(action: &CompileAction) {
    let Some(name) = action.generated_path().file_name() else {
        return;
    };
    // only `.cxir` is replaced: `IR.temp.debug.verbose.cxir` -> `IR.temp.debug.verbose.obj`
    let object = Path::new(name).with_extension("obj");
    let mut dirs = vec![action.working_dir().to_path_buf()];
    if let Some(out_dir) = action.output().parent().filter(|d| !d.as_os_str().is_empty()) {
        dirs.push(out_dir.to_path_buf());
    }

    for dir in dirs {
        let path = dir.join(&object);
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => info!("deleted object file {}", path.display()),
            Err(e) => warn!("failed to delete object file {}: {}", path.display(), e),
        }
    }
}
