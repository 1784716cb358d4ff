use std::path::PathBuf;

use super::compiler::CompileOrchestrator;
use super::output::OutputHandler;
use super::{BuildStatus, CompileReport};
use crate::action::ActionId;
use crate::build_options::{CompileFlags, HostPlatform};
use crate::diagnostic::{ErrorFormatter, OriginFile, Position, Severity};
use crate::error::{ConfigFault, DriverError};
use crate::process::normalized_path;
use crate::session::BuildSession;
use crate::source::SourceLocation;
use crate::test_utils::{ScriptedRunner, config, options_for, sample_request, write_core_header};
use crate::toolchain::ToolchainFamily;

/// Matches the compile invocation but not the version probe
const COMPILE: &str = "-include";

struct Build {
    dir: tempfile::TempDir,
    session: BuildSession,
    primary: ActionId,
    generated: PathBuf,
}

fn setup(host: HostPlatform) -> Build {
    let dir = tempfile::tempdir().unwrap();
    let core = write_core_header(dir.path());
    let mut session = BuildSession::new(options_for(host, &core));
    let primary = session.add_unit(sample_request(dir.path(), "main.hlx")).unwrap();
    let generated = session.registry.get(primary).unwrap().generated_path().to_path_buf();
    Build {
        dir,
        session,
        primary,
        generated,
    }
}

fn run(build: &mut Build, runner: &ScriptedRunner) -> Result<CompileReport, DriverError> {
    CompileOrchestrator::new(runner)
        .with_output(OutputHandler::with_formatter(ErrorFormatter::plain()))
        .build(&mut build.session, build.primary)
}

fn clang_runner(build: &Build, compile_output: String, exit_code: i32) -> ScriptedRunner {
    let runner = ScriptedRunner::new(HostPlatform::Posix);
    runner.respond("--version", config::CLANG_VERSION, 0);
    runner.respond(COMPILE, compile_output, exit_code);
    runner.watch(&build.generated);
    runner
}

fn generated_line(build: &Build, line: u32, rest: &str) -> String {
    format!("{}:{}:3: {}\n", normalized_path(&build.generated), line, rest)
}

#[test]
fn test_success_removes_generated_source() {
    let mut build = setup(HostPlatform::Posix);
    let runner = clang_runner(&build, String::new(), 0);

    let report = run(&mut build, &runner).unwrap();
    assert!(report.is_success());
    assert_eq!(report.family, ToolchainFamily::Clang);
    assert!(!build.generated.exists());
    assert!(runner.invocations().iter().all(|i| i.watched_existed == Some(true)));
}

#[test]
fn test_missing_runtime_aborts_before_any_process() {
    let mut build = setup(HostPlatform::Posix);
    build.session.options.core_header = build.dir.path().join("missing.hh");
    let runner = clang_runner(&build, String::new(), 0);

    let err = run(&mut build, &runner).unwrap_err();
    assert!(matches!(err, DriverError::MissingRuntime(_)));
    assert!(runner.invocations().is_empty());
    assert!(!build.generated.exists());
}

#[test]
fn test_spawn_failure_is_not_a_nonzero_exit() {
    let mut build = setup(HostPlatform::Posix);
    let runner = ScriptedRunner::new(HostPlatform::Posix);
    runner.respond("--version", config::CLANG_VERSION, 0);
    runner.fail_spawn(COMPILE);

    let err = run(&mut build, &runner).unwrap_err();
    assert!(matches!(err, DriverError::ProcessSpawn { .. }));
    assert!(!build.generated.exists());
}

#[test]
fn test_failed_probe_is_toolchain_not_found() {
    let mut build = setup(HostPlatform::Posix);
    let runner = ScriptedRunner::new(HostPlatform::Posix);
    runner.respond("--version", "", 1);

    let err = run(&mut build, &runner).unwrap_err();
    assert!(matches!(err, DriverError::ToolchainNotFound { .. }));
    assert_eq!(runner.count(COMPILE), 0);
    assert!(!build.generated.exists());
}

#[test]
fn test_whole_program_ordering() {
    let mut build = setup(HostPlatform::Posix);
    let mut second = sample_request(build.dir.path(), "util.hlx");
    second.extra_args = vec!["-ignored".to_string()];
    let other = build.session.add_unit(second).unwrap();
    let other_path = build.session.registry.get(other).unwrap().generated_path().to_path_buf();

    // rebuild the primary so it carries extra args
    drop(build.session.registry.take(build.primary));
    let mut primary = sample_request(build.dir.path(), "main.hlx");
    primary.extra_args = vec!["-lm".to_string()];
    build.primary = build.session.add_unit(primary).unwrap();
    build.generated = build.session.registry.get(build.primary).unwrap().generated_path().to_path_buf();

    let runner = clang_runner(&build, String::new(), 0);
    run(&mut build, &runner).unwrap();

    let compile = runner
        .invocations()
        .into_iter()
        .find(|i| i.rendered.contains(COMPILE))
        .unwrap();
    let b = compile.command.position(&normalized_path(&other_path)).unwrap();
    let extra = compile.command.position("-lm").unwrap();
    let a = compile.command.position(&normalized_path(&build.generated)).unwrap();
    assert!(b < extra && extra < a);
    assert!(compile.command.position("-ignored").is_none());

    assert!(other_path.exists());
    build.session.reset();
    assert!(!other_path.exists());
}

#[test]
fn test_windows_falls_back_to_generic_driver_once() {
    let mut build = setup(HostPlatform::Windows);
    let runner = ScriptedRunner::new(HostPlatform::Windows);
    runner.respond("vswhere", "", 1);
    runner.respond("c++ --version", config::GCC_VERSION, 0);
    runner.respond(COMPILE, "", 0);
    runner.watch(&build.generated);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.family, ToolchainFamily::Gcc);
    assert_eq!(runner.count("vswhere"), 1);
    assert_eq!(runner.count("--version"), 1);

    let compile = runner
        .invocations()
        .into_iter()
        .find(|i| i.rendered.contains(COMPILE))
        .unwrap();
    assert!(compile.rendered.starts_with("c++ "));
    assert_eq!(compile.watched_existed, Some(true));
    assert!(compile.command.position("-Wl,-w,-rpath,/usr/local/lib").is_none());
    assert!(!build.generated.exists());
}

#[test]
fn test_windows_fallback_failure_is_not_retried() {
    let mut build = setup(HostPlatform::Windows);
    let runner = ScriptedRunner::new(HostPlatform::Windows);
    runner.respond("vswhere", "", 1);

    let err = run(&mut build, &runner).unwrap_err();
    assert!(matches!(err, DriverError::ToolchainNotFound { .. }));
    assert_eq!(runner.count("vswhere"), 1);
    assert_eq!(runner.count("--version"), 1);
    assert!(!build.generated.exists());
}

/// Lay out a fake Visual Studio install under the build dir and script its discovery.
fn native_toolchain_runner(build: &Build) -> ScriptedRunner {
    let vs = build.dir.path().join("vs");
    let scripts = vs.join("VC").join("Auxiliary").join("Build");
    std::fs::create_dir_all(&scripts).unwrap();
    std::fs::write(scripts.join("vcvars64.bat"), "").unwrap();

    let runner = ScriptedRunner::new(HostPlatform::Windows);
    runner.respond("vswhere", vs.display().to_string(), 0);
    runner.respond("vcvars64.bat", "", 0);
    runner
}

#[test]
fn test_windows_native_toolchain_inside_vcvars() {
    let mut build = setup(HostPlatform::Windows);
    let stem = build.generated.file_stem().unwrap().to_string_lossy().into_owned();
    let object = build.dir.path().join(format!("{}.obj", stem));
    std::fs::write(&object, "").unwrap();
    let runner = native_toolchain_runner(&build);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.family, ToolchainFamily::Msvc);
    assert_eq!(runner.count("--version"), 0);
    let compile = runner.invocations().pop().unwrap();
    assert_eq!(compile.command.program(), "cl");
    assert!(compile.rendered.starts_with("cmd.exe /c \"call "));
    assert!(!object.exists());
}

#[test]
fn test_windows_native_removes_debug_verbose_object() {
    let dir = tempfile::tempdir().unwrap();
    let core = write_core_header(dir.path());
    let mut session = BuildSession::new(options_for(HostPlatform::Windows, &core));
    let mut request = sample_request(dir.path(), "main.hlx");
    request.flags = CompileFlags::DEBUG | CompileFlags::VERBOSE;
    let primary = session.add_unit(request).unwrap();
    let generated = session.registry.get(primary).unwrap().generated_path().to_path_buf();
    assert_eq!(generated, dir.path().join("IR.temp.debug.verbose.cxir"));
    let mut build = Build {
        dir,
        session,
        primary,
        generated,
    };

    let object = build.dir.path().join("IR.temp.debug.verbose.obj");
    std::fs::write(&object, "").unwrap();
    let runner = native_toolchain_runner(&build);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.family, ToolchainFamily::Msvc);
    assert!(!object.exists());
    assert!(!build.generated.exists());
}

#[test]
fn test_prespecified_compiler_skips_host_selection() {
    let mut build = setup(HostPlatform::Windows);
    build.session.options.compiler = Some("clang++".to_string());
    let runner = ScriptedRunner::new(HostPlatform::Windows);
    runner.respond("clang++ --version", config::CLANG_VERSION, 0);
    runner.respond(COMPILE, "", 0);

    run(&mut build, &runner).unwrap();
    assert_eq!(runner.count("vswhere"), 0);
    assert_eq!(runner.count("clang++"), 2);
}

#[test]
fn test_unknown_family_status_follows_exit_code() {
    for (exit_code, expected) in [(0, BuildStatus::Success), (1, BuildStatus::Error)] {
        let mut build = setup(HostPlatform::Posix);
        let runner = ScriptedRunner::new(HostPlatform::Posix);
        runner.respond("--version", config::UNKNOWN_VERSION, 0);
        let output = generated_line(&build, 5, "error: looks like a diagnostic");
        runner.respond(COMPILE, output, exit_code);

        let report = run(&mut build, &runner).unwrap();
        assert_eq!(report.family, ToolchainFamily::Unknown);
        assert_eq!(report.status, expected);
        assert!(build.session.diagnostics.diagnostics().is_empty());

        let compile = runner.invocations().pop().unwrap();
        assert!(compile.command.position("-fdiagnostics-color=never").is_none());
    }
}

#[test]
fn test_error_is_remapped_to_original_source() {
    let mut build = setup(HostPlatform::Posix);
    let output = generated_line(&build, 5, "error: expected ';' after expression");
    let runner = clang_runner(&build, output, 1);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.status, BuildStatus::Error);
    assert_eq!(report.errors, 1);
    assert!(matches!(report.into_result(), Err(DriverError::Diagnostics { errors: 1 })));

    let diagnostics = build.session.diagnostics.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].file, OriginFile::User(PathBuf::from("main.hlx")));
    assert_eq!(diagnostics[0].position, Position::Mapped(SourceLocation::new(12, 3, 4)));
    assert_eq!(diagnostics[0].message, "expected ';' after expression");
}

#[test]
fn test_reported_error_fails_despite_zero_exit() {
    let mut build = setup(HostPlatform::Posix);
    let output = generated_line(&build, 99, "error: odd toolchain");
    let runner = clang_runner(&build, output, 0);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.status, BuildStatus::Error);
    let diagnostics = build.session.diagnostics.diagnostics();
    assert_eq!(diagnostics[0].position, Position::Other(SourceLocation::new(99, 3, 1)));
}

#[test]
fn test_warnings_do_not_fail_the_build() {
    let mut build = setup(HostPlatform::Posix);
    let output = generated_line(&build, 5, "warning: unused variable 'x'");
    let runner = clang_runner(&build, output, 0);

    let report = run(&mut build, &runner).unwrap();
    assert!(report.is_success());
    assert_eq!(build.session.diagnostics.diagnostics()[0].severity, Severity::Warning);
}

#[test]
fn test_template_context_lines_do_not_fail_the_build() {
    let mut build = setup(HostPlatform::Posix);
    let mut output = generated_line(&build, 5, "warning: unused variable 'x'");
    output.push_str(&format!(
        "{}:7:6:   required from 'void helix::run() [with T = int]'\n",
        normalized_path(&build.generated)
    ));
    let runner = clang_runner(&build, output, 0);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.status, BuildStatus::Success);
    let diagnostics = build.session.diagnostics.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_core_header_diagnostics_are_suppressed_unless_error() {
    let mut build = setup(HostPlatform::Posix);
    let core = normalized_path(&build.session.options.core_header);
    let output = format!("{0}:10:1: warning: unused\n{0}:11:2: note: here\n{0}:12:1: error: boom\n", core);
    let runner = clang_runner(&build, output, 1);

    run(&mut build, &runner).unwrap();
    let diagnostics = build.session.diagnostics.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(matches!(diagnostics[0].file, OriginFile::CoreLibrary(_)));
}

#[test]
fn test_missing_file_keeps_errors_only() {
    let mut build = setup(HostPlatform::Posix);
    let output = "/nonexistent/dir/x.h:3:1: warning: dropped\n/nonexistent/dir/x.h:4:1: error: kept\n".to_string();
    let runner = clang_runner(&build, output, 1);

    run(&mut build, &runner).unwrap();
    let diagnostics = build.session.diagnostics.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "kept");
    assert_eq!(diagnostics[0].file, OriginFile::External(PathBuf::from("/nonexistent/dir/x.h")));
    assert_eq!(diagnostics[0].position, Position::Other(SourceLocation::new(4, 1, 1)));
}

#[test]
fn test_failure_without_diagnostics_is_an_error() {
    let mut build = setup(HostPlatform::Posix);
    let runner = clang_runner(&build, "/usr/bin/ld: cannot find -lfoo\n".to_string(), 1);

    let report = run(&mut build, &runner).unwrap();
    assert_eq!(report.status, BuildStatus::Error);
    assert_eq!(report.errors, 0);
    assert!(report.raw_output.contains("cannot find -lfoo"));
}

#[test]
fn test_dry_run_checks_syntax_only() {
    let mut build = setup(HostPlatform::Posix);
    build.session.options.dry_run = true;
    let runner = clang_runner(&build, String::new(), 0);

    run(&mut build, &runner).unwrap();
    let compile = runner.invocations().pop().unwrap();
    assert!(compile.command.position("-fsyntax-only").is_some());
    assert!(compile.command.position("-o").is_none());
}

#[test]
fn test_unregistered_action_is_a_config_fault() {
    let mut build = setup(HostPlatform::Posix);
    drop(build.session.registry.take(build.primary));
    let runner = clang_runner(&build, String::new(), 0);

    let err = run(&mut build, &runner).unwrap_err();
    assert!(matches!(err, DriverError::Config(ConfigFault::UnknownAction(_))));
    assert!(runner.invocations().is_empty());
    assert!(!build.generated.exists());
}
