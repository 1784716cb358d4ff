//! Assembly of the toolchain command line.

use std::path::Path;

use crate::build_options::{CompileFlags, HostPlatform};
use crate::error::DriverError;
use crate::process::CommandLine;
use crate::toolchain::ToolchainFamily;
use crate::toolchain::flags::{self, Flag};

/// Everything the command line of one invocation is built from.
#[derive(Debug, Clone)]
pub struct CommandInputs<'a> {
    pub family: ToolchainFamily,
    pub compiler: &'a str,
    pub core_header: &'a Path,
    pub flags: CompileFlags,
    pub dry_run: bool,
    pub host: HostPlatform,
    pub output: &'a Path,
    /// Generated sources of the other units of the build, in registry order
    pub other_sources: Vec<&'a Path>,
    pub extra_args: &'a [String],
    pub source: &'a Path,
    /// `vcvars64.bat` for the native MSVC path
    pub env_script: Option<&'a Path>,
}

fn push_flag(command: &mut CommandLine, flag: &Flag, family: ToolchainFamily) -> Result<(), DriverError> {
    command.args(flags::resolve_args(flag, family)?);
    Ok(())
}

/// Build the command line.
///
/// The order is fixed: runtime header, debug or optimization, language
/// standard, exceptions, diagnostics formatting, runtime library path (POSIX),
/// warnings, output or syntax-only, the other units' sources, the extra
/// arguments and finally the unit's own source.
pub fn assemble(inputs: &CommandInputs<'_>) -> Result<CommandLine, DriverError> {
    let dialect = inputs.family.flag_dialect();
    let mut command = CommandLine::new(inputs.compiler);

    push_flag(&mut command, &flags::INCLUDE_HEADER, dialect)?;
    command.path_arg(inputs.core_header);

    let build_mode = if inputs.flags.is_debug() {
        &flags::DEBUG_INFO
    } else {
        &flags::OPTIMIZE_MAX
    };
    push_flag(&mut command, build_mode, dialect)?;

    push_flag(&mut command, &flags::FORCE_CXX, dialect)?;
    push_flag(&mut command, &flags::STD_CXX23, dialect)?;
    push_flag(&mut command, &flags::EXCEPTIONS, dialect)?;

    if inputs.family.formats_diagnostics() {
        for flag in &flags::DIAGNOSTICS_BATTERY {
            push_flag(&mut command, flag, dialect)?;
        }
    }

    if !inputs.host.is_windows() {
        push_flag(&mut command, &flags::RUNTIME_LIBRARY_PATH, dialect)?;
    }

    push_flag(&mut command, &flags::WARN_ALL, dialect)?;

    if inputs.dry_run {
        push_flag(&mut command, &flags::SYNTAX_ONLY, dialect)?;
    } else {
        push_flag(&mut command, &flags::OUTPUT, dialect)?;
        command.path_arg(inputs.output);
    }

    for other in &inputs.other_sources {
        command.path_arg(other);
    }
    command.args(inputs.extra_args.iter().cloned());
    command.path_arg(inputs.source);

    match inputs.env_script {
        Some(script) => {
            command.within_environment(script);
        }
        None => {
            command.merge_stderr();
        }
    }
    Ok(command)
}
