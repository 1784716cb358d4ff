//! Discovery of the native Windows toolchain.
//!
//! `cl.exe` is only usable inside the environment `vcvars64.bat` sets up, so
//! discovery yields that script; the compile command is then run after it.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::DriverError;
use crate::process::{CommandLine, ProcessRunner};

/// Installer-provided locator, at a fixed location on every Visual Studio machine.
pub const VSWHERE: &str = r"C:\Program Files (x86)\Microsoft Visual Studio\Installer\vswhere.exe";

/// Workload component that provides the x64 C++ toolset.
pub const VC_TOOLS_COMPONENT: &str = "Microsoft.VisualStudio.Component.VC.Tools.x86.x64";

/// Environment script, relative to the installation path.
pub const VCVARS_RELATIVE: [&str; 4] = ["VC", "Auxiliary", "Build", "vcvars64.bat"];

/// Compiler invoked inside the vcvars environment.
pub const CL: &str = "cl";

pub fn vswhere_command() -> CommandLine {
    let mut command = CommandLine::new(VSWHERE);
    command
        .args(["-latest", "-products", "*", "-requires", VC_TOOLS_COMPONENT])
        .args(["-property", "installationPath"]);
    command
}

/// `vcvars64.bat` of an installation, if present.
pub fn find_vcvars(install_path: &Path) -> Option<PathBuf> {
    let script = VCVARS_RELATIVE.iter().fold(install_path.to_path_buf(), |p, part| p.join(part));
    script.exists().then_some(script)
}

/// Locate the environment script of the latest Visual Studio with the C++ toolset.
pub fn locate_build_tools(runner: &dyn ProcessRunner) -> Result<PathBuf, DriverError> {
    let result = runner.run(&vswhere_command())?;
    if !result.success() {
        return Err(DriverError::not_found(CL, format!("vswhere exited with {}", result.exit_code)));
    }

    let install_path = result
        .output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| DriverError::not_found(CL, "no Visual Studio installation with the C++ toolset"))?;
    debug!("visual studio installation: {}", install_path);

    let install_path = Path::new(install_path);
    if !install_path.is_dir() {
        return Err(DriverError::not_found(
            CL,
            format!("installation path {} does not exist", install_path.display()),
        ));
    }

    find_vcvars(install_path)
        .ok_or_else(|| DriverError::not_found(CL, format!("vcvars64.bat missing under {}", install_path.display())))
}
