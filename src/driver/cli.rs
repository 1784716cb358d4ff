//! CLI parsing and configuration module
//!
//! This module handles command-line argument parsing using clap and
//! provides configuration structures for the compiler driver.

use std::path::PathBuf;

use clap::Parser as CliParser;

use crate::action::{ActionRequest, default_output};
use crate::build_options::{BuildOptions, CompileFlags, HostPlatform, RemapPolicy};
use crate::error::DriverError;
use crate::runtime::{self, CORE_HEADER_NAME};
use crate::source::SourceLineMap;

/// CLI interface using clap
#[derive(CliParser, Debug)]
#[clap(
    name = "cxir-driver",
    about = "Compile generated CX-IR sources with the host C++ toolchain"
)]
pub struct Cli {
    /// Generated sources; the first one is the entry unit
    #[clap(value_parser, required = true)]
    pub generated: Vec<PathBuf>,

    /// Extra arguments for the compiler
    #[clap(last = true, value_name = "CXX_ARGS")]
    pub cxx_args: Vec<String>,

    /// Output binary
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON line map, one per generated source, in the same order
    #[clap(short = 'm', long = "line-map", value_name = "FILE", action = clap::ArgAction::Append)]
    pub line_maps: Vec<PathBuf>,

    /// Original source, one per generated source, in the same order
    #[clap(short = 's', long = "source", value_name = "FILE", action = clap::ArgAction::Append)]
    pub sources: Vec<PathBuf>,

    /// C++ compiler to use instead of the host default
    #[clap(short, long, value_name = "CXX", env = "CXIR_CXX")]
    pub compiler: Option<String>,

    /// Core runtime header injected into every unit
    #[clap(long, value_name = "FILE", env = "CXIR_CORE_HEADER")]
    pub core_header: Option<PathBuf>,

    /// Build with debug information instead of optimizations
    #[clap(short, long)]
    pub debug: bool,

    /// Enable verbose diagnostic output
    #[clap(short, long)]
    pub verbose: bool,

    /// Only report errors
    #[clap(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Check syntax only, do not produce a binary
    #[clap(long)]
    pub dry_run: bool,

    /// How generated lines without a line-map entry are resolved
    #[clap(long, value_enum, default_value_t = RemapPolicy::Exact)]
    pub remap: RemapPolicy,
}

/// One compilation unit as named on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    pub generated: PathBuf,
    pub original: PathBuf,
    pub line_map: Option<PathBuf>,
}

/// Configuration for one build
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Entry unit first
    pub units: Vec<UnitConfig>,
    pub output: Option<PathBuf>,
    pub compiler: Option<String>,
    pub core_header: Option<PathBuf>,
    pub cxx_args: Vec<String>,
    pub flags: CompileFlags,
    pub dry_run: bool,
    pub remap_policy: RemapPolicy,
}

fn per_unit(kind: &str, given: Vec<PathBuf>, units: usize) -> Result<Vec<Option<PathBuf>>, String> {
    match given.len() {
        0 => Ok(vec![None; units]),
        n if n == units => Ok(given.into_iter().map(Some).collect()),
        n => Err(format!("{} {} file(s) given for {} generated source(s)", n, kind, units)),
    }
}

impl Cli {
    /// Convert CLI arguments into build configuration
    pub fn into_config(self) -> Result<BuildConfig, String> {
        let count = self.generated.len();
        let maps = per_unit("line-map", self.line_maps, count)?;
        let sources = per_unit("source", self.sources, count)?;

        let units = self
            .generated
            .into_iter()
            .zip(maps)
            .zip(sources)
            .map(|((generated, line_map), original)| UnitConfig {
                original: original.unwrap_or_else(|| generated.clone()),
                generated,
                line_map,
            })
            .collect();

        Ok(BuildConfig {
            units,
            output: self.output,
            compiler: self.compiler.filter(|c| !c.trim().is_empty()),
            core_header: self.core_header,
            cxx_args: self.cxx_args,
            flags: CompileFlags::from_switches(self.debug, self.verbose),
            dry_run: self.dry_run,
            remap_policy: self.remap,
        })
    }
}

impl BuildConfig {
    /// Options for `host`; without an explicit core header the install locations are searched.
    pub fn build_options(&self, host: HostPlatform) -> BuildOptions {
        let core_header = self
            .core_header
            .clone()
            .or_else(runtime::locate_core_header)
            .unwrap_or_else(|| PathBuf::from(CORE_HEADER_NAME));

        let mut options = BuildOptions::new(core_header);
        options.compiler = self.compiler.clone();
        options.dry_run = self.dry_run;
        options.remap_policy = self.remap_policy;
        options.host = host;
        options
    }

    /// Read every unit from disk. Extra compiler arguments go to the entry unit.
    pub fn load_requests(&self, host: HostPlatform) -> Result<Vec<ActionRequest>, DriverError> {
        let output = match (&self.output, self.units.first()) {
            (Some(output), _) => output.clone(),
            (None, Some(entry)) => default_output(&entry.original, host),
            (None, None) => return Ok(Vec::new()),
        };

        self.units
            .iter()
            .enumerate()
            .map(|(index, unit)| {
                let text = std::fs::read_to_string(&unit.generated).map_err(|e| DriverError::io(&unit.generated, e))?;
                let line_map = match &unit.line_map {
                    Some(path) => SourceLineMap::load(path)?,
                    None => SourceLineMap::new(),
                };

                let mut request = ActionRequest::new(text, unit.original.clone());
                request.output = output.clone();
                request.flags = self.flags;
                request.line_map = line_map;
                if index == 0 {
                    request.extra_args = self.cxx_args.clone();
                }
                Ok(request)
            })
            .collect()
    }
}
