//! Compile actions: one generated source on disk and everything needed to build it.
//!
//! The generated source is owned by its action and removed when the action is
//! dropped, whichever way the build ended.

use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};
use tempfile::TempPath;

use crate::build_options::{CompileFlags, HostPlatform};
use crate::error::DriverError;
use crate::source::SourceLineMap;

/// Extension of generated sources.
pub const CXIR_SUFFIX: &str = ".cxir";

/// Stem of the fixed, inspectable source name used in debug-verbose builds.
pub const DEBUG_SOURCE_STEM: &str = "IR.temp.debug.verbose";

/// Name of the debug-verbose source of the `index`-th unit of a build.
pub fn debug_source_name(index: usize) -> String {
    match index {
        0 => format!("{}{}", DEBUG_SOURCE_STEM, CXIR_SUFFIX),
        n => format!("{}.{}{}", DEBUG_SOURCE_STEM, n, CXIR_SUFFIX),
    }
}

/// Binary name derived from the original source: its stem, plus `.exe` on Windows.
pub fn default_output(original: &Path, host: HostPlatform) -> PathBuf {
    let stem = original.file_stem().map(|s| s.to_string_lossy().into_owned());
    PathBuf::from(format!("{}{}", stem.as_deref().unwrap_or("a"), host.exe_suffix()))
}

/// What the front end hands over for one compilation unit.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub generated_source: String,
    pub original: PathBuf,
    pub output: PathBuf,
    pub working_dir: PathBuf,
    /// Empty lets the orchestrator select a toolchain
    pub compiler: String,
    pub extra_args: Vec<String>,
    pub flags: CompileFlags,
    pub line_map: SourceLineMap,
}

impl ActionRequest {
    pub fn new(generated_source: impl Into<String>, original: impl Into<PathBuf>) -> Self {
        let original = original.into();
        ActionRequest {
            generated_source: generated_source.into(),
            output: default_output(&original, HostPlatform::current()),
            original,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            compiler: String::new(),
            extra_args: Vec::new(),
            flags: CompileFlags::empty(),
            line_map: SourceLineMap::new(),
        }
    }
}

#[derive(Debug)]
enum GeneratedSource {
    Temp(TempPath),
    Fixed(PathBuf),
}

/// Write `text` to a fresh `__XXXXXX.cxir` file in the first directory that accepts it.
fn create_temp_source(dirs: &[&Path], text: &str) -> Result<TempPath, DriverError> {
    let mut last_error = None;
    for dir in dirs {
        let file = tempfile::Builder::new()
            .prefix("__")
            .suffix(CXIR_SUFFIX)
            .rand_bytes(6)
            .tempfile_in(dir);
        let mut file = match file {
            Ok(file) => file,
            Err(e) => {
                warn!("cannot create generated source in {}: {}", dir.display(), e);
                last_error = Some(DriverError::io(*dir, e));
                continue;
            }
        };
        // the file is unlinked when `file` drops on the error path
        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| DriverError::io(file.path(), e))?;
        return Ok(file.into_temp_path());
    }
    Err(last_error.unwrap_or_else(|| {
        DriverError::io(PathBuf::new(), std::io::Error::other("no directory for generated sources"))
    }))
}

fn create_fixed_source(path: &Path, text: &str) -> Result<(), DriverError> {
    std::fs::write(path, text).map_err(|e| {
        let _ = std::fs::remove_file(path);
        DriverError::io(path, e)
    })
}

/// One compilation unit and its generated source.
#[derive(Debug)]
pub struct CompileAction {
    working_dir: PathBuf,
    source: Option<GeneratedSource>,
    source_path: PathBuf,
    output: PathBuf,
    original: PathBuf,
    compiler: String,
    extra_args: Vec<String>,
    flags: CompileFlags,
    line_map: SourceLineMap,
}

impl CompileAction {
    /// Materialize `request` on disk.
    pub fn create(request: ActionRequest) -> Result<Self, DriverError> {
        Self::create_numbered(request, 0)
    }

    pub(crate) fn create_numbered(request: ActionRequest, index: usize) -> Result<Self, DriverError> {
        let ActionRequest {
            generated_source,
            original,
            output,
            working_dir,
            compiler,
            extra_args,
            flags,
            line_map,
        } = request;

        let source = if flags.is_debug() && flags.is_verbose() {
            let path = working_dir.join(debug_source_name(index));
            create_fixed_source(&path, &generated_source)?;
            GeneratedSource::Fixed(path)
        } else {
            let temp_dir = std::env::temp_dir();
            GeneratedSource::Temp(create_temp_source(&[temp_dir.as_path(), working_dir.as_path()], &generated_source)?)
        };
        let source_path = match &source {
            GeneratedSource::Temp(p) => p.to_path_buf(),
            GeneratedSource::Fixed(p) => p.clone(),
        };

        let action = CompileAction {
            working_dir,
            source: Some(source),
            source_path,
            output,
            original,
            compiler,
            extra_args,
            flags,
            line_map,
        };

        if flags.is_verbose() {
            debug!("compile action created:");
            debug!("  working dir:      {}", action.working_dir.display());
            debug!("  generated source: {}", action.source_path.display());
            debug!("  output:           {}", action.output.display());
            debug!("  original:         {}", action.original.display());
            debug!("  compiler:         {:?}", action.compiler);
            debug!("  extra args:       {:?}", action.extra_args);
            debug!("  flags:            {:?}", action.flags);
            debug!("  mapped lines:     {}", action.line_map.len());
        }
        Ok(action)
    }

    /// Remove the generated source. Safe to call any number of times.
    pub fn cleanup(&mut self) {
        let result = match self.source.take() {
            None => return,
            Some(GeneratedSource::Temp(path)) => path.close(),
            Some(GeneratedSource::Fixed(path)) => std::fs::remove_file(path),
        };
        match result {
            Ok(()) => debug!("removed {}", self.source_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("could not remove {}: {}", self.source_path.display(), e),
        }
    }

    /// Whether the generated source is still owned (not yet cleaned up).
    pub fn is_live(&self) -> bool {
        self.source.is_some()
    }

    pub fn generated_path(&self) -> &Path {
        &self.source_path
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn set_compiler(&mut self, compiler: impl Into<String>) {
        self.compiler = compiler.into();
    }

    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    pub fn flags(&self) -> CompileFlags {
        self.flags
    }

    pub fn line_map(&self) -> &SourceLineMap {
        &self.line_map
    }
}

impl Drop for CompileAction {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(usize);

/// Every action of one build, in creation order.
#[derive(Debug, Default)]
pub struct CompileActionRegistry {
    actions: IndexMap<ActionId, CompileAction>,
    next_id: usize,
}

impl CompileActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an action and append it to the build.
    pub fn create_action(&mut self, request: ActionRequest) -> Result<ActionId, DriverError> {
        let action = CompileAction::create_numbered(request, self.next_id)?;
        Ok(self.insert(action))
    }

    pub fn insert(&mut self, action: CompileAction) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.actions.insert(id, action);
        id
    }

    pub fn get(&self, id: ActionId) -> Option<&CompileAction> {
        self.actions.get(&id)
    }

    /// Remove an action, keeping the order of the rest.
    pub fn take(&mut self, id: ActionId) -> Option<CompileAction> {
        self.actions.shift_remove(&id)
    }

    pub fn ids(&self) -> Vec<ActionId> {
        self.actions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &CompileAction)> {
        self.actions.iter().map(|(id, action)| (*id, action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop every action, removing their generated sources.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.next_id = 0;
    }
}
