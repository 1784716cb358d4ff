//! Logging setup for the driver binary.

use std::io::Write;

use log::LevelFilter;

/// Level for the given switches: `--verbose` shows debug traces, `--quiet` only errors.
pub fn level_for(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (true, _) => LevelFilter::Debug,
        (false, true) => LevelFilter::Error,
        (false, false) => LevelFilter::Info,
    }
}

/// Install the global logger. `RUST_LOG` overrides the switches.
pub fn init(verbose: bool, quiet: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(level_for(verbose, quiet))
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            let level = record.level().to_string().to_lowercase();
            writeln!(buf, "[{}] {}", level, record.args())
        })
        .try_init();
}
