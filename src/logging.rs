//! Logger initialization.

use std::io::Write;

use log::LevelFilter;

/// Installs `env_logger` with `YYYY-MM-DD HH:MM:SS [LEVEL] message` lines.
///
/// `RUST_LOG` is read first; `level` overrides it for this crate's output.
/// Uses `try_init` so calling it twice (e.g. from tests) is harmless.
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });
    builder.try_init()
}
