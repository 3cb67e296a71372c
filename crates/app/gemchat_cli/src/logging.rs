use flexi_logger::Logger;

use crate::Error;

/// Log to stderr, filtered by `RUST_LOG` (default `info`). Stdout carries the chat.
pub fn init() -> Result<(), Error> {
    Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .log_to_stderr()
        .start()?;

    Ok(())
}
