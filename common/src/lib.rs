//! Pieces shared between the window manager and `arborc`: the wire format, exit codes and
//! the location of the socket.
mod errors;
mod exit_code;
mod message;

use std::{env, path::PathBuf};

pub use errors::ProtocolError;
pub use exit_code::ExitCode;
pub use message::*;

/// Environment variable that overrides the socket location
pub const SOCKET_ENV: &str = "ARBOR_SOCKET";

/// The socket the window manager listens on for the current display
pub fn socket_path() -> PathBuf {
    if let Some(path) = env::var_os(SOCKET_ENV) {
        return PathBuf::from(path);
    }
    let display = env::var("DISPLAY")
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let dir = env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    dir.join(format!("arbor-{}.sock", display))
}
