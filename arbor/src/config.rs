use std::path::{Path, PathBuf};

use structopt::StructOpt;

/// Used when the user has no autostart of their own
const SYSTEM_AUTOSTART: &str = "/etc/xdg/arbor/autostart";

#[derive(StructOpt, Debug, Default)]
#[structopt(name = "arbor", about = "A manual tiling window manager")]
pub(crate) struct Config {
    /// The program run on startup and on `reload`. Defaults to `~/.config/arbor/autostart`
    #[structopt(short = "c", long, parse(from_os_str))]
    pub(crate) autostart: Option<PathBuf>,
    /// Log debug messages and every command
    #[structopt(short, long)]
    pub(crate) verbose: bool,
    /// Don't create tags from the desktop names a previous window manager left behind
    #[structopt(long)]
    pub(crate) no_tag_import: bool,
    /// Start with the monitors locked, the autostart is expected to `unlock` them
    #[structopt(short, long)]
    pub(crate) locked: bool,
}

impl Config {
    /// The autostart to run: the one given, the user's or the system wide one
    pub(crate) fn autostart_path(&self) -> PathBuf {
        if let Some(path) = &self.autostart {
            return path.clone();
        }
        let user = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("arbor")
            .join("autostart");
        if user.exists() || !Path::new(SYSTEM_AUTOSTART).exists() {
            user
        } else {
            PathBuf::from(SYSTEM_AUTOSTART)
        }
    }

    /// Log specification for flexi_logger, `RUST_LOG` takes precedence
    pub(crate) fn log_spec(&self) -> &'static str {
        if self.verbose {
            "arbor=debug"
        } else {
            "arbor=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_autostart_wins() {
        let config = Config::from_iter(&["arbor", "--autostart", "/tmp/auto", "-v"]);
        assert_eq!(config.autostart_path(), PathBuf::from("/tmp/auto"));
        assert_eq!(config.log_spec(), "arbor=debug");
        assert!(!config.locked);
    }

    #[test]
    fn default_autostart_is_named_autostart() {
        let config = Config::default();
        assert!(config.autostart_path().ends_with("autostart"));
        assert_eq!(config.log_spec(), "arbor=info");
    }
}
