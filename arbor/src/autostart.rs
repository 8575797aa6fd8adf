//! The autostart program and other children spawned by the manager

use std::{
    path::{Path, PathBuf},
    process::{Child, Command},
};

use anyhow::Context;

use crate::object::{AttrSpec, AttrType, Value};

#[derive(Debug)]
pub(crate) struct Autostart {
    pub(crate) path: PathBuf,
    child: Option<Child>,
    pub(crate) last_status: i64,
}

impl Autostart {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            child: None,
            last_status: 0,
        }
    }

    /// Run the autostart file, a still running previous run is handed back
    pub(crate) fn start(&mut self) -> anyhow::Result<Option<Child>> {
        let child = Command::new(&self.path)
            .spawn()
            .with_context(|| format!("Failed to run the autostart file {:?}", self.path))?;
        log::info!("started {:?} with pid {}", self.path, child.id());
        Ok(self.child.replace(child))
    }

    pub(crate) fn running(&self) -> bool {
        self.child.is_some()
    }

    pub(crate) fn pid(&self) -> i64 {
        self.child.as_ref().map(|c| c.id() as i64).unwrap_or(-1)
    }

    /// Notice an exited autostart. Stopped and continued processes still count as running.
    pub(crate) fn reap(&mut self) {
        let status = match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => status,
            Some(Err(e)) => {
                log::warn!("failed to wait for the autostart: {}", e);
                return;
            }
            _ => return,
        };
        self.last_status = status.code().map(i64::from).unwrap_or(-1);
        log::info!("autostart exited with status {}", self.last_status);
        self.child = None;
    }

    pub(crate) const SPECS: &'static [AttrSpec] = &[
        AttrSpec::ro("path", AttrType::String, "Path of the autostart file"),
        AttrSpec::ro("pid", AttrType::Int, "Process id of the running autostart, -1 otherwise"),
        AttrSpec::ro("running", AttrType::Bool, "Whether the autostart process is still running"),
        AttrSpec::ro("last_status", AttrType::Int, "The exit status of the last run"),
    ];

    pub(crate) fn get(&self, name: &str) -> Option<Value> {
        Some(match name {
            "path" => Value::Str(self.path.display().to_string()),
            "pid" => Value::Int(self.pid()),
            "running" => Value::Bool(self.running()),
            "last_status" => Value::Int(self.last_status),
            _ => return None,
        })
    }
}

/// Children started with `spawn`, kept around until they exit so they don't become zombies
#[derive(Debug, Default)]
pub(crate) struct Children {
    children: Vec<Child>,
}

impl Children {
    pub(crate) fn spawn(&mut self, program: &Path, args: &[String]) -> anyhow::Result<u32> {
        let child = Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("Failed to spawn {:?}", program))?;
        let pid = child.id();
        self.children.push(child);
        Ok(pid)
    }

    pub(crate) fn adopt(&mut self, child: Child) {
        self.children.push(child);
    }

    pub(crate) fn reap(&mut self) {
        self.children
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_)) | Err(_)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_is_recorded() {
        let mut autostart = Autostart::new(PathBuf::from("/bin/false"));
        assert_eq!(autostart.pid(), -1);
        autostart.start().unwrap();
        assert!(autostart.running());
        while autostart.running() {
            autostart.reap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(autostart.last_status, 1);
        assert_eq!(autostart.get("running"), Some(Value::Bool(false)));
    }

    #[test]
    fn missing_files_fail() {
        let mut autostart = Autostart::new(PathBuf::from("/nonexistent/autostart"));
        assert!(autostart.start().is_err());
        assert!(!autostart.running());
    }
}
