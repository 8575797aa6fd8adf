//! Hooks for the idle clients and the attribute watchers behind `watch`.
//!
//! Hooks are queued here while commands and events are handled. The main loop drains the queue
//! and sends every hook to each connection waiting in idle mode.

/// Hooks waiting to be sent to the idle clients, plus the attributes being watched
#[derive(Debug, Default)]
pub(crate) struct Hooks {
    pending: Vec<Vec<String>>,
    /// Watched attribute paths with the value they had when last checked
    watchers: Vec<(String, Option<String>)>,
}

impl Hooks {
    pub(crate) fn emit<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hook = args.into_iter().map(Into::into).collect::<Vec<String>>();
        log::debug!("hook: {}", hook.join(" "));
        self.pending.push(hook);
    }

    pub(crate) fn take(&mut self) -> Vec<Vec<String>> {
        std::mem::take(&mut self.pending)
    }

    /// Returns false if `path` is watched already
    pub(crate) fn watch(&mut self, path: &str, current: Option<String>) -> bool {
        if self.watchers.iter().any(|(p, _)| p == path) {
            return false;
        }
        self.watchers.push((path.to_string(), current));
        true
    }

    pub(crate) fn watched_paths(&self) -> Vec<String> {
        self.watchers.iter().map(|(p, _)| p.clone()).collect()
    }

    /// Store the new value of a watched attribute, `attribute_changed` is emitted if it differs
    pub(crate) fn update_watched(&mut self, path: &str, value: Option<String>) {
        let changed = match self.watchers.iter_mut().find(|(p, _)| p == path) {
            Some((_, old)) if *old != value => std::mem::replace(old, value.clone()),
            _ => return,
        };
        self.emit([
            "attribute_changed".to_string(),
            path.to_string(),
            changed.unwrap_or_default(),
            value.unwrap_or_default(),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchers_fire_on_change_only() {
        let mut hooks = Hooks::default();
        assert!(hooks.watch("tags.count", Some("1".into())));
        assert!(!hooks.watch("tags.count", Some("1".into())));
        hooks.update_watched("tags.count", Some("1".into()));
        assert!(hooks.take().is_empty());
        hooks.update_watched("tags.count", Some("2".into()));
        assert_eq!(hooks.take(), vec![vec!["attribute_changed", "tags.count", "1", "2"]]);
    }
}
