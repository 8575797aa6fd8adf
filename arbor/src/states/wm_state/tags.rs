use crate::{
    errors::{CommandError, CommandResult},
    states::{wm_state::valid_name, Tag, WMState},
};

impl WMState {
    pub(crate) fn find_tag(&self, name: &str) -> Result<usize, CommandError> {
        self.tag_position(name)
            .ok_or_else(|| CommandError::invalid(format!("Tag \"{}\" not found", name)))
    }

    fn check_tag_name(&self, name: &str) -> CommandResult {
        if !valid_name(name) {
            return Err(CommandError::failed(format!(
                "Invalid tag name \"{}\": must not be empty or a number",
                name
            )));
        }
        if self.tag_position(name).is_some() {
            return Err(CommandError::failed(format!(
                "A tag with the name \"{}\" already exists",
                name
            )));
        }
        Ok(())
    }

    pub(crate) fn add_tag(&mut self, name: &str) -> Result<usize, CommandError> {
        self.check_tag_name(name)?;
        let id = self.new_tag_id();
        self.tags
            .push(Tag::new(id, name, self.settings.default_algorithm()));
        self.hooks.emit(["tag_added", name]);
        Ok(self.tags.len() - 1)
    }

    pub(crate) fn rename_tag(&mut self, index: usize, name: &str) -> CommandResult {
        if self.tags[index].name == name {
            return Ok(());
        }
        self.check_tag_name(name)?;
        let old = std::mem::replace(&mut self.tags[index].name, name.to_string());
        self.hooks.emit(["tag_renamed", &old, name]);
        Ok(())
    }

    /// Give the tag at `index` the position `target`
    pub(crate) fn move_tag(&mut self, index: usize, target: usize) -> CommandResult {
        if target >= self.tags.len() {
            return Err(CommandError::failed(format!(
                "Index {} is out of range",
                target
            )));
        }
        let tag = self.tags.remove(index);
        self.tags.insert(target, tag);
        Ok(())
    }

    /// Remove the tag `src`, its clients move to `dst`. A monitor showing `src` switches to
    /// `dst` if `dst` isn't shown elsewhere.
    pub(crate) fn merge_tag(&mut self, src: usize, dst: usize) -> CommandResult {
        if src == dst {
            return Err(CommandError::failed("Cannot merge a tag into itself"));
        }
        let (src_id, dst_id) = (self.tags[src].id, self.tags[dst].id);
        if let Some(monitor) = self.monitor_of_tag(src_id) {
            if self.monitor_of_tag(dst_id).is_some() {
                return Err(CommandError::failed("Cannot merge the currently viewed tag"));
            }
            self.monitors[monitor].set_tag(dst_id);
        }

        let source = self.tags.remove(src);
        let dst = self.tag_index(dst_id).unwrap_or(0);
        let target = &mut self.tags[dst];
        for win in source.root.clients() {
            target.root.insert_focused(win, false);
        }
        for win in &source.floating_clients {
            target.add_floating(*win, false);
        }
        for client in self.clients.values_mut().filter(|c| c.tag == src_id) {
            client.tag = dst_id;
        }
        for monitor in &mut self.monitors {
            if monitor.prev_tag == src_id {
                monitor.prev_tag = dst_id;
            }
        }
        self.forget_stale_attrs();
        self.hooks
            .emit(["tag_removed", source.name.as_str(), &self.tags[dst].name]);
        Ok(())
    }

    /// Show a tag on a monitor. If another monitor shows it already, the two monitors swap their
    /// tags or that monitor gets the focus, depending on `swap_monitors_to_get_tag`.
    pub(crate) fn use_tag(&mut self, monitor: usize, tag: usize) -> CommandResult {
        let tag_id = self.tags[tag].id;
        if self.monitors[monitor].tag == tag_id {
            self.focus_monitor(monitor);
            return Ok(());
        }
        if self.monitors[monitor].lock_tag {
            return Err(CommandError::failed("monitor is locked"));
        }
        match self.monitor_of_tag(tag_id) {
            Some(other) if self.settings.swap_monitors_to_get_tag => {
                if self.monitors[other].lock_tag {
                    return Err(CommandError::failed(
                        "Cannot swap tags with the other monitor: monitor is locked",
                    ));
                }
                let current = self.monitors[monitor].tag;
                self.monitors[other].set_tag(current);
                self.monitors[monitor].set_tag(tag_id);
                self.focus_monitor(monitor);
            }
            Some(other) => self.focus_monitor(other),
            None => {
                self.monitors[monitor].set_tag(tag_id);
                self.focus_monitor(monitor);
            }
        }
        Ok(())
    }

    /// `index` is either absolute or, with a leading sign, relative to the focused tag
    pub(crate) fn use_index(&mut self, index: &str, skip_visible: bool) -> CommandResult {
        let target = self.tag_index_arg(index, skip_visible)?;
        self.use_tag(self.focused_monitor, target)
    }

    /// Resolve an index argument as taken by `use_index` and `move_index`
    pub(crate) fn tag_index_arg(
        &self,
        index: &str,
        skip_visible: bool,
    ) -> Result<usize, CommandError> {
        let invalid = || CommandError::failed(format!("Invalid index \"{}\"", index));
        let len = self.tags.len() as i64;
        if index.starts_with('+') || index.starts_with('-') {
            let delta = index.parse::<i64>().map_err(|_| invalid())?;
            let current = self.focused_tag_index() as i64;
            let mut target = (current + delta).rem_euclid(len);
            if skip_visible && delta != 0 {
                let step = delta.signum();
                for _ in 0..len {
                    let id = self.tags[target as usize].id;
                    match self.monitor_of_tag(id) {
                        Some(m) if m != self.focused_monitor => {
                            target = (target + step).rem_euclid(len)
                        }
                        _ => break,
                    }
                }
            }
            return Ok(target as usize);
        }
        let target = index.parse::<usize>().map_err(|_| invalid())?;
        if target >= self.tags.len() {
            return Err(CommandError::invalid(format!(
                "Index {} is out of range",
                target
            )));
        }
        Ok(target)
    }

    pub(crate) fn use_previous(&mut self) -> CommandResult {
        let monitor = self.focused_monitor;
        let previous = self.monitors[monitor].prev_tag;
        let tag = self
            .tag_index(previous)
            .ok_or_else(|| CommandError::failed("No previous tag"))?;
        self.use_tag(monitor, tag)
    }
}
