use crate::{
    errors::{CommandError, CommandResult},
    rect::Rect,
    states::{mon_state::MIN_SIZE, wm_state::dedup_rects, Monitor, WMState},
};

fn check_size(rect: &Rect) -> CommandResult {
    if rect.width < MIN_SIZE || rect.height < MIN_SIZE {
        return Err(CommandError::failed(format!(
            "Rectangle {} is too small, monitors need at least {}x{}",
            rect, MIN_SIZE, MIN_SIZE
        )));
    }
    Ok(())
}

impl WMState {
    /// Look up a monitor by index, name or relative to the focused one (`+1`, `-1`). The empty
    /// string is the focused monitor.
    pub(crate) fn find_monitor(&self, reference: &str) -> Result<usize, CommandError> {
        let not_found = || CommandError::forbidden(format!("Monitor \"{}\" not found", reference));
        if reference.is_empty() {
            return Ok(self.focused_monitor);
        }
        let len = self.monitors.len() as i64;
        if reference.starts_with('+') || reference.starts_with('-') {
            if let Ok(delta) = reference.parse::<i64>() {
                return Ok((self.focused_monitor as i64 + delta).rem_euclid(len) as usize);
            }
        }
        if let Ok(index) = reference.parse::<usize>() {
            return if index < self.monitors.len() {
                Ok(index)
            } else {
                Err(not_found())
            };
        }
        self.monitors
            .iter()
            .position(|m| m.name == reference)
            .ok_or_else(not_found)
    }

    fn check_monitor_name(&self, name: &str, except: Option<usize>) -> CommandResult {
        if name.is_empty() {
            return Ok(());
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CommandError::failed(format!(
                "Invalid monitor name \"{}\": it must not start with a digit",
                name
            )));
        }
        let taken = self
            .monitors
            .iter()
            .enumerate()
            .any(|(i, m)| Some(i) != except && m.name == name);
        if taken {
            return Err(CommandError::failed(format!(
                "A monitor with the name \"{}\" already exists",
                name
            )));
        }
        Ok(())
    }

    fn free_tag(&self) -> Option<usize> {
        self.tags
            .iter()
            .position(|t| self.monitor_of_tag(t.id).is_none())
    }

    pub(crate) fn add_monitor(
        &mut self,
        rect: Rect,
        tag: Option<usize>,
        name: Option<&str>,
    ) -> CommandResult {
        check_size(&rect)?;
        let name = name.unwrap_or_default();
        self.check_monitor_name(name, None)?;
        let tag = match tag {
            Some(tag) if self.monitor_of_tag(self.tags[tag].id).is_some() => {
                return Err(CommandError::new(
                    common::ExitCode::TagInUse,
                    format!("Tag \"{}\" is already shown on a monitor", self.tags[tag].name),
                ));
            }
            Some(tag) => tag,
            None => self
                .free_tag()
                .ok_or_else(|| CommandError::failed("There are not enough free tags"))?,
        };
        let id = self.new_monitor_id();
        let mut monitor = Monitor::new(id, rect, self.tags[tag].id);
        monitor.name = name.to_string();
        log::info!("adding monitor {} at {}", self.monitors.len(), rect);
        self.monitors.push(monitor);
        self.monitor_history.push(id);
        self.update_panel_padding();
        Ok(())
    }

    pub(crate) fn remove_monitor(&mut self, index: usize) -> CommandResult {
        if self.monitors.len() <= 1 {
            return Err(CommandError::failed("Can't remove the last monitor"));
        }
        let removed = self.monitors.remove(index);
        self.monitor_history.retain(|m| *m != removed.id);
        if self.focused_monitor > index || self.focused_monitor >= self.monitors.len() {
            self.focused_monitor = self.focused_monitor.saturating_sub(1);
        }
        self.forget_stale_attrs();
        self.update_panel_padding();
        Ok(())
    }

    /// Give the first monitors the rectangles, adding and removing monitors as needed
    pub(crate) fn set_monitors(&mut self, rects: Vec<Rect>) -> CommandResult {
        if rects.is_empty() {
            return Err(CommandError::need_more_args());
        }
        for rect in &rects {
            check_size(rect)?;
        }
        let missing = rects.len().saturating_sub(self.monitors.len());
        let free = self
            .tags
            .iter()
            .filter(|t| self.monitor_of_tag(t.id).is_none())
            .count();
        if missing > free {
            return Err(CommandError::failed("There are not enough free tags"));
        }
        for (monitor, rect) in self.monitors.iter_mut().zip(&rects) {
            monitor.rect = *rect;
        }
        for rect in rects.iter().skip(self.monitors.len()) {
            self.add_monitor(*rect, None, None)?;
        }
        while self.monitors.len() > rects.len() {
            self.remove_monitor(self.monitors.len() - 1)?;
        }
        self.update_panel_padding();
        Ok(())
    }

    /// The screens the display server knows of, without duplicates
    pub(crate) fn detected_screens(&self) -> Vec<Rect> {
        dedup_rects(self.display.screen_rects())
    }

    pub(crate) fn detect_monitors(&mut self) -> CommandResult {
        let screens = self.detected_screens();
        log::info!("detected {} screens", screens.len());
        self.set_monitors(screens)
    }

    pub(crate) fn set_monitor_rect(&mut self, index: usize, rect: Rect) -> CommandResult {
        check_size(&rect)?;
        self.monitors[index].rect = rect;
        self.update_panel_padding();
        Ok(())
    }

    pub(crate) fn rename_monitor(&mut self, index: usize, name: &str) -> CommandResult {
        self.check_monitor_name(name, Some(index))?;
        self.monitors[index].name = name.to_string();
        Ok(())
    }

    pub(crate) fn cycle_monitor(&mut self, delta: i64) {
        let len = self.monitors.len() as i64;
        let next = (self.focused_monitor as i64 + delta).rem_euclid(len) as usize;
        self.focus_monitor(next);
    }

    /// Layout is not applied while monitors are locked
    pub(crate) fn lock(&mut self) {
        self.settings.monitors_locked = self.settings.monitors_locked.saturating_add(1);
    }

    pub(crate) fn unlock(&mut self) {
        self.settings.monitors_locked = self.settings.monitors_locked.saturating_sub(1);
    }
}
