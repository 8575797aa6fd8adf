use crate::{
    newtypes::{MonitorId, TagId, WinId},
    object::{AttrSpec, AttrType},
    rect::Rect,
};

/// Monitors smaller than this in any direction are rejected
pub(crate) const MIN_SIZE: i32 = 32;

#[derive(Debug, Clone)]
pub(crate) struct Monitor {
    pub(crate) id: MonitorId,
    pub(crate) name: String,
    pub(crate) rect: Rect,
    /// Padding set by the user: up, right, down, left
    pub(crate) pad: [i32; 4],
    /// Padding demanded by panels
    pub(crate) pad_automatic: [i32; 4],
    pub(crate) lock_tag: bool,
    pub(crate) tag: TagId,
    pub(crate) prev_tag: TagId,
}

impl Monitor {
    pub(crate) fn new(id: MonitorId, rect: Rect, tag: TagId) -> Self {
        Self {
            id,
            name: String::new(),
            rect,
            pad: [0; 4],
            pad_automatic: [0; 4],
            lock_tag: false,
            tag,
            prev_tag: tag,
        }
    }

    pub(crate) fn effective_pad(&self) -> [i32; 4] {
        let mut pad = self.pad;
        for (p, auto) in pad.iter_mut().zip(self.pad_automatic) {
            *p = (*p).max(auto);
        }
        pad
    }

    /// The monitor rectangle without its padding, tiled clients live in here
    pub(crate) fn usable_area(&self) -> Rect {
        self.rect.pad(self.effective_pad())
    }

    pub(crate) fn set_tag(&mut self, tag: TagId) {
        if self.tag != tag {
            self.prev_tag = self.tag;
            self.tag = tag;
        }
    }

    pub(crate) const SPECS: &'static [AttrSpec] = &[
        AttrSpec::ro("index", AttrType::Uint, "Index of the monitor"),
        AttrSpec::rw("name", AttrType::String, "Name of the monitor, may be empty"),
        AttrSpec::rw("tag", AttrType::String, "The tag shown on this monitor"),
        AttrSpec::rw("geometry", AttrType::Rect, "Area of the monitor, including the padding"),
        AttrSpec::ro("content_geometry", AttrType::Rect, "Area of the monitor without the padding"),
        AttrSpec::rw("pad_up", AttrType::Uint, "Space reserved at the top"),
        AttrSpec::rw("pad_right", AttrType::Uint, "Space reserved at the right"),
        AttrSpec::rw("pad_down", AttrType::Uint, "Space reserved at the bottom"),
        AttrSpec::rw("pad_left", AttrType::Uint, "Space reserved at the left"),
        AttrSpec::rw("lock_tag", AttrType::Bool, "Whether switching the tag is forbidden"),
    ];
}

pub(crate) const PAD_NAMES: [&str; 4] = ["pad_up", "pad_right", "pad_down", "pad_left"];

/// A dock window, it is never managed but reserves space on the monitors it touches
#[derive(Debug, Clone)]
pub(crate) struct Panel {
    pub(crate) win: WinId,
    pub(crate) rect: Rect,
    /// left, right, top, bottom as in `_NET_WM_STRUT`
    pub(crate) strut: Option<[i32; 4]>,
}

impl Panel {
    /// The padding (up, right, down, left) this panel demands from a monitor
    pub(crate) fn padding_for(&self, monitor: &Rect, screen: &Rect) -> [i32; 4] {
        if let Some([left, right, top, bottom]) = self.strut {
            // struts are relative to the edges of the whole screen
            let area = screen;
            let reserved = [
                Rect::new(area.x, area.y, area.width, top),
                Rect::new(area.x + area.width - right, area.y, right, area.height),
                Rect::new(area.x, area.y + area.height - bottom, area.width, bottom),
                Rect::new(area.x, area.y, left, area.height),
            ];
            let mut pad = [0; 4];
            for (side, rect) in reserved.iter().enumerate() {
                if let Some(cut) = rect.intersection(monitor) {
                    pad[side] = if side % 2 == 0 { cut.height } else { cut.width };
                }
            }
            return pad;
        }
        // without a strut the panel reserves the edge it's closest to
        let cut = match self.rect.intersection(monitor) {
            Some(cut) => cut,
            None => return [0; 4],
        };
        if cut.width >= cut.height {
            if cut.y - monitor.y <= monitor.y + monitor.height - (cut.y + cut.height) {
                [cut.y + cut.height - monitor.y, 0, 0, 0]
            } else {
                [0, 0, monitor.y + monitor.height - cut.y, 0]
            }
        } else if cut.x - monitor.x <= monitor.x + monitor.width - (cut.x + cut.width) {
            [0, 0, 0, cut.x + cut.width - monitor.x]
        } else {
            [0, monitor.x + monitor.width - cut.x, 0, 0]
        }
    }

    pub(crate) const SPECS: &'static [AttrSpec] = &[
        AttrSpec::ro("winid", AttrType::WinId, "The window id of the panel"),
        AttrSpec::ro("geometry", AttrType::Rect, "The geometry of the panel window"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_from_struts() {
        let screen = Rect::new(0, 0, 3840, 1080);
        let left = Rect::new(0, 0, 1920, 1080);
        let right = Rect::new(1920, 0, 1920, 1080);
        let panel = Panel {
            win: 1,
            rect: Rect::new(0, 0, 1920, 20),
            strut: Some([0, 0, 20, 0]),
        };
        assert_eq!(panel.padding_for(&left, &screen), [20, 0, 0, 0]);
        assert_eq!(panel.padding_for(&right, &screen), [20, 0, 0, 0]);

        let bar = Panel {
            win: 2,
            rect: Rect::new(1920, 1060, 1920, 20),
            strut: None,
        };
        assert_eq!(bar.padding_for(&left, &screen), [0; 4]);
        assert_eq!(bar.padding_for(&right, &screen), [0, 0, 20, 0]);
    }

    #[test]
    fn usable_area_uses_the_larger_pad() {
        let mut monitor = Monitor::new(MonitorId(0), Rect::new(0, 0, 800, 600), TagId(0));
        monitor.pad = [10, 0, 0, 5];
        monitor.pad_automatic = [20, 0, 0, 0];
        assert_eq!(monitor.usable_area(), Rect::new(5, 20, 795, 580));
    }
}
