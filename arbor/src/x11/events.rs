use x11rb::{
    connection::Connection,
    errors::{ReplyError, ReplyOrIdError},
    protocol::{xproto::*, Event},
    CURRENT_TIME, NONE,
};

use super::X11Display;
use crate::display::DisplayEvent;

/// `UrgencyHint` in the flags of `WM_HINTS`
const URGENCY_HINT: u32 = 1 << 8;
/// `PMinSize` and `PMaxSize` in the flags of `WM_NORMAL_HINTS`
const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;

/// Motion events closer together than this (in ms) are dropped, a drag doesn't need more
/// than about 144 updates per second
const MOTION_INTERVAL: u32 = 1000 / 144;

pub(super) fn urgency_hint(hints: &[u32]) -> bool {
    hints.first().map_or(false, |flags| flags & URGENCY_HINT != 0)
}

/// Whether `WM_NORMAL_HINTS` pin the window to one size
pub(super) fn fixed_size(hints: &[u32]) -> bool {
    let flags = match hints.first() {
        Some(flags) => *flags,
        None => return false,
    };
    if flags & P_MIN_SIZE == 0 || flags & P_MAX_SIZE == 0 || hints.len() < 9 {
        return false;
    }
    let (min, max) = ((hints[5], hints[6]), (hints[7], hints[8]));
    min == max && min.0 > 0 && min.1 > 0
}

/// Translates between keycodes and keysyms, only the unshifted column is looked at
#[derive(Debug, Default)]
pub(super) struct KeyMap {
    min_keycode: Keycode,
    per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl KeyMap {
    pub(super) fn load(conn: &impl Connection) -> Result<Self, ReplyError> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;
        let mapping = conn.get_keyboard_mapping(min_keycode, count)?.reply()?;
        Ok(Self {
            min_keycode,
            per_keycode: mapping.keysyms_per_keycode as usize,
            keysyms: mapping.keysyms,
        })
    }

    pub(super) fn keysym(&self, keycode: Keycode) -> Keysym {
        if keycode < self.min_keycode || self.per_keycode == 0 {
            return 0;
        }
        let index = (keycode - self.min_keycode) as usize * self.per_keycode;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    pub(super) fn keycodes(&self, keysym: Keysym) -> Vec<Keycode> {
        if self.per_keycode == 0 {
            return Vec::new();
        }
        self.keysyms
            .chunks(self.per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .map(|(i, _)| self.min_keycode + i as Keycode)
            .collect()
    }
}

/// `_NET_WM_STATE` actions: remove, add, toggle
fn net_wm_state_action(action: u32) -> Option<Option<bool>> {
    match action {
        0 => Some(Some(false)),
        1 => Some(Some(true)),
        2 => Some(None),
        _ => None,
    }
}

impl X11Display {
    /// What, if anything, the window manager should hear about an X event
    pub(super) fn translate(
        &mut self,
        event: Event,
    ) -> Result<Option<DisplayEvent>, ReplyOrIdError> {
        let event = match event {
            Event::MapRequest(e) => {
                if self.known.contains(&e.window) {
                    // already managed, it's ours to decide when it's visible
                    return Ok(None);
                }
                self.watch(e.window)?;
                self.window_info(e.window)?.map(|info| {
                    self.known.insert(e.window);
                    DisplayEvent::MapRequest(info)
                })
            }
            Event::UnmapNotify(e) if e.event == self.root => {
                if let Some(pending) = self.pending_unmaps.get_mut(&e.window) {
                    if *pending > 0 {
                        *pending -= 1;
                        return Ok(None);
                    }
                }
                self.withdraw(e.window)
            }
            Event::DestroyNotify(e) => self.withdraw(e.window),
            Event::ConfigureRequest(e) => {
                let current = self.conn.get_geometry(e.window)?.reply()?;
                let mask = u16::from(e.value_mask);
                let pick = |flag: ConfigWindow, requested: i32, current: i32| {
                    if mask & u16::from(flag) != 0 {
                        requested
                    } else {
                        current
                    }
                };
                let rect = crate::rect::Rect::new(
                    pick(ConfigWindow::X, e.x as i32, current.x as i32),
                    pick(ConfigWindow::Y, e.y as i32, current.y as i32),
                    pick(ConfigWindow::WIDTH, e.width as i32, current.width as i32),
                    pick(ConfigWindow::HEIGHT, e.height as i32, current.height as i32),
                );
                Some(DisplayEvent::ConfigureRequest { id: e.window, rect })
            }
            Event::KeyPress(e) => Some(DisplayEvent::KeyPress {
                mods: u16::from(e.state),
                keysym: self.keymap.keysym(e.detail),
            }),
            Event::KeyRelease(e) => Some(DisplayEvent::KeyRelease {
                mods: u16::from(e.state),
                keysym: self.keymap.keysym(e.detail),
            }),
            Event::ButtonPress(e) => {
                let (x, y) = (e.root_x as i32, e.root_y as i32);
                if let Some(frame) = self.frame_windows.get(&e.event) {
                    Some(DisplayEvent::FrameClicked { frame: *frame, x, y })
                } else {
                    let id = if e.event == self.root {
                        e.child
                    } else {
                        // the click-to-focus grab of a client, it gets the click as well
                        self.conn.allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
                        e.event
                    };
                    if id == NONE {
                        None
                    } else {
                        Some(DisplayEvent::ButtonPress {
                            id,
                            mods: u16::from(e.state),
                            button: e.detail,
                            x,
                            y,
                        })
                    }
                }
            }
            Event::ButtonRelease(e) => Some(DisplayEvent::ButtonRelease { button: e.detail }),
            Event::MotionNotify(e) => {
                if e.time.wrapping_sub(self.last_motion) < MOTION_INTERVAL {
                    return Ok(None);
                }
                self.last_motion = e.time;
                Some(DisplayEvent::Motion {
                    x: e.root_x as i32,
                    y: e.root_y as i32,
                })
            }
            Event::EnterNotify(e) => {
                if e.mode == NotifyMode::NORMAL && self.known.contains(&e.event) {
                    Some(DisplayEvent::Enter { id: e.event })
                } else {
                    None
                }
            }
            Event::Expose(e) if e.count == 0 => {
                if let Some(id) = self.frame_windows.get(&e.window) {
                    if let Some((win, look)) = self.frames.get(id) {
                        self.draw_frame(*win, look)?;
                    }
                }
                None
            }
            Event::PropertyNotify(e) if self.known.contains(&e.window) => {
                let id = e.window;
                if e.atom == u32::from(AtomEnum::WM_NAME) || e.atom == self.atoms._NET_WM_NAME {
                    Some(DisplayEvent::TitleChanged {
                        id,
                        title: self.title(id)?,
                    })
                } else if e.atom == u32::from(AtomEnum::WM_HINTS) {
                    Some(DisplayEvent::UrgencyChanged {
                        id,
                        urgent: self.urgent(id)?,
                    })
                } else if e.atom == self.atoms._NET_WM_STRUT
                    || e.atom == self.atoms._NET_WM_STRUT_PARTIAL
                {
                    Some(DisplayEvent::StrutChanged {
                        id,
                        strut: self.strut(id)?,
                    })
                } else {
                    None
                }
            }
            Event::ClientMessage(e) => self.client_message(&e),
            Event::MappingNotify(e) => {
                if e.request == Mapping::KEYBOARD {
                    self.keymap = KeyMap::load(&self.conn)?;
                    self.grab_keys()?;
                }
                None
            }
            Event::RandrScreenChangeNotify(_) => Some(DisplayEvent::ScreensChanged),
            Event::Error(e) => {
                log::debug!("X error: {:?}", e);
                None
            }
            _ => None,
        };
        Ok(event)
    }

    fn withdraw(&mut self, win: Window) -> Option<DisplayEvent> {
        self.pending_unmaps.remove(&win);
        if self.known.remove(&win) {
            Some(DisplayEvent::Unmanage(win))
        } else {
            None
        }
    }

    fn client_message(&self, e: &ClientMessageEvent) -> Option<DisplayEvent> {
        let data = e.data.as_data32();
        let atoms = &self.atoms;
        if e.type_ == atoms._NET_WM_STATE {
            let fullscreen = atoms._NET_WM_STATE_FULLSCREEN;
            if data[1] != fullscreen && data[2] != fullscreen {
                return None;
            }
            net_wm_state_action(data[0])
                .map(|state| DisplayEvent::FullscreenRequest { id: e.window, state })
        } else if e.type_ == atoms._NET_ACTIVE_WINDOW {
            Some(DisplayEvent::ActivateRequest(e.window))
        } else if e.type_ == atoms._NET_CLOSE_WINDOW {
            Some(DisplayEvent::CloseRequest(e.window))
        } else if e.type_ == atoms._NET_WM_DESKTOP {
            Some(DisplayEvent::DesktopRequest {
                id: e.window,
                desktop: data[0],
            })
        } else if e.type_ == atoms._NET_CURRENT_DESKTOP {
            Some(DisplayEvent::CurrentDesktopRequest(data[0]))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keymap() -> KeyMap {
        // two keysyms per keycode starting at 8: a/A, b/B, a/A
        KeyMap {
            min_keycode: 8,
            per_keycode: 2,
            keysyms: vec![0x61, 0x41, 0x62, 0x42, 0x61, 0x41],
        }
    }

    #[test]
    fn keymap_looks_up_both_ways() {
        let map = keymap();
        assert_eq!(map.keysym(9), 0x62);
        assert_eq!(map.keysym(3), 0);
        assert_eq!(map.keysym(100), 0);
        assert_eq!(map.keycodes(0x61), vec![8, 10]);
        // shifted symbols are not searched
        assert!(map.keycodes(0x41).is_empty());
    }

    #[test]
    fn size_hints() {
        let flags = P_MIN_SIZE | P_MAX_SIZE;
        assert!(fixed_size(&[flags, 0, 0, 0, 0, 200, 100, 200, 100]));
        assert!(!fixed_size(&[flags, 0, 0, 0, 0, 200, 100, 300, 100]));
        assert!(!fixed_size(&[P_MIN_SIZE, 0, 0, 0, 0, 200, 100, 200, 100]));
        assert!(!fixed_size(&[]));
    }

    #[test]
    fn urgency() {
        assert!(urgency_hint(&[URGENCY_HINT | 1]));
        assert!(!urgency_hint(&[1]));
        assert!(!urgency_hint(&[]));
    }

    #[test]
    fn state_actions() {
        assert_eq!(net_wm_state_action(0), Some(Some(false)));
        assert_eq!(net_wm_state_action(2), Some(None));
        assert_eq!(net_wm_state_action(7), None);
    }
}
