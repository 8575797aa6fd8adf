//! The X11 side of [`DisplayServer`], built on x11rb's `RustConnection`

mod atoms;
mod events;

use std::{
    collections::{HashMap, HashSet},
    os::unix::io::{AsRawFd, RawFd},
};

use anyhow::{bail, Context};
use x11rb::{
    connection::Connection,
    cursor::Handle as CursorHandle,
    errors::{ReplyError, ReplyOrIdError},
    protocol::{
        randr::{self, ConnectionExt as _},
        xproto::*,
        ErrorKind,
    },
    resource_manager,
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE,
};

use self::{atoms::Atoms, events::KeyMap};
use crate::{
    color::Color,
    display::{DisplayAction, DisplayEvent, DisplayServer, FrameLook, StackItem, WindowInfo},
    keys::KeyCombo,
    mouse::MouseCombo,
    newtypes::FrameId,
    rect::Rect,
};

/// Num lock and caps lock must not keep bindings from working
fn lock_variants() -> [ModMask; 4] {
    [
        ModMask::from(0u16),
        ModMask::LOCK,
        ModMask::M2,
        ModMask::LOCK | ModMask::M2,
    ]
}

fn try_become_wm(conn: &RustConnection, screen: &Screen) -> Result<(), ReplyError> {
    let change = ChangeWindowAttributesAux::default().event_mask(
        EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE,
    );

    conn.change_window_attributes(screen.root, &change)?.check()
}

struct Cursors {
    normal: Cursor,
    drag: Cursor,
}

pub(crate) struct X11Display {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    atoms: Atoms,
    keymap: KeyMap,
    gc: Gcontext,
    /// The window `_NET_SUPPORTING_WM_CHECK` points to
    check_window: Window,
    cursors: Cursors,
    frames: HashMap<FrameId, (Window, FrameLook)>,
    frame_windows: HashMap<Window, FrameId>,
    /// Clients and panels, their withdrawal is reported
    known: HashSet<Window>,
    /// Unmaps we caused ourselves
    pending_unmaps: HashMap<Window, u32>,
    /// Kept for regrabbing when the keyboard mapping changes
    key_grabs: Vec<KeyCombo>,
    desktop_names: Vec<String>,
    events: Vec<DisplayEvent>,
    last_motion: Timestamp,
}

impl X11Display {
    /// Connect to the display given by `$DISPLAY` and take over window management on it
    pub(crate) fn connect() -> anyhow::Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to the X server")?;
        let screen = conn.setup().roots[screen_num].clone();

        if let Err(err) = try_become_wm(&conn, &screen) {
            if let ReplyError::X11Error(error) = &err {
                if error.error_kind == ErrorKind::Access {
                    bail!("Another window manager is already running.");
                }
            }
            return Err(err).context("Failed to select the events of the root window");
        }

        let atoms = Atoms::new(&conn)?.reply()?;
        let keymap = KeyMap::load(&conn)?;
        let root = screen.root;

        match conn.randr_query_version(1, 5)?.reply() {
            Ok(_) => {
                conn.randr_select_input(root, randr::NotifyMask::SCREEN_CHANGE)?;
            }
            Err(e) => log::warn!("randr is not available: {}", e),
        }

        let gc = conn.generate_id()?;
        conn.create_gc(gc, root, &CreateGCAux::new())?;

        let check_window = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        for win in [root, check_window] {
            conn.change_property32(
                PropMode::REPLACE,
                win,
                atoms._NET_SUPPORTING_WM_CHECK,
                AtomEnum::WINDOW,
                &[check_window],
            )?;
        }
        conn.change_property8(
            PropMode::REPLACE,
            check_window,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            env!("CARGO_PKG_NAME").as_bytes(),
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms._NET_SUPPORTED,
            AtomEnum::ATOM,
            &atoms.supported(),
        )?;

        let db = resource_manager::new_from_default(&conn)?;
        let handle = CursorHandle::new(&conn, screen_num, &db)?.reply()?;
        let cursors = Cursors {
            normal: handle.load_cursor(&conn, "left_ptr")?,
            drag: handle.load_cursor(&conn, "fleur")?,
        };
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().cursor(cursors.normal),
        )?;

        let names = conn
            .get_property(false, root, atoms._NET_DESKTOP_NAMES, atoms.UTF8_STRING, 0, u32::MAX)?
            .reply()?;
        let desktop_names = names
            .value
            .split(|b| *b == 0)
            .filter(|name| !name.is_empty())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect();

        conn.flush()?;
        Ok(Self {
            conn,
            screen_num,
            root,
            atoms,
            keymap,
            gc,
            check_window,
            cursors,
            frames: HashMap::new(),
            frame_windows: HashMap::new(),
            known: HashSet::new(),
            pending_unmaps: HashMap::new(),
            key_grabs: Vec::new(),
            desktop_names,
            events: Vec::new(),
            last_motion: 0,
        })
    }

    /// The file descriptor of the connection, readable when events arrive
    pub(crate) fn fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    /// Queue map requests for the windows that were mapped before we started
    pub(crate) fn scan_windows(&mut self) -> Result<(), ReplyOrIdError> {
        let tree = self.conn.query_tree(self.root)?.reply()?;

        // Bunch request the attributes of each window
        let mut cookies = Vec::with_capacity(tree.children.len());
        for win in tree.children {
            let attr = self.conn.get_window_attributes(win)?;
            cookies.push((win, attr));
        }

        for (win, attr) in cookies {
            let attr = match attr.reply() {
                Ok(attr) => attr,
                // gone in the meantime
                Err(_) => continue,
            };
            if attr.override_redirect || attr.map_state == MapState::UNMAPPED {
                continue;
            }
            self.watch(win)?;
            if let Some(info) = self.window_info(win)? {
                self.known.insert(win);
                self.events.push(DisplayEvent::MapRequest(info));
            }
        }
        Ok(())
    }

    /// Property changes are needed for every window before it's even managed, panels included
    fn watch(&self, win: Window) -> Result<(), ReplyOrIdError> {
        self.conn.change_window_attributes(
            win,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        Ok(())
    }

    fn property32(
        &self,
        win: Window,
        prop: impl Into<Atom>,
        ty: impl Into<Atom>,
    ) -> Result<Vec<u32>, ReplyError> {
        let reply = self
            .conn
            .get_property(false, win, prop, ty, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn property_bytes(
        &self,
        win: Window,
        prop: impl Into<Atom>,
        ty: impl Into<Atom>,
    ) -> Result<Vec<u8>, ReplyError> {
        let reply = self
            .conn
            .get_property(false, win, prop, ty, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value)
    }

    fn title(&self, win: Window) -> Result<String, ReplyError> {
        let mut bytes = self.property_bytes(win, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?;
        if bytes.is_empty() {
            bytes = self.property_bytes(win, AtomEnum::WM_NAME, AtomEnum::STRING)?;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn urgent(&self, win: Window) -> Result<bool, ReplyError> {
        let hints = self.property32(win, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS)?;
        Ok(events::urgency_hint(&hints))
    }

    fn strut(&self, win: Window) -> Result<Option<[i32; 4]>, ReplyError> {
        let mut strut = self.property32(win, self.atoms._NET_WM_STRUT_PARTIAL, AtomEnum::CARDINAL)?;
        if strut.len() < 4 {
            strut = self.property32(win, self.atoms._NET_WM_STRUT, AtomEnum::CARDINAL)?;
        }
        Ok(match strut.as_slice() {
            [left, right, top, bottom, ..] => {
                Some([*left as i32, *right as i32, *top as i32, *bottom as i32])
            }
            _ => None,
        })
    }

    /// Collect what the rules and the layout need to know about a window. Override redirect
    /// windows are none of our business.
    fn window_info(&self, win: Window) -> Result<Option<WindowInfo>, ReplyError> {
        let attr = self.conn.get_window_attributes(win)?.reply()?;
        if attr.override_redirect {
            return Ok(None);
        }
        let geometry = self.conn.get_geometry(win)?.reply()?;
        let mut info = WindowInfo::new(win);
        info.geometry = Rect::new(
            geometry.x as i32,
            geometry.y as i32,
            geometry.width as i32,
            geometry.height as i32,
        );

        let class = self.property_bytes(win, AtomEnum::WM_CLASS, AtomEnum::STRING)?;
        let mut parts = class
            .split(|b| *b == 0)
            .map(|part| String::from_utf8_lossy(part).into_owned());
        info.instance = parts.next().unwrap_or_default();
        info.class = parts.next().unwrap_or_default();
        info.title = self.title(win)?;
        info.role = String::from_utf8_lossy(&self.property_bytes(
            win,
            self.atoms.WM_WINDOW_ROLE,
            AtomEnum::STRING,
        )?)
        .into_owned();
        info.pid = self
            .property32(win, self.atoms._NET_WM_PID, AtomEnum::CARDINAL)?
            .first()
            .copied();
        info.transient_for = self
            .property32(win, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW)?
            .first()
            .copied()
            .filter(|w| *w != NONE);
        let types = self.property32(win, self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM)?;
        info.window_type = types
            .iter()
            .find_map(|atom| self.atoms.window_type_name(*atom))
            .unwrap_or(if info.transient_for.is_some() {
                "_NET_WM_WINDOW_TYPE_DIALOG"
            } else {
                "_NET_WM_WINDOW_TYPE_NORMAL"
            })
            .to_string();
        let size_hints = self.property32(win, AtomEnum::WM_NORMAL_HINTS, AtomEnum::WM_SIZE_HINTS)?;
        info.fixed_size = events::fixed_size(&size_hints);
        info.desktop = self
            .property32(win, self.atoms._NET_WM_DESKTOP, AtomEnum::CARDINAL)?
            .first()
            .copied();
        info.fullscreen = self
            .property32(win, self.atoms._NET_WM_STATE, AtomEnum::ATOM)?
            .contains(&self.atoms._NET_WM_STATE_FULLSCREEN);
        info.urgent = self.urgent(win)?;
        info.strut = self.strut(win)?;
        Ok(Some(info))
    }

    fn supports_protocol(&self, win: Window, protocol: Atom) -> Result<bool, ReplyError> {
        let protocols = self.property32(win, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM)?;
        Ok(protocols.contains(&protocol))
    }

    fn send_protocol(&self, win: Window, protocol: Atom) -> Result<(), ReplyOrIdError> {
        let event = ClientMessageEvent::new(
            32,
            win,
            self.atoms.WM_PROTOCOLS,
            [protocol, CURRENT_TIME, 0, 0, 0],
        );
        self.conn
            .send_event(false, win, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn window_of(&self, item: &StackItem) -> Option<Window> {
        match item {
            StackItem::Client(win) => Some(*win),
            StackItem::Frame(id) => self.frames.get(id).map(|(win, _)| *win),
        }
    }

    fn grab_keys(&self) -> Result<(), ReplyOrIdError> {
        self.conn
            .ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        for combo in &self.key_grabs {
            let keycodes = self.keymap.keycodes(combo.keysym);
            if keycodes.is_empty() {
                log::warn!("no key produces {}", combo);
            }
            for keycode in keycodes {
                for extra in lock_variants() {
                    self.conn.grab_key(
                        true,
                        self.root,
                        ModMask::from(combo.mods) | extra,
                        keycode,
                        GrabMode::ASYNC,
                        GrabMode::SYNC,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn grab_buttons(&self, combos: &[MouseCombo]) -> Result<(), ReplyOrIdError> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, self.root, ModMask::ANY)?;
        for combo in combos {
            for extra in lock_variants() {
                self.conn.grab_button(
                    false,
                    self.root,
                    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                    NONE,
                    NONE,
                    ButtonIndex::from(combo.button),
                    ModMask::from(combo.mods) | extra,
                )?;
            }
        }
        Ok(())
    }

    fn show_frame(&mut self, id: FrameId, look: FrameLook) -> Result<(), ReplyOrIdError> {
        let win = match self.frames.get(&id) {
            Some((win, _)) => *win,
            None => {
                let win = self.conn.generate_id()?;
                self.conn.create_window(
                    COPY_DEPTH_FROM_PARENT,
                    win,
                    self.root,
                    0,
                    0,
                    1,
                    1,
                    0,
                    WindowClass::INPUT_OUTPUT,
                    COPY_FROM_PARENT,
                    &CreateWindowAux::new()
                        .override_redirect(1)
                        .event_mask(EventMask::EXPOSURE | EventMask::BUTTON_PRESS),
                )?;
                self.frame_windows.insert(win, id);
                win
            }
        };
        let rect = look.rect.clamped();
        let border = look.border_width.max(0);
        self.conn.configure_window(
            win,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width((rect.width - 2 * border).max(1) as u32)
                .height((rect.height - 2 * border).max(1) as u32)
                .border_width(border as u32),
        )?;
        let background = if look.transparent {
            ChangeWindowAttributesAux::new().background_pixmap(NONE)
        } else {
            ChangeWindowAttributesAux::new().background_pixel(u32::from(look.background))
        };
        self.conn
            .change_window_attributes(win, &background.border_pixel(u32::from(look.border_color)))?;
        self.conn.map_window(win)?;
        self.draw_frame(win, &look)?;
        self.frames.insert(id, (win, look));
        Ok(())
    }

    /// Paint the inside of a frame window: background, inner border and tabs
    fn draw_frame(&self, win: Window, look: &FrameLook) -> Result<(), ReplyOrIdError> {
        let border = look.border_width.max(0);
        let origin = (look.rect.x + border, look.rect.y + border);
        let size = Rect::new(
            0,
            0,
            (look.rect.width - 2 * border).max(1),
            (look.rect.height - 2 * border).max(1),
        );
        let fill = |color: u32, rects: Vec<Rect>| -> Result<(), ReplyOrIdError> {
            let rects = rects
                .into_iter()
                .filter(|r| r.width > 0 && r.height > 0)
                .map(|r| Rectangle {
                    x: r.x as i16,
                    y: r.y as i16,
                    width: r.width as u16,
                    height: r.height as u16,
                })
                .collect::<Vec<_>>();
            if rects.is_empty() {
                return Ok(());
            }
            self.conn
                .change_gc(self.gc, &ChangeGCAux::new().foreground(color))?;
            self.conn.poly_fill_rectangle(win, self.gc, &rects)?;
            Ok(())
        };
        if look.transparent {
            fill(u32::from(look.background), ring(size, look.transparent_width))?;
        } else {
            fill(u32::from(look.background), vec![size])?;
        }
        fill(u32::from(look.inner_color), ring(size, look.inner_width))?;
        for (rect, color) in &look.tabs {
            let tab = Rect::new(rect.x - origin.0, rect.y - origin.1, rect.width, rect.height);
            fill(u32::from(*color), vec![tab])?;
        }
        Ok(())
    }

    fn try_execute(&mut self, action: DisplayAction) -> Result<(), ReplyOrIdError> {
        match action {
            DisplayAction::Manage(win) => {
                self.known.insert(win);
                self.conn.change_window_attributes(
                    win,
                    &ChangeWindowAttributesAux::new().event_mask(
                        EventMask::ENTER_WINDOW
                            | EventMask::PROPERTY_CHANGE
                            | EventMask::FOCUS_CHANGE,
                    ),
                )?;
                self.conn.change_save_set(SetMode::INSERT, win)?;
                // clicks into clients focus them, the click is replayed afterwards
                self.conn.grab_button(
                    true,
                    win,
                    EventMask::BUTTON_PRESS,
                    GrabMode::SYNC,
                    GrabMode::ASYNC,
                    NONE,
                    NONE,
                    ButtonIndex::ANY,
                    ModMask::ANY,
                )?;
            }
            DisplayAction::Configure { id, rect, border } => {
                let rect = rect.clamped();
                let border = border.max(0);
                let width = (rect.width - 2 * border).max(1);
                let height = (rect.height - 2 * border).max(1);
                self.conn.configure_window(
                    id,
                    &ConfigureWindowAux::new()
                        .x(rect.x)
                        .y(rect.y)
                        .width(width as u32)
                        .height(height as u32)
                        .border_width(border as u32),
                )?;
                if self.known.contains(&id) {
                    let event = ConfigureNotifyEvent {
                        response_type: CONFIGURE_NOTIFY_EVENT,
                        sequence: 0,
                        event: id,
                        window: id,
                        above_sibling: NONE,
                        x: rect.x as i16,
                        y: rect.y as i16,
                        width: width as u16,
                        height: height as u16,
                        border_width: border as u16,
                        override_redirect: false,
                    };
                    self.conn
                        .send_event(false, id, EventMask::STRUCTURE_NOTIFY, event)?;
                }
            }
            DisplayAction::SetBorderColor { id, color } => {
                self.conn.change_window_attributes(
                    id,
                    &ChangeWindowAttributesAux::new().border_pixel(u32::from(color)),
                )?;
            }
            DisplayAction::Map(win) => {
                self.conn.map_window(win)?;
            }
            DisplayAction::Unmap(win) => {
                *self.pending_unmaps.entry(win).or_default() += 1;
                self.conn.unmap_window(win)?;
            }
            DisplayAction::Focus(Some(win)) => {
                self.conn
                    .set_input_focus(InputFocus::POINTER_ROOT, win, CURRENT_TIME)?;
                if self.supports_protocol(win, self.atoms.WM_TAKE_FOCUS)? {
                    self.send_protocol(win, self.atoms.WM_TAKE_FOCUS)?;
                }
            }
            DisplayAction::Focus(None) => {
                self.conn
                    .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME)?;
            }
            DisplayAction::Restack(items) => {
                let windows = items
                    .iter()
                    .filter_map(|item| self.window_of(item))
                    .collect::<Vec<_>>();
                if let Some(top) = windows.first() {
                    self.conn.configure_window(
                        *top,
                        &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
                    )?;
                }
                for pair in windows.windows(2) {
                    self.conn.configure_window(
                        pair[1],
                        &ConfigureWindowAux::new()
                            .sibling(pair[0])
                            .stack_mode(StackMode::BELOW),
                    )?;
                }
                let stacking = items
                    .iter()
                    .rev()
                    .filter_map(|item| match item {
                        StackItem::Client(win) => Some(*win),
                        StackItem::Frame(_) => None,
                    })
                    .collect::<Vec<_>>();
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_CLIENT_LIST_STACKING,
                    AtomEnum::WINDOW,
                    &stacking,
                )?;
            }
            DisplayAction::Close(win) => {
                if self.supports_protocol(win, self.atoms.WM_DELETE_WINDOW)? {
                    self.send_protocol(win, self.atoms.WM_DELETE_WINDOW)?;
                } else {
                    self.conn.kill_client(win)?;
                }
            }
            DisplayAction::GrabKeys(combos) => {
                self.key_grabs = combos;
                self.grab_keys()?;
            }
            DisplayAction::GrabButtons(combos) => self.grab_buttons(&combos)?,
            DisplayAction::AllowKeyEvents { replay } => {
                let mode = if replay {
                    Allow::REPLAY_KEYBOARD
                } else {
                    Allow::ASYNC_KEYBOARD
                };
                self.conn.allow_events(mode, CURRENT_TIME)?;
            }
            DisplayAction::ShowFrame { id, look } => self.show_frame(id, look)?,
            DisplayAction::HideFrame(id) => {
                if let Some((win, _)) = self.frames.get(&id) {
                    self.conn.unmap_window(*win)?;
                }
            }
            DisplayAction::DestroyFrame(id) => {
                if let Some((win, _)) = self.frames.remove(&id) {
                    self.frame_windows.remove(&win);
                    self.conn.destroy_window(win)?;
                }
            }
            DisplayAction::SetWmDesktop { id, desktop } => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    id,
                    self.atoms._NET_WM_DESKTOP,
                    AtomEnum::CARDINAL,
                    &[desktop],
                )?;
            }
            DisplayAction::SetWmState { id, iconic } => {
                // NormalState is 1, IconicState 3
                let state = if iconic { 3 } else { 1 };
                self.conn.change_property32(
                    PropMode::REPLACE,
                    id,
                    self.atoms.WM_STATE,
                    self.atoms.WM_STATE,
                    &[state, NONE],
                )?;
            }
            DisplayAction::SetNetWmState {
                id,
                fullscreen,
                urgent,
            } => {
                let mut states = Vec::new();
                if fullscreen {
                    states.push(self.atoms._NET_WM_STATE_FULLSCREEN);
                }
                if urgent {
                    states.push(self.atoms._NET_WM_STATE_DEMANDS_ATTENTION);
                }
                self.conn.change_property32(
                    PropMode::REPLACE,
                    id,
                    self.atoms._NET_WM_STATE,
                    AtomEnum::ATOM,
                    &states,
                )?;
            }
            DisplayAction::SetDesktopNames(names) => {
                let mut bytes = Vec::new();
                for name in names {
                    bytes.extend_from_slice(name.as_bytes());
                    bytes.push(0);
                }
                self.conn.change_property8(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_DESKTOP_NAMES,
                    self.atoms.UTF8_STRING,
                    &bytes,
                )?;
            }
            DisplayAction::SetCurrentDesktop(desktop) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_CURRENT_DESKTOP,
                    AtomEnum::CARDINAL,
                    &[desktop],
                )?;
            }
            DisplayAction::SetNumberOfDesktops(count) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_NUMBER_OF_DESKTOPS,
                    AtomEnum::CARDINAL,
                    &[count],
                )?;
            }
            DisplayAction::SetClientList(wins) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_CLIENT_LIST,
                    AtomEnum::WINDOW,
                    &wins,
                )?;
            }
            DisplayAction::SetActiveWindow(win) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_ACTIVE_WINDOW,
                    AtomEnum::WINDOW,
                    &[win.unwrap_or(NONE)],
                )?;
            }
            DisplayAction::WarpPointer { x, y } => {
                self.conn
                    .warp_pointer(NONE, self.root, 0, 0, 0, 0, x as i16, y as i16)?;
            }
            DisplayAction::GrabPointer => {
                self.conn
                    .grab_pointer(
                        false,
                        self.root,
                        EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                        NONE,
                        self.cursors.drag,
                        CURRENT_TIME,
                    )?
                    .reply()?;
            }
            DisplayAction::UngrabPointer => {
                self.conn.ungrab_pointer(CURRENT_TIME)?;
            }
        }
        Ok(())
    }
}

/// The border of `rect` that is `width` wide, as four rectangles
fn ring(rect: Rect, width: i32) -> Vec<Rect> {
    if width <= 0 {
        return Vec::new();
    }
    let width = width.min(rect.width / 2).min(rect.height / 2).max(1);
    vec![
        Rect::new(rect.x, rect.y, rect.width, width),
        Rect::new(rect.x, rect.y + rect.height - width, rect.width, width),
        Rect::new(rect.x, rect.y + width, width, rect.height - 2 * width),
        Rect::new(rect.x + rect.width - width, rect.y + width, width, rect.height - 2 * width),
    ]
}

impl DisplayServer for X11Display {
    fn next_events(&mut self) -> Vec<DisplayEvent> {
        loop {
            let event = match self.conn.poll_for_event() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    log::error!("lost the connection to the X server: {}", e);
                    break;
                }
            };
            match self.translate(event) {
                Ok(Some(event)) => self.events.push(event),
                Ok(None) => {}
                Err(e) => log::debug!("error while handling an X event: {}", e),
            }
        }
        std::mem::take(&mut self.events)
    }

    fn execute(&mut self, action: DisplayAction) {
        log::trace!("{:?}", action);
        if let Err(e) = self.try_execute(action) {
            log::warn!("X request failed: {}", e);
        }
    }

    fn screen_rects(&self) -> Vec<Rect> {
        if cfg!(feature = "fake_monitors") {
            return vec![Rect::new(0, 0, 960, 1080), Rect::new(960, 0, 960, 1080)];
        }
        let monitors = self
            .conn
            .randr_get_monitors(self.root, true)
            .map_err(ReplyError::from)
            .and_then(|cookie| cookie.reply());
        match monitors {
            Ok(reply) if !reply.monitors.is_empty() => reply
                .monitors
                .iter()
                .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as i32, m.height as i32))
                .collect(),
            _ => {
                let screen = &self.conn.setup().roots[self.screen_num];
                vec![Rect::new(
                    0,
                    0,
                    screen.width_in_pixels as i32,
                    screen.height_in_pixels as i32,
                )]
            }
        }
    }

    fn pointer_position(&self) -> (i32, i32) {
        let pointer = self
            .conn
            .query_pointer(self.root)
            .map_err(ReplyError::from)
            .and_then(|cookie| cookie.reply());
        match pointer {
            Ok(reply) => (reply.root_x as i32, reply.root_y as i32),
            Err(e) => {
                log::warn!("can't query the pointer: {}", e);
                (0, 0)
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.conn.flush() {
            log::error!("flushing the X connection failed: {}", e);
        }
    }

    fn desktop_names(&self) -> Vec<String> {
        self.desktop_names.clone()
    }

    fn lookup_color(&self, name: &str) -> Option<Color> {
        let colormap = self.conn.setup().roots[self.screen_num].default_colormap;
        let reply = self
            .conn
            .lookup_color(colormap, name.as_bytes())
            .map_err(ReplyError::from)
            .and_then(|cookie| cookie.reply());
        match reply {
            Ok(c) => Some(Color::new(
                (c.exact_red >> 8) as u8,
                (c.exact_green >> 8) as u8,
                (c.exact_blue >> 8) as u8,
            )),
            Err(e) => {
                log::debug!("X doesn't know the color \"{}\": {}", name, e);
                None
            }
        }
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        let _ = self.conn.destroy_window(self.check_window);
        for (win, _) in self.frames.values() {
            let _ = self.conn.destroy_window(*win);
        }
        let _ = self
            .conn
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME);
        let _ = self.conn.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_stay_inside() {
        let rects = ring(Rect::new(0, 0, 100, 50), 3);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[1], Rect::new(0, 47, 100, 3));
        assert_eq!(rects[3], Rect::new(97, 3, 3, 44));
        assert!(ring(Rect::new(0, 0, 100, 50), 0).is_empty());
    }
}
