//! The boundary between the window manager and the display server.
//!
//! The core never talks to X directly: it consumes [`DisplayEvent`]s and produces
//! [`DisplayAction`]s, the X backend in [`crate::x11`] translates both ways.

use crate::{
    color::Color,
    keys::KeyCombo,
    mouse::MouseCombo,
    newtypes::{FrameId, WinId},
    rect::Rect,
};

/// Everything the manager wants to know about a window when it's mapped
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct WindowInfo {
    pub(crate) id: WinId,
    pub(crate) class: String,
    pub(crate) instance: String,
    pub(crate) title: String,
    pub(crate) pid: Option<u32>,
    /// The name of the first atom in `_NET_WM_WINDOW_TYPE`
    pub(crate) window_type: String,
    pub(crate) role: String,
    pub(crate) transient_for: Option<WinId>,
    /// Minimum and maximum size are equal
    pub(crate) fixed_size: bool,
    /// `_NET_WM_DESKTOP`
    pub(crate) desktop: Option<u32>,
    pub(crate) geometry: Rect,
    pub(crate) fullscreen: bool,
    pub(crate) urgent: bool,
    /// Reserved space (left, right, top, bottom) from `_NET_WM_STRUT[_PARTIAL]`
    pub(crate) strut: Option<[i32; 4]>,
}

impl WindowInfo {
    pub(crate) fn new(id: WinId) -> Self {
        Self {
            id,
            geometry: Rect::new(0, 0, 300, 200),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DisplayEvent {
    MapRequest(WindowInfo),
    /// The window was destroyed or withdrawn by its client
    Unmanage(WinId),
    ConfigureRequest {
        id: WinId,
        rect: Rect,
    },
    KeyPress {
        mods: u16,
        keysym: u32,
    },
    KeyRelease {
        mods: u16,
        keysym: u32,
    },
    ButtonPress {
        id: WinId,
        mods: u16,
        button: u8,
        x: i32,
        y: i32,
    },
    ButtonRelease {
        button: u8,
    },
    Motion {
        x: i32,
        y: i32,
    },
    Enter {
        id: WinId,
    },
    TitleChanged {
        id: WinId,
        title: String,
    },
    UrgencyChanged {
        id: WinId,
        urgent: bool,
    },
    StrutChanged {
        id: WinId,
        strut: Option<[i32; 4]>,
    },
    FullscreenRequest {
        id: WinId,
        /// `None` toggles
        state: Option<bool>,
    },
    ActivateRequest(WinId),
    CloseRequest(WinId),
    /// A client asks to be moved to another desktop
    DesktopRequest {
        id: WinId,
        desktop: u32,
    },
    /// A pager asks to switch the current desktop
    CurrentDesktopRequest(u32),
    /// Click into the decoration of a frame, the coordinates are relative to the root window
    FrameClicked {
        frame: FrameId,
        x: i32,
        y: i32,
    },
    ScreensChanged,
}

/// How a frame is drawn
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FrameLook {
    pub(crate) rect: Rect,
    pub(crate) border_width: i32,
    pub(crate) border_color: Color,
    pub(crate) inner_width: i32,
    pub(crate) inner_color: Color,
    pub(crate) background: Color,
    pub(crate) transparent: bool,
    pub(crate) transparent_width: i32,
    /// Tab bar of max frames: rectangle and whether it's the selected client
    pub(crate) tabs: Vec<(Rect, Color)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DisplayAction {
    /// Start listening to the events of a new client
    Manage(WinId),
    /// `rect` is the outer rectangle, the window content is `border` smaller on every side
    Configure {
        id: WinId,
        rect: Rect,
        border: i32,
    },
    SetBorderColor {
        id: WinId,
        color: Color,
    },
    Map(WinId),
    Unmap(WinId),
    Focus(Option<WinId>),
    /// Windows and frames from top to bottom
    Restack(Vec<StackItem>),
    Close(WinId),
    GrabKeys(Vec<KeyCombo>),
    GrabButtons(Vec<MouseCombo>),
    /// Keys are grabbed synchronously, every press is either consumed or replayed to the client
    AllowKeyEvents {
        replay: bool,
    },
    ShowFrame {
        id: FrameId,
        look: FrameLook,
    },
    HideFrame(FrameId),
    DestroyFrame(FrameId),
    SetWmDesktop {
        id: WinId,
        desktop: u32,
    },
    /// ICCCM `WM_STATE`, normal or iconic
    SetWmState {
        id: WinId,
        iconic: bool,
    },
    SetNetWmState {
        id: WinId,
        fullscreen: bool,
        urgent: bool,
    },
    SetDesktopNames(Vec<String>),
    SetCurrentDesktop(u32),
    SetNumberOfDesktops(u32),
    SetClientList(Vec<WinId>),
    SetActiveWindow(Option<WinId>),
    WarpPointer {
        x: i32,
        y: i32,
    },
    GrabPointer,
    UngrabPointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackItem {
    Client(WinId),
    Frame(FrameId),
}

pub(crate) trait DisplayServer {
    /// Everything that happened since the last call
    fn next_events(&mut self) -> Vec<DisplayEvent>;
    fn execute(&mut self, action: DisplayAction);
    /// The geometry of the physical monitors
    fn screen_rects(&self) -> Vec<Rect>;
    fn pointer_position(&self) -> (i32, i32);
    fn flush(&mut self);
    /// `_NET_DESKTOP_NAMES` as found on startup
    fn desktop_names(&self) -> Vec<String> {
        vec![]
    }
    /// Resolve a color name the server knows, like the ones from rgb.txt
    fn lookup_color(&self, _name: &str) -> Option<Color> {
        None
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    /// A display server without a display, it records what it's asked to do
    #[derive(Debug, Clone, Default)]
    pub(crate) struct MockDisplay {
        pub(crate) actions: Rc<RefCell<Vec<DisplayAction>>>,
        pub(crate) events: Rc<RefCell<Vec<DisplayEvent>>>,
        pub(crate) screens: Rc<RefCell<Vec<Rect>>>,
        pub(crate) pointer: Rc<RefCell<(i32, i32)>>,
        pub(crate) colors: Rc<RefCell<Vec<(String, Color)>>>,
    }

    impl MockDisplay {
        pub(crate) fn new(screens: Vec<Rect>) -> Self {
            let mock = Self::default();
            *mock.screens.borrow_mut() = screens;
            mock
        }

        pub(crate) fn take_actions(&self) -> Vec<DisplayAction> {
            std::mem::take(&mut *self.actions.borrow_mut())
        }
    }

    impl DisplayServer for MockDisplay {
        fn next_events(&mut self) -> Vec<DisplayEvent> {
            std::mem::take(&mut *self.events.borrow_mut())
        }

        fn execute(&mut self, action: DisplayAction) {
            self.actions.borrow_mut().push(action);
        }

        fn screen_rects(&self) -> Vec<Rect> {
            self.screens.borrow().clone()
        }

        fn pointer_position(&self) -> (i32, i32) {
            *self.pointer.borrow()
        }

        fn flush(&mut self) {}

        fn lookup_color(&self, name: &str) -> Option<Color> {
            let colors = self.colors.borrow();
            colors.iter().find(|(n, _)| n == name).map(|(_, color)| *color)
        }
    }
}
