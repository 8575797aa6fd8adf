use std::sync::atomic::{AtomicU64, Ordering};

/// X window ids, `0` means no window
pub(crate) type WinId = u32;

/// Stable identity of a tag, it survives renames and reordering
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub(crate) struct TagId(pub(crate) u32);

/// Stable identity of a monitor, the index changes when monitors are removed
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub(crate) struct MonitorId(pub(crate) u32);

/// Identity of a single frame, used to keep track of the X window drawn for it
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub(crate) struct FrameId(pub(crate) u64);

impl FrameId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) fn format_winid(win: WinId) -> String {
    format!("0x{:x}", win)
}

/// Window ids are accepted in hex (`0x1a00003`) and decimal
pub(crate) fn parse_winid(s: &str) -> Option<WinId> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_ids() {
        assert_eq!(parse_winid("0x1a"), Some(26));
        assert_eq!(parse_winid("26"), Some(26));
        assert_eq!(parse_winid("foo"), None);
        assert_eq!(format_winid(26), "0x1a");
    }

    #[test]
    fn frame_ids_are_unique() {
        assert_ne!(FrameId::next(), FrameId::next());
    }
}
