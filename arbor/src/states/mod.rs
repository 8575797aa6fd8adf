pub(crate) mod mon_state;
pub(crate) mod tag_state;
pub(crate) mod win_state;
pub(crate) mod wm_state;

pub(crate) use {
    mon_state::{Monitor, Panel},
    tag_state::Tag,
    win_state::Client,
    wm_state::WMState,
};
