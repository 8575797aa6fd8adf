//! Geometry of a frame tree: where the frames go and where their clients go

use super::{Algorithm, Align, Frame, FramePath, Leaf};
use crate::{
    decimal::Decimal,
    newtypes::{FrameId, WinId},
    rect::Rect,
};

/// The settings that influence the tiling geometry
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LayoutParams {
    pub(crate) frame_gap: i32,
    pub(crate) frame_border_width: i32,
    pub(crate) frame_padding: i32,
    pub(crate) window_gap: i32,
    pub(crate) smart_frame_surroundings: bool,
    pub(crate) smart_window_surroundings: bool,
    pub(crate) gapless_grid: bool,
    pub(crate) tabbed_max: bool,
    /// Height of the tab bar in max frames, 0 disables it
    pub(crate) tab_height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FrameGeometry {
    pub(crate) id: FrameId,
    pub(crate) path: FramePath,
    /// The outer rectangle, including the frame border
    pub(crate) rect: Rect,
    pub(crate) border_width: i32,
    pub(crate) client_count: usize,
    pub(crate) tabs: Vec<(WinId, Rect)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientSlot {
    pub(crate) win: WinId,
    pub(crate) frame: FrameId,
    /// The outer rectangle of the client, including its decoration
    pub(crate) rect: Rect,
    /// Selected client of its leaf
    pub(crate) selected: bool,
    /// Part of a max frame without being on top
    pub(crate) covered: bool,
    /// Drawn without decoration because of `smart_window_surroundings`
    pub(crate) minimal: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FrameLayout {
    pub(crate) frames: Vec<FrameGeometry>,
    pub(crate) clients: Vec<ClientSlot>,
}

impl FrameLayout {
    pub(crate) fn frame(&self, id: FrameId) -> Option<&FrameGeometry> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub(crate) fn client(&self, win: WinId) -> Option<&ClientSlot> {
        self.clients.iter().find(|c| c.win == win)
    }
}

/// Divide `rect` at `fraction`, the first part gets `floor(fraction * size)`
pub(crate) fn split_rect(rect: Rect, align: Align, fraction: Decimal) -> (Rect, Rect) {
    match align {
        Align::Horizontal => {
            let first = fraction.scale(rect.width);
            (
                Rect::new(rect.x, rect.y, first, rect.height),
                Rect::new(rect.x + first, rect.y, rect.width - first, rect.height),
            )
        }
        Align::Vertical => {
            let first = fraction.scale(rect.height);
            (
                Rect::new(rect.x, rect.y, rect.width, first),
                Rect::new(rect.x, rect.y + first, rect.width, rect.height - first),
            )
        }
    }
}

/// Lay out the tree `root` inside `area`
pub(crate) fn compute(root: &Frame, area: Rect, params: &LayoutParams) -> FrameLayout {
    let smart = params.smart_frame_surroundings && matches!(root, Frame::Leaf(_));
    let gap = if smart { 0 } else { params.frame_gap };
    // half of every gap belongs to each neighbour, the outer border gets a full gap
    let area = Rect::new(area.x + gap, area.y + gap, area.width - gap, area.height - gap);
    let mut layout = FrameLayout::default();
    compute_frame(root, area, params, smart, &mut Vec::new(), &mut layout);
    layout
}

fn compute_frame(
    frame: &Frame,
    rect: Rect,
    params: &LayoutParams,
    smart: bool,
    path: &mut FramePath,
    layout: &mut FrameLayout,
) {
    match frame {
        Frame::Split(s) => {
            let (first, second) = split_rect(rect, s.align, s.fraction);
            for (i, (child, rect)) in s.children.iter().zip([first, second]).enumerate() {
                path.push(i as u8);
                compute_frame(child, rect, params, smart, path, layout);
                path.pop();
            }
        }
        Frame::Leaf(leaf) => compute_leaf(leaf, rect, params, smart, path, layout),
    }
}

fn compute_leaf(
    leaf: &Leaf,
    rect: Rect,
    params: &LayoutParams,
    smart: bool,
    path: &FramePath,
    layout: &mut FrameLayout,
) {
    let (frame_rect, border) = if smart {
        (rect, 0)
    } else {
        (
            Rect::new(
                rect.x,
                rect.y,
                rect.width - params.frame_gap,
                rect.height - params.frame_gap,
            ),
            params.frame_border_width,
        )
    };
    let count = leaf.clients.len();
    let single = params.smart_window_surroundings && count == 1;

    let mut inner = frame_rect.shrink(border);
    if !single {
        inner = inner.shrink(params.frame_padding);
    }

    let mut tabs = Vec::new();
    if leaf.algorithm == Algorithm::Max && params.tabbed_max && count > 1 && params.tab_height > 0 {
        let bar = Rect::new(inner.x, inner.y, inner.width, params.tab_height);
        for (i, win) in leaf.clients.iter().enumerate() {
            let (x, width) = partition(bar.x, bar.width, count, i);
            tabs.push((*win, Rect::new(x, bar.y, width, bar.height)));
        }
        inner.y += params.tab_height;
        inner.height -= params.tab_height;
    }

    let window_gap = if single { 0 } else { params.window_gap };
    let inner = Rect::new(
        inner.x + window_gap,
        inner.y + window_gap,
        inner.width - window_gap,
        inner.height - window_gap,
    );

    let slots = arrange(leaf.algorithm, count, inner, params.gapless_grid);
    for (i, (win, slot)) in leaf.clients.iter().zip(slots).enumerate() {
        let selected = i == leaf.selection;
        layout.clients.push(ClientSlot {
            win: *win,
            frame: leaf.id,
            rect: Rect::new(slot.x, slot.y, slot.width - window_gap, slot.height - window_gap),
            selected,
            covered: leaf.algorithm == Algorithm::Max && !selected,
            minimal: single,
        });
    }

    layout.frames.push(FrameGeometry {
        id: leaf.id,
        path: path.clone(),
        rect: frame_rect,
        border_width: border,
        client_count: count,
        tabs,
    });
}

/// Start and size of part `i` when `size` is divided into `n` parts, the last one takes the rest
fn partition(start: i32, size: i32, n: usize, i: usize) -> (i32, i32) {
    let n = n as i32;
    let i = i as i32;
    let part = size / n;
    if i == n - 1 {
        (start + part * i, size - part * i)
    } else {
        (start + part * i, part)
    }
}

fn arrange(algorithm: Algorithm, count: usize, area: Rect, gapless_grid: bool) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    match algorithm {
        Algorithm::Vertical => (0..count)
            .map(|i| {
                let (y, height) = partition(area.y, area.height, count, i);
                Rect::new(area.x, y, area.width, height)
            })
            .collect(),
        Algorithm::Horizontal => (0..count)
            .map(|i| {
                let (x, width) = partition(area.x, area.width, count, i);
                Rect::new(x, area.y, width, area.height)
            })
            .collect(),
        Algorithm::Max => vec![area; count],
        Algorithm::Grid => {
            let mut cols = 1;
            while cols * cols < count {
                cols += 1;
            }
            let rows = (count + cols - 1) / cols;
            let mut slots = Vec::with_capacity(count);
            for i in 0..count {
                let row = i / cols;
                let col = i % cols;
                let (y, height) = partition(area.y, area.height, rows, row);
                let in_last_row = count - row * cols;
                let (x, width) = if row == rows - 1 && gapless_grid && in_last_row < cols {
                    partition(area.x, area.width, in_last_row, col)
                } else {
                    partition(area.x, area.width, cols, col)
                };
                slots.push(Rect::new(x, y, width, height));
            }
            slots
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub(crate) const NAMES: &'static [&'static str] = &["up", "down", "left", "right"];

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "up" | "u" => Some(Self::Up),
            "down" | "d" => Some(Self::Down),
            "left" | "l" => Some(Self::Left),
            "right" | "r" => Some(Self::Right),
            _ => None,
        }
    }

    pub(crate) fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Pick the rectangle next to `from` in direction `dir`.
///
/// Candidates overlapping `from` on the orthogonal axis are preferred, among them the closest one
/// wins. Without overlapping candidates the nearest center in that direction is taken.
pub(crate) fn neighbour<K: Clone>(
    from: Rect,
    candidates: &[(K, Rect)],
    dir: Direction,
) -> Option<K> {
    let (fcx, fcy) = from.center();
    let ahead = |r: &Rect| match dir {
        Direction::Right => r.x >= from.x + from.width,
        Direction::Left => r.x + r.width <= from.x,
        Direction::Down => r.y >= from.y + from.height,
        Direction::Up => r.y + r.height <= from.y,
    };
    let overlaps = |r: &Rect| {
        if dir.is_horizontal() {
            r.y < from.y + from.height && from.y < r.y + r.height
        } else {
            r.x < from.x + from.width && from.x < r.x + r.width
        }
    };
    let distance = |r: &Rect| match dir {
        Direction::Right => r.x - (from.x + from.width),
        Direction::Left => from.x - (r.x + r.width),
        Direction::Down => r.y - (from.y + from.height),
        Direction::Up => from.y - (r.y + r.height),
    };
    let center_offset = |r: &Rect| {
        let (cx, cy) = r.center();
        if dir.is_horizontal() {
            (cy - fcy).abs()
        } else {
            (cx - fcx).abs()
        }
    };

    let ahead = candidates.iter().filter(|(_, r)| ahead(r)).collect::<Vec<_>>();
    let overlapping = ahead
        .iter()
        .filter(|(_, r)| overlaps(r))
        .min_by_key(|(_, r)| (distance(r), center_offset(r)));
    if let Some((key, _)) = overlapping {
        return Some(key.clone());
    }
    ahead
        .iter()
        .min_by_key(|(_, r)| {
            let (cx, cy) = r.center();
            (cx - fcx).pow(2) + (cy - fcy).pow(2)
        })
        .map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{load, SplitKind};

    fn params() -> LayoutParams {
        LayoutParams {
            gapless_grid: true,
            ..LayoutParams::default()
        }
    }

    #[test]
    fn split_uses_floor() {
        let (a, b) = split_rect(Rect::new(0, 0, 101, 50), Align::Horizontal, Decimal::half());
        assert_eq!(a, Rect::new(0, 0, 50, 50));
        assert_eq!(b, Rect::new(50, 0, 51, 50));
    }

    #[test]
    fn vertical_partition() {
        let frame = load("(clients vertical:0 0x1 0x2 0x3)").unwrap();
        let layout = compute(&frame, Rect::new(0, 0, 100, 100), &params());
        let rects = layout.clients.iter().map(|c| c.rect).collect::<Vec<_>>();
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 100, 33),
                Rect::new(0, 33, 100, 33),
                Rect::new(0, 66, 100, 34)
            ]
        );
    }

    #[test]
    fn grid_last_row() {
        let frame = load("(clients grid:0 0x1 0x2 0x3)").unwrap();
        let layout = compute(&frame, Rect::new(0, 0, 100, 100), &params());
        assert_eq!(layout.clients[2].rect, Rect::new(0, 50, 100, 50));

        let gaps = LayoutParams {
            gapless_grid: false,
            ..params()
        };
        let layout = compute(&frame, Rect::new(0, 0, 100, 100), &gaps);
        assert_eq!(layout.clients[2].rect, Rect::new(0, 50, 50, 50));
    }

    #[test]
    fn gaps_and_borders() {
        let p = LayoutParams {
            frame_gap: 10,
            frame_border_width: 2,
            ..params()
        };
        let mut frame = load("(clients vertical:0 0x1)").unwrap();
        let layout = compute(&frame, Rect::new(0, 0, 200, 100), &p);
        assert_eq!(layout.frames[0].rect, Rect::new(10, 10, 180, 80));
        assert_eq!(layout.clients[0].rect, Rect::new(12, 12, 176, 76));

        frame.split_leaf(&[], SplitKind::Right, Align::Horizontal, Decimal::half());
        let layout = compute(&frame, Rect::new(0, 0, 210, 100), &p);
        assert_eq!(layout.frames[0].rect, Rect::new(10, 10, 90, 80));
        assert_eq!(layout.frames[1].rect, Rect::new(110, 10, 90, 80));

        let smart = LayoutParams {
            smart_frame_surroundings: true,
            ..p
        };
        let frame = load("(clients vertical:0 0x1)").unwrap();
        let layout = compute(&frame, Rect::new(0, 0, 200, 100), &smart);
        assert_eq!(layout.clients[0].rect, Rect::new(0, 0, 200, 100));
    }

    #[test]
    fn max_frames_get_tabs() {
        let p = LayoutParams {
            tabbed_max: true,
            tab_height: 10,
            ..params()
        };
        let frame = load("(clients max:1 0x1 0x2)").unwrap();
        let layout = compute(&frame, Rect::new(0, 0, 100, 100), &p);
        assert_eq!(layout.frames[0].tabs.len(), 2);
        assert_eq!(layout.frames[0].tabs[1], (2, Rect::new(50, 0, 50, 10)));
        assert_eq!(layout.clients[0].rect, Rect::new(0, 10, 100, 90));
        assert!(layout.clients[0].covered);
        assert!(!layout.clients[1].covered);
    }

    #[test]
    fn neighbours() {
        let cands = vec![
            (0, Rect::new(0, 0, 50, 50)),
            (1, Rect::new(50, 0, 50, 25)),
            (2, Rect::new(50, 25, 50, 25)),
        ];
        assert_eq!(neighbour(cands[0].1, &cands, Direction::Right), Some(2));
        assert_eq!(neighbour(cands[2].1, &cands, Direction::Left), Some(0));
        assert_eq!(neighbour(cands[2].1, &cands, Direction::Up), Some(1));
        assert_eq!(neighbour(cands[0].1, &cands, Direction::Left), None);
    }
}
