use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::errors::ParseRectError;

/// A rectangle in root window coordinates.
///
/// Sizes are signed so that intermediate layout arithmetic can go negative, [`Rect::clamped`]
/// brings them back into something X accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Rect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl Rect {
    pub(crate) fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub(crate) fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub(crate) fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Shrink the rectangle by `n` pixels on every side
    pub(crate) fn shrink(&self, n: i32) -> Self {
        Self {
            x: self.x + n,
            y: self.y + n,
            width: self.width - 2 * n,
            height: self.height - 2 * n,
        }
    }

    /// Cut the given amounts from the (up, right, down, left) sides
    pub(crate) fn pad(&self, pad: [i32; 4]) -> Self {
        let [up, right, down, left] = pad;
        Self {
            x: self.x + left,
            y: self.y + up,
            width: self.width - left - right,
            height: self.height - up - down,
        }
    }

    pub(crate) fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= x || bottom <= y {
            None
        } else {
            Some(Rect::new(x, y, right - x, bottom - y))
        }
    }

    /// Make sure the size is at least 1x1
    pub(crate) fn clamped(&self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
            ..*self
        }
    }

    /// Center a rectangle of this size inside `area`
    pub(crate) fn centered_in(&self, area: &Rect) -> Self {
        Self {
            x: area.x + (area.width - self.width) / 2,
            y: area.y + (area.height - self.height) / 2,
            width: self.width,
            height: self.height,
        }
    }
}

impl From<(i16, i16, u16, u16)> for Rect {
    fn from(r: (i16, i16, u16, u16)) -> Self {
        Self::new(r.0 as i32, r.1 as i32, r.2 as i32, r.3 as i32)
    }
}

/// Parses the X geometry format `WxH+X+Y`, where the offsets may also be negative
impl FromStr for Rect {
    type Err = ParseRectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRectError {
            rect: s.to_string(),
        };
        let s = s.trim();
        let offset_start = s.find(|c| c == '+' || c == '-').ok_or_else(err)?;
        let (size, offsets) = s.split_at(offset_start);
        let (width, height) = size.split_once('x').ok_or_else(err)?;
        let width = width.parse::<i32>().map_err(|_| err())?;
        let height = height.parse::<i32>().map_err(|_| err())?;

        // the second offset starts at the first sign after the leading one
        let second = offsets[1..]
            .find(|c| c == '+' || c == '-')
            .map(|i| i + 1)
            .ok_or_else(err)?;
        let (x, y) = offsets.split_at(second);
        let x = x.parse::<i32>().map_err(|_| err())?;
        let y = y.parse::<i32>().map_err(|_| err())?;
        Ok(Self::new(x, y, width, height))
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_geometry() {
        assert_eq!("800x600+10+20".parse::<Rect>(), Ok(Rect::new(10, 20, 800, 600)));
        assert_eq!("800x600-10-20".parse::<Rect>(), Ok(Rect::new(-10, -20, 800, 600)));
        assert!("800x600".parse::<Rect>().is_err());
        assert!("axb+1+2".parse::<Rect>().is_err());
        assert_eq!(Rect::new(-5, 3, 10, 10).to_string(), "10x10-5+3");
    }

    #[test]
    fn intersections() {
        let a = Rect::new(0, 0, 100, 100);
        assert_eq!(
            a.intersection(&Rect::new(50, 50, 100, 100)),
            Some(Rect::new(50, 50, 50, 50))
        );
        assert_eq!(a.intersection(&Rect::new(100, 0, 10, 10)), None);
    }

    #[test]
    fn padding() {
        let r = Rect::new(0, 0, 100, 100).pad([10, 0, 5, 20]);
        assert_eq!(r, Rect::new(20, 10, 80, 85));
    }
}
