//! Colors as they appear in attributes: `#rrggbb`, `#rrggbbaa` or a color name. Names missing
//! from the table below are resolved by the display server.
//! Internally X wants them as a pixel value in ARGB format.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::errors::ParseColorError;

const OPAQUE: u8 = 255;

/// A few of the names from X's rgb.txt, enough for the usual autostart files
const NAMED: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("purple", [160, 32, 240]),
    ("gray", [190, 190, 190]),
    ("grey", [190, 190, 190]),
    ("darkgray", [169, 169, 169]),
    ("darkgrey", [169, 169, 169]),
    ("lightgray", [211, 211, 211]),
    ("lightgrey", [211, 211, 211]),
    ("navy", [0, 0, 128]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Color {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Color {
    pub(crate) const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: OPAQUE,
        }
    }

    pub(crate) fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError {
            color: s.to_string(),
        };
        let s = s.trim();
        let hex = match s.strip_prefix('#') {
            Some(hex) => hex,
            None => {
                let name = s.to_ascii_lowercase().replace(' ', "");
                return NAMED
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, [r, g, b])| Color::new(*r, *g, *b))
                    .ok_or_else(err);
            }
        };
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                red: byte(0)?,
                green: byte(2)?,
                blue: byte(4)?,
                alpha: byte(6)?,
            }),
            _ => Err(err()),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)?;
        if self.alpha != OPAQUE {
            write!(f, "{:02x}", self.alpha)?;
        }
        Ok(())
    }
}

impl From<Color> for u32 {
    fn from(c: Color) -> Self {
        Self::from_be_bytes([c.alpha, c.red, c.green, c.blue])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        let c: Color = "#9FBC00".parse().unwrap();
        assert_eq!(c.to_string(), "#9fbc00");
        let c: Color = "#9fbc00ff".parse().unwrap();
        assert_eq!(c.to_string(), "#9fbc00");
        let c: Color = "#9fbc0080".parse().unwrap();
        assert_eq!(c.to_string(), "#9fbc0080");
    }

    #[test]
    fn named_and_invalid() {
        assert_eq!("red".parse::<Color>(), Ok(Color::new(255, 0, 0)));
        assert_eq!("Light Gray".parse::<Color>(), Ok(Color::new(211, 211, 211)));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
        assert!("notacolor".parse::<Color>().is_err());
    }

    #[test]
    fn pixel_value() {
        assert_eq!(u32::from(Color::new(0, 0, 255)), 0xff0000ff);
    }
}
