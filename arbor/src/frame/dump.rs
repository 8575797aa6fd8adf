//! The textual layout format used by `dump` and `load`:
//!
//! ```text
//! (split horizontal:0.5:0 (clients max:0 0x1a00003 0x1c00003) (clients vertical:0))
//! ```

use std::fmt::Write;

use super::{Algorithm, Align, Frame, Leaf, Split, FRACTION_MAX, FRACTION_MIN};
use crate::{
    decimal::Decimal,
    errors::LayoutError,
    newtypes::{format_winid, parse_winid, FrameId},
};

pub(crate) fn dump(frame: &Frame) -> String {
    let mut out = String::new();
    dump_into(frame, &mut out);
    out
}

fn dump_into(frame: &Frame, out: &mut String) {
    match frame {
        Frame::Leaf(l) => {
            let _ = write!(out, "(clients {}:{}", l.algorithm, l.selection);
            for win in &l.clients {
                out.push(' ');
                out.push_str(&format_winid(*win));
            }
            out.push(')');
        }
        Frame::Split(s) => {
            let _ = write!(out, "(split {}:{}:{} ", s.align.name(), s.fraction, s.selection);
            dump_into(&s.children[0], out);
            out.push(' ');
            dump_into(&s.children[1], out);
            out.push(')');
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_space(&mut self) {
        while let Some(c) = self.text[self.pos..].chars().next() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Result<(), LayoutError> {
        self.skip_space();
        match self.peek() {
            Some(found) if found == c => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(LayoutError::new(
                self.pos,
                format!("Expected \"{}\" but got \"{}\"", c, found),
            )),
            None => Err(LayoutError::new(
                self.pos,
                format!("Expected \"{}\" but the layout ended", c),
            )),
        }
    }

    /// Read the next token, returns its start offset as well
    fn word(&mut self) -> Result<(usize, &'a str), LayoutError> {
        self.skip_space();
        let start = self.pos;
        let len = self.text[start..]
            .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .unwrap_or(self.text.len() - start);
        if len == 0 {
            return Err(LayoutError::new(start, "Expected a word"));
        }
        self.pos += len;
        Ok((start, &self.text[start..start + len]))
    }

    fn frame(&mut self) -> Result<Frame, LayoutError> {
        self.expect('(')?;
        let (start, kind) = self.word()?;
        let frame = match kind {
            "clients" => self.leaf()?,
            "split" => self.split()?,
            _ => {
                return Err(LayoutError::new(
                    start,
                    format!("Unknown frame type \"{}\"", kind),
                ))
            }
        };
        self.expect(')')?;
        Ok(frame)
    }

    fn leaf(&mut self) -> Result<Frame, LayoutError> {
        let (start, args) = self.word()?;
        let (algorithm, selection) = args
            .split_once(':')
            .ok_or_else(|| LayoutError::new(start, "Expected ALGORITHM:SELECTION"))?;
        let algorithm = algorithm
            .parse::<Algorithm>()
            .map_err(|e| LayoutError::new(start, e))?;
        let selection = selection.parse::<usize>().map_err(|_| {
            LayoutError::new(
                start + args.find(':').unwrap_or(0) + 1,
                format!("Invalid selection \"{}\"", selection),
            )
        })?;
        let mut leaf = Leaf::new(algorithm);
        leaf.selection = selection;
        loop {
            self.skip_space();
            match self.peek() {
                Some(')') | None => break,
                _ => {
                    let (start, win) = self.word()?;
                    let win = parse_winid(win).ok_or_else(|| {
                        LayoutError::new(start, format!("Invalid window id \"{}\"", win))
                    })?;
                    leaf.clients.push(win);
                }
            }
        }
        Ok(Frame::Leaf(leaf))
    }

    fn split(&mut self) -> Result<Frame, LayoutError> {
        let (start, args) = self.word()?;
        let mut parts = args.split(':');
        let bad = || LayoutError::new(start, "Expected ALIGN:FRACTION:SELECTION");
        let align = parts
            .next()
            .ok_or_else(bad)?
            .parse::<Align>()
            .map_err(|e| LayoutError::new(start, e))?;
        let fraction = parts
            .next()
            .ok_or_else(bad)?
            .parse::<Decimal>()
            .map_err(|e| LayoutError::new(start, e.to_string()))?;
        let selection = match parts.next().ok_or_else(bad)? {
            "0" => 0,
            "1" => 1,
            other => {
                return Err(LayoutError::new(
                    start,
                    format!("Invalid selection \"{}\", expected 0 or 1", other),
                ))
            }
        };
        if parts.next().is_some() {
            return Err(bad());
        }
        let first = self.frame()?;
        let second = self.frame()?;
        Ok(Frame::Split(Split {
            id: FrameId::next(),
            align,
            fraction: fraction.clamp(FRACTION_MIN, FRACTION_MAX),
            selection,
            children: Box::new([first, second]),
        }))
    }
}

/// Parse a layout. Window ids are taken as they are, the caller decides what to do with
/// unknown ones.
pub(crate) fn load(text: &str) -> Result<Frame, LayoutError> {
    let mut parser = Parser { text, pos: 0 };
    let frame = parser.frame()?;
    parser.skip_space();
    if parser.pos < text.len() {
        return Err(LayoutError::new(
            parser.pos,
            "Layout description is followed by further characters",
        ));
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_is_reproduced_by_load() {
        let layout = "(split horizontal:0.5:1 (clients max:0 0x1 0x2) (clients vertical:0))";
        let frame = load(layout).unwrap();
        assert_eq!(dump(&frame), layout);
    }

    #[test]
    fn whitespace_is_tolerated() {
        let text = "  ( split  vertical:0.3:0\n(clients grid:1 0x5 0x6)(clients max:0) ) ";
        let frame = load(text).unwrap();
        assert_eq!(
            dump(&frame),
            "(split vertical:0.3:0 (clients grid:1 0x5 0x6) (clients max:0))"
        );
    }

    #[test]
    fn errors_carry_the_offset() {
        assert_eq!(load("(clients foo:0)").unwrap_err().offset, 9);
        assert_eq!(load("(clients max:0 0x1 zz)").unwrap_err().offset, 19);
        assert_eq!(load("(clients max:0) x").unwrap_err().offset, 16);
        let err = load("(split horizontal:0.5:2 (clients max:0) (clients max:0))").unwrap_err();
        assert_eq!(err.offset, 7);
        assert_eq!(load("(clients max:0").unwrap_err().offset, 14);
        assert_eq!(load("(window max:0)").unwrap_err().offset, 1);
    }

    #[test]
    fn fractions_are_clamped() {
        let frame = load("(split horizontal:0.95:0 (clients max:0) (clients max:0))").unwrap();
        assert!(dump(&frame).starts_with("(split horizontal:0.9:0"));
    }
}
