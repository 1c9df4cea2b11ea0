// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore ispeed ospeed

//! Human-readable rendering of the attribute model.

use std::io::{self, Write};

use nix::sys::termios::SpecialCharacterIndices as V;
use nix::sys::termios::{BaudRate, LocalFlags};
use terminal_size::{terminal_size, Width};

use crate::flags::{
    baud_to_str, line_to_str, Flag, ModeFlag, CONTROL_CHARS, CONTROL_FLAGS, INPUT_FLAGS,
    LOCAL_FLAGS, OUTPUT_FLAGS,
};
use crate::mode::{TermMode, DISABLED_CHAR};

/// Emits `name;`-style tokens separated by single spaces, wrapped to a
/// fixed width. One writer is built per rendering and discarded with it;
/// the line cursor never outlives a rendering session.
pub struct TokenWriter<W: Write> {
    out: W,
    width: usize,
    column: usize,
}

impl<W: Write> TokenWriter<W> {
    pub fn new(out: W, width: Option<usize>) -> Self {
        Self {
            out,
            width: width.unwrap_or(usize::MAX),
            column: 0,
        }
    }

    /// Wrap width of the attached terminal, ignoring implausibly narrow
    /// reports the way historical implementations do.
    pub fn terminal_width() -> Option<usize> {
        terminal_size()
            .map(|(Width(w), _)| w as usize)
            .filter(|w| *w > 40)
    }

    pub fn token(&mut self, text: &str) -> io::Result<()> {
        if self.column + usize::from(self.column > 0) + text.len() > self.width {
            writeln!(self.out)?;
            self.column = 0;
        } else if self.column > 0 {
            write!(self.out, " ")?;
            self.column += 1;
        }
        write!(self.out, "{text}")?;
        self.column += text.len();
        Ok(())
    }

    /// Close the current line, if any tokens were written to it.
    pub fn end_line(&mut self) -> io::Result<()> {
        if self.column > 0 {
            writeln!(self.out)?;
            self.column = 0;
        }
        Ok(())
    }
}

/// Render the model, either fully (`all`) or as a diff against the
/// conventional defaults. The window size is shown only when `all` and is
/// supplied by the caller so that rendering itself never touches a device.
pub fn print_settings<W: Write>(
    out: &mut TokenWriter<W>,
    mode: &TermMode,
    winsize: Option<(u16, u16)>,
    all: bool,
) -> io::Result<()> {
    if mode.ispeed == BaudRate::B0 || mode.ispeed == mode.ospeed {
        if all || mode.ospeed != BaudRate::B38400 {
            out.token(&format!("speed {} baud;", baud_to_str(mode.ospeed)))?;
        }
    } else {
        out.token(&format!("ispeed {} baud;", baud_to_str(mode.ispeed)))?;
        out.token(&format!("ospeed {} baud;", baud_to_str(mode.ospeed)))?;
    }
    if all {
        if let Some((rows, columns)) = winsize {
            out.token(&format!("rows {rows};"))?;
            out.token(&format!("columns {columns};"))?;
        }
    }
    out.end_line()?;

    if all || mode.line != 0 {
        match line_to_str(mode.line) {
            Some(name) => out.token(&format!("line = {name};"))?,
            None => out.token(&format!("line = {};", mode.line))?,
        }
    }
    let canon = mode.local.contains(LocalFlags::ICANON);
    if all || (mode.cc(V::VMIN) != 1 && !canon) {
        out.token(&format!("min = {};", mode.cc(V::VMIN)))?;
    }
    if all || (mode.cc(V::VTIME) != 0 && !canon) {
        out.token(&format!("time = {};", mode.cc(V::VTIME)))?;
    }
    out.end_line()?;

    for def in &CONTROL_CHARS {
        let value = mode.chars[def.index as usize];
        if all || value != def.sane {
            out.token(&format!("{} = {};", def.name, control_char_to_string(value)))?;
        }
    }
    out.end_line()?;

    print_flags(out, mode, &CONTROL_FLAGS, all)?;
    print_flags(out, mode, &INPUT_FLAGS, all)?;
    print_flags(out, mode, &OUTPUT_FLAGS, all)?;
    print_flags(out, mode, &LOCAL_FLAGS, all)?;
    out.end_line()?;

    Ok(())
}

fn print_flags<W: Write, T: ModeFlag>(
    out: &mut TokenWriter<W>,
    mode: &TermMode,
    flags: &[Flag<T>],
    all: bool,
) -> io::Result<()> {
    for &Flag {
        name,
        flag,
        group,
        show,
        toggle,
        default_on,
        ..
    } in flags
    {
        if !show {
            continue;
        }
        if flag.is_in(mode, group) {
            if all || !default_on {
                out.token(name)?;
            }
        } else if toggle && (all || default_on) {
            out.token(&format!("-{name}"))?;
        }
    }
    Ok(())
}

/// Printable form of one control character: `undef`, caret notation for
/// controls and DEL, the character itself, or an `M-` form for the
/// high-bit range.
pub fn control_char_to_string(cc: u8) -> String {
    if cc == DISABLED_CHAR {
        return "undef".to_string();
    }
    let (meta_prefix, code) = if cc >= 0x80 { ("M-", cc - 0x80) } else { ("", cc) };
    let (ctrl_prefix, character) = match code {
        0..=0x1f => ("^", (b'@' + code) as char),
        0x7f => ("^", '?'),
        _ => ("", code as char),
    };
    format!("{meta_prefix}{ctrl_prefix}{character}")
}
