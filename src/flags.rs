// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore parenb parodd cmspar hupcl cstopb cread clocal crtscts CSIZE
// spell-checker:ignore ignbrk brkint ignpar parmrk inpck istrip inlcr igncr icrnl ixoff ixon ixany imaxbel iutf
// spell-checker:ignore opost olcuc ocrnl onlcr onocr onlret ofill ofdel nldly crdly tabdly bsdly vtdly ffdly
// spell-checker:ignore isig icanon iexten echoe crterase echok echonl noflsh tostop echoprt prterase echoctl ctlecho echoke crtkill flusho extproc
// spell-checker:ignore lnext rprnt werase swtch vdiscard vintr vkill verase decctlq litout exta extb syncppp profibus smsblock hdlc

//! The operand registries: primitive flags with their capability tags,
//! combination modes, control characters, speeds and line disciplines.
//!
//! Every table is immutable, process-wide data; the resolver and the
//! display code only ever read them.

use nix::sys::termios::SpecialCharacterIndices as V;
use nix::sys::termios::{
    BaudRate, ControlFlags as C, InputFlags as I, LocalFlags as L, OutputFlags as O,
};

use crate::mode::{TermMode, DISABLED_CHAR};

/// Mode-group membership tags.
///
/// Combination modes select the primitive flags they expand over by these
/// tags. They are deliberately separate from each flag's display default,
/// even where the same names appear in both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeGroups(u16);

impl ModeGroups {
    pub const NONE: Self = Self(0);
    pub const SANE: Self = Self(1);
    pub const INSANE: Self = Self(1 << 1);
    pub const CBREAK: Self = Self(1 << 2);
    pub const DECCTLQ: Self = Self(1 << 3);
    pub const LCASE: Self = Self(1 << 4);
    pub const PASS8: Self = Self(1 << 5);
    pub const LITOUT: Self = Self(1 << 6);
    pub const CRT: Self = Self(1 << 7);
    pub const DEC: Self = Self(1 << 8);
    pub const NL: Self = Self(1 << 9);
    pub const COOKED: Self = Self(1 << 10);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One primitive flag operand.
#[derive(Clone, Copy, Debug)]
pub struct Flag<T> {
    pub name: &'static str,
    pub flag: T,
    /// Mutually exclusive group the flag belongs to; cleared before setting.
    pub group: Option<T>,
    /// Alternative spellings are hidden from the settings display.
    pub show: bool,
    /// Whether the operand accepts a `-` prefix.
    pub toggle: bool,
    /// Value under the conventional defaults, driving the diff display.
    pub default_on: bool,
    pub tags: ModeGroups,
}

impl<T> Flag<T> {
    pub const fn new(name: &'static str, flag: T) -> Self {
        Self {
            name,
            flag,
            group: None,
            show: true,
            toggle: true,
            default_on: false,
            tags: ModeGroups::NONE,
        }
    }

    pub const fn grouped(name: &'static str, flag: T, group: T) -> Self {
        Self {
            name,
            flag,
            group: Some(group),
            show: true,
            toggle: false,
            default_on: false,
            tags: ModeGroups::NONE,
        }
    }

    pub const fn hidden(mut self) -> Self {
        self.show = false;
        self
    }

    pub const fn sane(mut self) -> Self {
        self.default_on = true;
        self.tags = self.tags.union(ModeGroups::SANE);
        self
    }

    pub const fn insane(mut self) -> Self {
        self.tags = self.tags.union(ModeGroups::INSANE);
        self
    }

    pub const fn defaults_on(mut self) -> Self {
        self.default_on = true;
        self
    }

    pub const fn tagged(mut self, tags: ModeGroups) -> Self {
        self.tags = self.tags.union(tags);
        self
    }
}

/// Primitive flag application, generic over the four flag fields.
pub trait ModeFlag: Copy {
    fn is_in(&self, mode: &TermMode, group: Option<Self>) -> bool;
    fn apply(&self, mode: &mut TermMode, val: bool);
}

impl ModeFlag for C {
    fn is_in(&self, mode: &TermMode, group: Option<Self>) -> bool {
        mode.control.contains(*self) && group.map_or(true, |g| !mode.control.intersects(g - *self))
    }

    fn apply(&self, mode: &mut TermMode, val: bool) {
        mode.control.set(*self, val);
    }
}

impl ModeFlag for I {
    fn is_in(&self, mode: &TermMode, group: Option<Self>) -> bool {
        mode.input.contains(*self) && group.map_or(true, |g| !mode.input.intersects(g - *self))
    }

    fn apply(&self, mode: &mut TermMode, val: bool) {
        mode.input.set(*self, val);
    }
}

impl ModeFlag for O {
    fn is_in(&self, mode: &TermMode, group: Option<Self>) -> bool {
        mode.output.contains(*self) && group.map_or(true, |g| !mode.output.intersects(g - *self))
    }

    fn apply(&self, mode: &mut TermMode, val: bool) {
        mode.output.set(*self, val);
    }
}

impl ModeFlag for L {
    fn is_in(&self, mode: &TermMode, group: Option<Self>) -> bool {
        mode.local.contains(*self) && group.map_or(true, |g| !mode.local.intersects(g - *self))
    }

    fn apply(&self, mode: &mut TermMode, val: bool) {
        mode.local.set(*self, val);
    }
}

pub const CONTROL_FLAGS: [Flag<C>; 13] = [
    Flag::new("clocal", C::CLOCAL),
    Flag::new("cmspar", C::CMSPAR),
    Flag::new("cread", C::CREAD).sane(),
    Flag::new("crtscts", C::CRTSCTS),
    Flag::grouped("cs5", C::CS5, C::CSIZE),
    Flag::grouped("cs6", C::CS6, C::CSIZE),
    Flag::grouped("cs7", C::CS7, C::CSIZE),
    Flag::grouped("cs8", C::CS8, C::CSIZE).defaults_on(),
    Flag::new("cstopb", C::CSTOPB),
    Flag::new("hup", C::HUPCL).hidden(),
    Flag::new("hupcl", C::HUPCL).defaults_on(),
    Flag::new("parenb", C::PARENB).tagged(ModeGroups::PASS8.union(ModeGroups::LITOUT)),
    Flag::new("parodd", C::PARODD),
];

// iuclc is not exposed by nix
pub const INPUT_FLAGS: [Flag<I>; 15] = [
    Flag::new("brkint", I::BRKINT).sane(),
    Flag::new("icrnl", I::ICRNL).sane().tagged(ModeGroups::NL),
    Flag::new("ignbrk", I::IGNBRK).insane(),
    Flag::new("igncr", I::IGNCR).insane(),
    Flag::new("ignpar", I::IGNPAR),
    Flag::new("imaxbel", I::IMAXBEL).sane(),
    Flag::new("inlcr", I::INLCR).insane(),
    Flag::new("inpck", I::INPCK),
    Flag::new("istrip", I::ISTRIP).tagged(ModeGroups::PASS8.union(ModeGroups::LITOUT)),
    Flag::new("iutf8", I::IUTF8).sane(),
    Flag::new("ixany", I::IXANY).insane().tagged(ModeGroups::DECCTLQ),
    Flag::new("ixoff", I::IXOFF).insane(),
    Flag::new("ixon", I::IXON).defaults_on(),
    Flag::new("parmrk", I::PARMRK),
    Flag::new("tandem", I::IXOFF).hidden(),
];

pub const OUTPUT_FLAGS: [Flag<O>; 24] = [
    Flag::grouped("bs0", O::BS0, O::BSDLY).sane(),
    Flag::grouped("bs1", O::BS1, O::BSDLY).insane(),
    Flag::grouped("cr0", O::CR0, O::CRDLY).sane(),
    Flag::grouped("cr1", O::CR1, O::CRDLY).insane(),
    Flag::grouped("cr2", O::CR2, O::CRDLY).insane(),
    Flag::grouped("cr3", O::CR3, O::CRDLY).insane(),
    Flag::grouped("ff0", O::FF0, O::FFDLY).sane(),
    Flag::grouped("ff1", O::FF1, O::FFDLY).insane(),
    Flag::grouped("nl0", O::NL0, O::NLDLY).sane(),
    Flag::grouped("nl1", O::NL1, O::NLDLY).insane(),
    Flag::new("ocrnl", O::OCRNL).insane(),
    Flag::new("ofdel", O::OFDEL).insane(),
    // OFILL is not exposed by nix's OutputFlags; reconstruct it from the
    // libc bit, matching the from_bits idiom used elsewhere in the crate.
    Flag::new("ofill", O::from_bits_retain(nix::libc::OFILL as nix::libc::tcflag_t)).insane(),
    // xcase is not exposed by nix, so "lcase" covers the output side only
    Flag::new("olcuc", O::OLCUC).insane().tagged(ModeGroups::LCASE),
    Flag::new("onlcr", O::ONLCR).sane().tagged(ModeGroups::NL),
    Flag::new("onlret", O::ONLRET).insane(),
    Flag::new("onocr", O::ONOCR).insane(),
    Flag::new("opost", O::OPOST)
        .sane()
        .tagged(ModeGroups::LITOUT.union(ModeGroups::COOKED)),
    Flag::grouped("tab0", O::TAB0, O::TABDLY).sane(),
    Flag::grouped("tab1", O::TAB1, O::TABDLY).insane(),
    Flag::grouped("tab2", O::TAB2, O::TABDLY).insane(),
    Flag::grouped("tab3", O::TAB3, O::TABDLY).insane(),
    Flag::grouped("vt0", O::VT0, O::VTDLY).sane(),
    Flag::grouped("vt1", O::VT1, O::VTDLY).insane(),
];

pub const LOCAL_FLAGS: [Flag<L>; 18] = [
    Flag::new("crterase", L::ECHOE).hidden(),
    Flag::new("crtkill", L::ECHOKE).hidden(),
    Flag::new("ctlecho", L::ECHOCTL).hidden(),
    Flag::new("echo", L::ECHO).sane(),
    Flag::new("echoctl", L::ECHOCTL)
        .sane()
        .tagged(ModeGroups::CRT.union(ModeGroups::DEC)),
    Flag::new("echoe", L::ECHOE)
        .sane()
        .tagged(ModeGroups::CRT.union(ModeGroups::DEC)),
    Flag::new("echok", L::ECHOK).sane(),
    Flag::new("echoke", L::ECHOKE)
        .sane()
        .tagged(ModeGroups::CRT.union(ModeGroups::DEC)),
    Flag::new("echonl", L::ECHONL).insane(),
    Flag::new("echoprt", L::ECHOPRT).insane(),
    Flag::new("extproc", L::EXTPROC).insane(),
    Flag::new("flusho", L::FLUSHO).insane(),
    Flag::new("icanon", L::ICANON)
        .sane()
        .tagged(ModeGroups::CBREAK.union(ModeGroups::COOKED)),
    Flag::new("iexten", L::IEXTEN).sane(),
    Flag::new("isig", L::ISIG).sane().tagged(ModeGroups::COOKED),
    Flag::new("noflsh", L::NOFLSH).insane(),
    Flag::new("prterase", L::ECHOPRT).hidden(),
    Flag::new("tostop", L::TOSTOP).insane(),
];

type ComboFun = fn(bool, &mut TermMode);

/// A combination mode: expands over tagged primitive flags, in two phases,
/// optionally followed by its own adjustment.
#[derive(Clone, Copy)]
pub struct Combo {
    pub name: &'static str,
    /// Tags applied with the requested polarity, after `clear`.
    pub set: ModeGroups,
    /// Tags applied with the opposite polarity, first.
    pub clear: ModeGroups,
    pub fun: Option<ComboFun>,
    pub toggle: bool,
}

impl Combo {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            set: ModeGroups::NONE,
            clear: ModeGroups::NONE,
            fun: None,
            toggle: true,
        }
    }

    pub const fn sets(mut self, tags: ModeGroups) -> Self {
        self.set = tags;
        self
    }

    pub const fn clears(mut self, tags: ModeGroups) -> Self {
        self.clear = tags;
        self
    }

    pub const fn with(mut self, fun: ComboFun) -> Self {
        self.fun = Some(fun);
        self
    }

    pub const fn no_toggle(mut self) -> Self {
        self.toggle = false;
        self
    }
}

pub const COMBINATION_MODES: [Combo; 17] = [
    Combo::new("cbreak").clears(ModeGroups::CBREAK),
    Combo::new("cooked").sets(ModeGroups::COOKED).with(cooked),
    Combo::new("crt").sets(ModeGroups::CRT).no_toggle(),
    Combo::new("dec")
        .sets(ModeGroups::DEC)
        .clears(ModeGroups::DECCTLQ)
        .with(dec)
        .no_toggle(),
    Combo::new("decctlq").clears(ModeGroups::DECCTLQ),
    Combo::new("ek").with(ek).no_toggle(),
    Combo::new("evenp").with(evenp),
    Combo::new("LCASE").sets(ModeGroups::LCASE),
    Combo::new("lcase").sets(ModeGroups::LCASE),
    Combo::new("litout").clears(ModeGroups::LITOUT).with(pass8),
    Combo::new("nl").clears(ModeGroups::NL).with(nl),
    Combo::new("oddp").with(oddp),
    Combo::new("parity").with(evenp),
    Combo::new("pass8").clears(ModeGroups::PASS8).with(pass8),
    Combo::new("raw").clears(ModeGroups::COOKED).with(raw),
    Combo::new("sane")
        .sets(ModeGroups::SANE)
        .clears(ModeGroups::INSANE)
        .with(sane)
        .no_toggle(),
    Combo::new("tabs").with(tabs),
];

fn raw(unset: bool, mode: &mut TermMode) {
    if unset {
        mode.input |= I::BRKINT | I::IGNPAR | I::ISTRIP | I::ICRNL | I::IXON;
    } else {
        mode.input = I::empty();
        mode.set_cc(V::VMIN, 1);
        mode.set_cc(V::VTIME, 0);
    }
}

fn cooked(unset: bool, mode: &mut TermMode) {
    raw(!unset, mode);
}

fn evenp(unset: bool, mode: &mut TermMode) {
    mode.control -= C::CSIZE;
    if unset {
        mode.control -= C::PARENB;
        mode.control |= C::CS8;
    } else {
        mode.control -= C::PARODD;
        mode.control |= C::CS7 | C::PARENB;
    }
}

fn oddp(unset: bool, mode: &mut TermMode) {
    mode.control -= C::CSIZE;
    if unset {
        mode.control -= C::PARENB;
        mode.control |= C::CS8;
    } else {
        mode.control |= C::CS7 | C::PARODD | C::PARENB;
    }
}

fn pass8(unset: bool, mode: &mut TermMode) {
    mode.control -= C::CSIZE;
    mode.control |= if unset { C::CS7 } else { C::CS8 };
}

fn nl(unset: bool, mode: &mut TermMode) {
    if unset {
        mode.input -= I::INLCR | I::IGNCR;
        mode.output -= O::OCRNL | O::ONLRET;
    }
}

fn tabs(unset: bool, mode: &mut TermMode) {
    mode.output -= O::TABDLY;
    mode.output |= if unset { O::TAB3 } else { O::TAB0 };
}

fn dec(_unset: bool, mode: &mut TermMode) {
    restore_sane_chars(mode, &[V::VINTR, V::VKILL, V::VERASE]);
}

fn ek(_unset: bool, mode: &mut TermMode) {
    restore_sane_chars(mode, &[V::VERASE, V::VKILL]);
}

fn sane(_unset: bool, mode: &mut TermMode) {
    for def in &CONTROL_CHARS {
        mode.chars[def.index as usize] = def.sane;
    }
    mode.set_cc(V::VMIN, 1);
    mode.set_cc(V::VTIME, 0);
}

fn restore_sane_chars(mode: &mut TermMode, slots: &[V]) {
    for def in &CONTROL_CHARS {
        if slots.contains(&def.index) {
            mode.chars[def.index as usize] = def.sane;
        }
    }
}

/// One named control-character slot with its sane default value.
#[derive(Clone, Copy, Debug)]
pub struct ControlChar {
    pub name: &'static str,
    pub index: V,
    pub sane: u8,
}

impl ControlChar {
    const fn new(name: &'static str, index: V, sane: u8) -> Self {
        Self { name, index, sane }
    }
}

pub const CONTROL_CHARS: [ControlChar; 15] = [
    ControlChar::new("discard", V::VDISCARD, 0o17),
    ControlChar::new("eof", V::VEOF, 0o4),
    ControlChar::new("eol", V::VEOL, DISABLED_CHAR),
    ControlChar::new("eol2", V::VEOL2, DISABLED_CHAR),
    ControlChar::new("erase", V::VERASE, 0o177),
    ControlChar::new("intr", V::VINTR, 0o3),
    ControlChar::new("kill", V::VKILL, 0o25),
    ControlChar::new("lnext", V::VLNEXT, 0o26),
    ControlChar::new("quit", V::VQUIT, 0o34),
    ControlChar::new("rprnt", V::VREPRINT, 0o22),
    ControlChar::new("start", V::VSTART, 0o21),
    ControlChar::new("stop", V::VSTOP, 0o23),
    ControlChar::new("susp", V::VSUSP, 0o32),
    ControlChar::new("swtch", V::VSWTC, DISABLED_CHAR),
    ControlChar::new("werase", V::VWERASE, 0o27),
];

/// Destination of an operand carrying an integer or speed-name argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntSetter {
    Rows,
    Columns,
    Min,
    Time,
    InputSpeed,
    OutputSpeed,
}

pub const INT_SETTINGS: [(&str, IntSetter); 7] = [
    ("cols", IntSetter::Columns),
    ("columns", IntSetter::Columns),
    ("ispeed", IntSetter::InputSpeed),
    ("min", IntSetter::Min),
    ("ospeed", IntSetter::OutputSpeed),
    ("rows", IntSetter::Rows),
    ("time", IntSetter::Time),
];

#[derive(Clone, Copy, Debug)]
pub struct Speed {
    pub name: &'static str,
    pub baud: BaudRate,
    /// The plain numeric rate, also the wire form inside saved-state tokens.
    pub rate: u32,
}

impl Speed {
    const fn new(name: &'static str, baud: BaudRate, rate: u32) -> Self {
        Self { name, baud, rate }
    }
}

/// Supported rates. Aliases follow the canonical names so that a reverse
/// lookup by rate returns the canonical spelling.
pub const SPEEDS: [Speed; 34] = [
    Speed::new("0", BaudRate::B0, 0),
    Speed::new("50", BaudRate::B50, 50),
    Speed::new("75", BaudRate::B75, 75),
    Speed::new("110", BaudRate::B110, 110),
    Speed::new("134", BaudRate::B134, 134),
    Speed::new("150", BaudRate::B150, 150),
    Speed::new("200", BaudRate::B200, 200),
    Speed::new("300", BaudRate::B300, 300),
    Speed::new("600", BaudRate::B600, 600),
    Speed::new("1200", BaudRate::B1200, 1200),
    Speed::new("1800", BaudRate::B1800, 1800),
    Speed::new("2400", BaudRate::B2400, 2400),
    Speed::new("4800", BaudRate::B4800, 4800),
    Speed::new("9600", BaudRate::B9600, 9600),
    Speed::new("19200", BaudRate::B19200, 19200),
    Speed::new("38400", BaudRate::B38400, 38400),
    Speed::new("57600", BaudRate::B57600, 57600),
    Speed::new("115200", BaudRate::B115200, 115_200),
    Speed::new("230400", BaudRate::B230400, 230_400),
    Speed::new("460800", BaudRate::B460800, 460_800),
    Speed::new("500000", BaudRate::B500000, 500_000),
    Speed::new("576000", BaudRate::B576000, 576_000),
    Speed::new("921600", BaudRate::B921600, 921_600),
    Speed::new("1000000", BaudRate::B1000000, 1_000_000),
    Speed::new("1152000", BaudRate::B1152000, 1_152_000),
    Speed::new("1500000", BaudRate::B1500000, 1_500_000),
    Speed::new("2000000", BaudRate::B2000000, 2_000_000),
    Speed::new("2500000", BaudRate::B2500000, 2_500_000),
    Speed::new("3000000", BaudRate::B3000000, 3_000_000),
    Speed::new("3500000", BaudRate::B3500000, 3_500_000),
    Speed::new("4000000", BaudRate::B4000000, 4_000_000),
    Speed::new("134.5", BaudRate::B134, 134),
    Speed::new("exta", BaudRate::B19200, 19200),
    Speed::new("extb", BaudRate::B38400, 38400),
];

pub fn parse_speed(name: &str) -> Option<BaudRate> {
    SPEEDS
        .iter()
        .find(|speed| speed.name == name)
        .map(|speed| speed.baud)
}

pub fn baud_to_str(baud: BaudRate) -> &'static str {
    SPEEDS
        .iter()
        .find(|speed| speed.baud == baud)
        .map_or("0", |speed| speed.name)
}

pub fn baud_to_rate(baud: BaudRate) -> u32 {
    SPEEDS
        .iter()
        .find(|speed| speed.baud == baud)
        .map_or(0, |speed| speed.rate)
}

pub fn rate_to_baud(rate: u32) -> Option<BaudRate> {
    SPEEDS
        .iter()
        .find(|speed| speed.rate == rate)
        .map(|speed| speed.baud)
}

#[derive(Clone, Copy, Debug)]
pub struct LineDiscipline {
    pub name: &'static str,
    pub number: u8,
}

impl LineDiscipline {
    const fn new(name: &'static str, number: u8) -> Self {
        Self { name, number }
    }
}

pub const LINE_DISCIPLINES: [LineDiscipline; 16] = [
    LineDiscipline::new("tty", 0),
    LineDiscipline::new("slip", 1),
    LineDiscipline::new("mouse", 2),
    LineDiscipline::new("ppp", 3),
    LineDiscipline::new("strip", 4),
    LineDiscipline::new("ax25", 5),
    LineDiscipline::new("x25", 6),
    LineDiscipline::new("6pack", 7),
    LineDiscipline::new("masc", 8),
    LineDiscipline::new("r3964", 9),
    LineDiscipline::new("profibus", 10),
    LineDiscipline::new("irda", 11),
    LineDiscipline::new("smsblock", 12),
    LineDiscipline::new("hdlc", 13),
    LineDiscipline::new("syncppp", 14),
    LineDiscipline::new("hci", 15),
];

pub fn line_to_str(number: u8) -> Option<&'static str> {
    LINE_DISCIPLINES
        .iter()
        .find(|line| line.number == number)
        .map(|line| line.name)
}
