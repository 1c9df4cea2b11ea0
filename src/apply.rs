// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore decctlq tcsetattr

//! Resolution of command-line operands against the registries.

use nix::sys::termios::SpecialCharacterIndices as V;

use crate::error::SttyError;
use crate::flags::{
    parse_speed, Combo, Flag, IntSetter, ModeFlag, ModeGroups, COMBINATION_MODES, CONTROL_CHARS,
    CONTROL_FLAGS, INPUT_FLAGS, INT_SETTINGS, LINE_DISCIPLINES, LOCAL_FLAGS, OUTPUT_FLAGS,
};
use crate::mode::{decode_token, TermMode, DISABLED_CHAR};

/// How much of the argument stream a setting consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgsUsed {
    One,
    Two,
}

/// Effects recorded while operands resolve. Window-size edits and output
/// requests are deferred so that no device state changes before the whole
/// command line has been accepted.
#[derive(Clone, Debug)]
pub struct Pending {
    pub rows: Option<u16>,
    pub columns: Option<u16>,
    pub print_size: bool,
    pub print_speed: bool,
    /// Wait for pending output before applying attributes.
    pub drain: bool,
}

impl Default for Pending {
    fn default() -> Self {
        Self {
            rows: None,
            columns: None,
            print_size: false,
            print_speed: false,
            drain: true,
        }
    }
}

/// Resolve one operand, mutating the working model and the pending effects.
///
/// Registries are tried in a fixed order: saved-state token, flags and
/// combination modes, control characters, integer-valued settings, the
/// `line` discipline, and finally bare speed names. The first registry
/// recognizing the name wins.
pub fn apply_setting(
    mode: &mut TermMode,
    pending: &mut Pending,
    setting: &str,
    next: Option<&str>,
) -> Result<ArgsUsed, SttyError> {
    if let Some(hex) = setting.strip_prefix('=') {
        *mode = decode_token(hex)?;
        return Ok(ArgsUsed::One);
    }

    let (remove, name) = match setting.strip_prefix('-') {
        Some(st) => (true, st),
        None => (false, setting),
    };

    if apply_flag(mode, &CONTROL_FLAGS, name, remove)
        || apply_flag(mode, &INPUT_FLAGS, name, remove)
        || apply_flag(mode, &OUTPUT_FLAGS, name, remove)
        || apply_flag(mode, &LOCAL_FLAGS, name, remove)
        || apply_combination(mode, name, remove)
        || apply_special(pending, name, remove)
    {
        return Ok(ArgsUsed::One);
    }

    if apply_control_char(mode, setting, next)? {
        return Ok(ArgsUsed::Two);
    }
    if apply_int_setting(mode, pending, setting, next)? {
        return Ok(ArgsUsed::Two);
    }
    if setting == "line" {
        apply_line(mode, setting, next)?;
        return Ok(ArgsUsed::Two);
    }

    if let Some(baud) = parse_speed(setting) {
        mode.ispeed = baud;
        mode.ospeed = baud;
        return Ok(ArgsUsed::One);
    }

    Err(SttyError::UnrecognizedOperand(setting.to_string()))
}

fn apply_flag<T: ModeFlag>(
    mode: &mut TermMode,
    flags: &[Flag<T>],
    input: &str,
    remove: bool,
) -> bool {
    for &Flag {
        name,
        flag,
        group,
        toggle,
        ..
    } in flags
    {
        if input == name {
            // Operands without a `-` form fall through to the final
            // unrecognized-operand failure, exactly as an unknown name.
            if remove && !toggle {
                return false;
            }
            if let Some(group) = group {
                group.apply(mode, false);
            }
            flag.apply(mode, !remove);
            return true;
        }
    }
    false
}

/// Expand a combination mode over the primitive registries.
///
/// The clear tags are walked first with the opposite polarity, then the set
/// tags with the requested one, so the set phase wins where both select the
/// same flag. The mode's own adjustment runs last.
fn apply_combination(mode: &mut TermMode, name: &str, remove: bool) -> bool {
    let Some(&Combo {
        set,
        clear,
        fun,
        toggle,
        ..
    }) = COMBINATION_MODES.iter().find(|combo| combo.name == name)
    else {
        return false;
    };
    if remove && !toggle {
        return false;
    }
    if !clear.is_empty() {
        apply_tagged(mode, clear, !remove);
    }
    if !set.is_empty() {
        apply_tagged(mode, set, remove);
    }
    if let Some(fun) = fun {
        fun(remove, mode);
    }
    true
}

fn apply_tagged(mode: &mut TermMode, tags: ModeGroups, remove: bool) {
    fn scan<T: ModeFlag>(mode: &mut TermMode, flags: &[Flag<T>], tags: ModeGroups, remove: bool) {
        for flag in flags {
            if flag.tags.intersects(tags) {
                if let Some(group) = flag.group {
                    group.apply(mode, false);
                }
                flag.flag.apply(mode, !remove);
            }
        }
    }
    scan(mode, &CONTROL_FLAGS, tags, remove);
    scan(mode, &INPUT_FLAGS, tags, remove);
    scan(mode, &OUTPUT_FLAGS, tags, remove);
    scan(mode, &LOCAL_FLAGS, tags, remove);
}

fn apply_special(pending: &mut Pending, name: &str, remove: bool) -> bool {
    match name {
        "drain" => {
            pending.drain = !remove;
            true
        }
        "size" if !remove => {
            pending.print_size = true;
            true
        }
        "speed" if !remove => {
            pending.print_speed = true;
            true
        }
        _ => false,
    }
}

fn apply_control_char(
    mode: &mut TermMode,
    setting: &str,
    next: Option<&str>,
) -> Result<bool, SttyError> {
    let Some(def) = CONTROL_CHARS.iter().find(|cc| cc.name == setting) else {
        return Ok(false);
    };
    let arg = next.ok_or_else(|| SttyError::MissingArgument(setting.to_string()))?;
    mode.chars[def.index as usize] = control_char_value(setting, arg)?;
    Ok(true)
}

/// Parse a control-character value: `^-`/`undef`, `^?`, a literal
/// character, a `^X` control encoding, or a number in [0, 255] with
/// C-style radix detection.
fn control_char_value(operand: &str, arg: &str) -> Result<u8, SttyError> {
    if arg == "^-" || arg == "undef" {
        return Ok(DISABLED_CHAR);
    }
    if arg == "^?" {
        return Ok(0x7f);
    }
    match arg.as_bytes() {
        [] => Ok(0),
        [byte] => Ok(*byte),
        [b'^', byte] => Ok(*byte & !0x60),
        _ => parse_any_radix(arg, 255)
            .map(|value| value as u8)
            .ok_or_else(|| SttyError::InvalidValue {
                operand: operand.to_string(),
                value: arg.to_string(),
            }),
    }
}

fn apply_int_setting(
    mode: &mut TermMode,
    pending: &mut Pending,
    setting: &str,
    next: Option<&str>,
) -> Result<bool, SttyError> {
    let Some((_, setter)) = INT_SETTINGS.iter().find(|(name, _)| *name == setting) else {
        return Ok(false);
    };
    let arg = next.ok_or_else(|| SttyError::MissingArgument(setting.to_string()))?;
    let invalid = || SttyError::InvalidValue {
        operand: setting.to_string(),
        value: arg.to_string(),
    };

    match setter {
        IntSetter::Rows => {
            pending.rows = Some(parse_dec(arg, u16::MAX as i64).ok_or_else(invalid)? as u16);
        }
        IntSetter::Columns => {
            pending.columns = Some(parse_dec(arg, u16::MAX as i64).ok_or_else(invalid)? as u16);
        }
        IntSetter::Min => {
            let value = parse_dec(arg, 255).ok_or_else(invalid)? as u8;
            mode.set_cc(V::VMIN, value);
        }
        IntSetter::Time => {
            let value = parse_dec(arg, 255).ok_or_else(invalid)? as u8;
            mode.set_cc(V::VTIME, value);
        }
        IntSetter::InputSpeed => {
            mode.ispeed = parse_speed(arg).ok_or_else(invalid)?;
        }
        IntSetter::OutputSpeed => {
            mode.ospeed = parse_speed(arg).ok_or_else(invalid)?;
        }
    }
    Ok(true)
}

fn apply_line(mode: &mut TermMode, setting: &str, next: Option<&str>) -> Result<(), SttyError> {
    let arg = next.ok_or_else(|| SttyError::MissingArgument(setting.to_string()))?;
    mode.line = match LINE_DISCIPLINES.iter().find(|line| line.name == arg) {
        Some(line) => line.number,
        None => parse_dec(arg, 255).ok_or_else(|| SttyError::InvalidValue {
            operand: setting.to_string(),
            value: arg.to_string(),
        })? as u8,
    };
    Ok(())
}

fn parse_dec(text: &str, max: i64) -> Option<i64> {
    text.parse::<i64>().ok().filter(|n| (0..=max).contains(n))
}

/// Number with C-style base detection: `0x` hex, leading-zero octal,
/// otherwise decimal.
fn parse_any_radix(text: &str, max: i64) -> Option<i64> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    i64::from_str_radix(digits, radix)
        .ok()
        .filter(|n| (0..=max).contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::sane_mode;
    use nix::sys::termios::{BaudRate, ControlFlags, InputFlags, LocalFlags, OutputFlags};

    fn resolve(mode: &mut TermMode, settings: &[&str]) -> Result<(), SttyError> {
        let mut pending = Pending::default();
        resolve_with(mode, &mut pending, settings)
    }

    fn resolve_with(
        mode: &mut TermMode,
        pending: &mut Pending,
        settings: &[&str],
    ) -> Result<(), SttyError> {
        let mut k = 0;
        while k < settings.len() {
            let next = settings.get(k + 1).copied();
            k += match apply_setting(mode, pending, settings[k], next)? {
                ArgsUsed::One => 1,
                ArgsUsed::Two => 2,
            };
        }
        Ok(())
    }

    #[test]
    fn character_size_group_is_exclusive() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["cs5", "cs7"]).unwrap();
        assert_eq!(mode.control & ControlFlags::CSIZE, ControlFlags::CS7);
        resolve(&mut mode, &["cs8"]).unwrap();
        assert_eq!(mode.control & ControlFlags::CSIZE, ControlFlags::CS8);
    }

    #[test]
    fn boolean_flags_toggle() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["-ixon", "ixoff"]).unwrap();
        assert!(!mode.input.contains(InputFlags::IXON));
        assert!(mode.input.contains(InputFlags::IXOFF));
        resolve(&mut mode, &["ixon", "-ixoff"]).unwrap();
        assert!(mode.input.contains(InputFlags::IXON));
        assert!(!mode.input.contains(InputFlags::IXOFF));
    }

    #[test]
    fn grouped_flags_reject_unset() {
        let mut mode = sane_mode();
        assert!(matches!(
            resolve(&mut mode, &["-cs8"]),
            Err(SttyError::UnrecognizedOperand(op)) if op == "-cs8"
        ));
    }

    #[test]
    fn aliases_reach_the_same_bit() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["tandem"]).unwrap();
        assert!(mode.input.contains(InputFlags::IXOFF));
        resolve(&mut mode, &["-hup"]).unwrap();
        assert!(!mode.control.contains(ControlFlags::HUPCL));
    }

    #[test]
    fn control_char_value_grammar() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["intr", "^c"]).unwrap();
        assert_eq!(mode.cc(V::VINTR), 0x03);
        resolve(&mut mode, &["intr", "undef"]).unwrap();
        assert_eq!(mode.cc(V::VINTR), DISABLED_CHAR);
        resolve(&mut mode, &["intr", "^?"]).unwrap();
        assert_eq!(mode.cc(V::VINTR), 127);
        resolve(&mut mode, &["eof", "q"]).unwrap();
        assert_eq!(mode.cc(V::VEOF), b'q');
        resolve(&mut mode, &["quit", "0x1c"]).unwrap();
        assert_eq!(mode.cc(V::VQUIT), 0x1c);
        resolve(&mut mode, &["quit", "034"]).unwrap();
        assert_eq!(mode.cc(V::VQUIT), 0o34);
        resolve(&mut mode, &["quit", "28"]).unwrap();
        assert_eq!(mode.cc(V::VQUIT), 28);
    }

    #[test]
    fn control_char_value_out_of_range() {
        let mut mode = sane_mode();
        assert!(matches!(
            resolve(&mut mode, &["intr", "300"]),
            Err(SttyError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_argument_is_fatal() {
        let mut mode = sane_mode();
        assert!(matches!(
            resolve(&mut mode, &["time"]),
            Err(SttyError::MissingArgument(op)) if op == "time"
        ));
    }

    #[test]
    fn unknown_operand_is_fatal() {
        let mut mode = sane_mode();
        assert!(matches!(
            resolve(&mut mode, &["garbage123"]),
            Err(SttyError::UnrecognizedOperand(op)) if op == "garbage123"
        ));
    }

    #[test]
    fn odd_length_token_is_fatal() {
        let mut mode = sane_mode();
        assert!(matches!(
            resolve(&mut mode, &["=1234"]),
            Err(SttyError::InvalidToken(_))
        ));
    }

    #[test]
    fn bare_speed_sets_both_directions() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["115200"]).unwrap();
        assert_eq!(mode.ispeed, BaudRate::B115200);
        assert_eq!(mode.ospeed, BaudRate::B115200);
    }

    #[test]
    fn ispeed_and_ospeed_are_independent() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["ispeed", "9600", "ospeed", "19200"]).unwrap();
        assert_eq!(mode.ispeed, BaudRate::B9600);
        assert_eq!(mode.ospeed, BaudRate::B19200);
        assert!(matches!(
            resolve(&mut mode, &["ispeed", "12345"]),
            Err(SttyError::InvalidValue { .. })
        ));
    }

    #[test]
    fn min_time_and_window_size() {
        let mut mode = sane_mode();
        let mut pending = Pending::default();
        resolve_with(
            &mut mode,
            &mut pending,
            &["min", "4", "time", "20", "rows", "50", "cols", "132"],
        )
        .unwrap();
        assert_eq!(mode.cc(V::VMIN), 4);
        assert_eq!(mode.cc(V::VTIME), 20);
        assert_eq!(pending.rows, Some(50));
        assert_eq!(pending.columns, Some(132));
    }

    #[test]
    fn line_discipline_by_name_and_number() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["line", "ppp"]).unwrap();
        assert_eq!(mode.line, 3);
        resolve(&mut mode, &["line", "42"]).unwrap();
        assert_eq!(mode.line, 42);
        assert!(matches!(
            resolve(&mut mode, &["line", "bogus"]),
            Err(SttyError::InvalidValue { .. })
        ));
    }

    #[test]
    fn raw_then_cooked_restores_tagged_flags() {
        let mut mode = sane_mode();
        let before = mode.clone();
        resolve(&mut mode, &["raw"]).unwrap();
        assert!(!mode.local.contains(LocalFlags::ICANON));
        assert!(!mode.local.contains(LocalFlags::ISIG));
        assert!(!mode.output.contains(OutputFlags::OPOST));
        assert_eq!(mode.input, InputFlags::empty());
        resolve(&mut mode, &["cooked"]).unwrap();
        assert_eq!(
            mode.local.contains(LocalFlags::ICANON),
            before.local.contains(LocalFlags::ICANON)
        );
        assert_eq!(
            mode.local.contains(LocalFlags::ISIG),
            before.local.contains(LocalFlags::ISIG)
        );
        assert_eq!(
            mode.output.contains(OutputFlags::OPOST),
            before.output.contains(OutputFlags::OPOST)
        );
        assert!(mode.input.contains(InputFlags::ICRNL));
        assert!(mode.input.contains(InputFlags::IXON));
    }

    #[test]
    fn sane_restores_defaults_from_a_scrambled_state() {
        let mut mode = sane_mode();
        resolve(
            &mut mode,
            &["-icanon", "-echo", "echonl", "tab3", "igncr", "intr", "^x", "min", "7"],
        )
        .unwrap();
        resolve(&mut mode, &["sane"]).unwrap();
        assert!(mode.local.contains(LocalFlags::ICANON));
        assert!(mode.local.contains(LocalFlags::ECHO));
        assert!(!mode.local.contains(LocalFlags::ECHONL));
        assert!(!mode.input.contains(InputFlags::IGNCR));
        assert_eq!(mode.output & OutputFlags::TABDLY, OutputFlags::TAB0);
        assert_eq!(mode.cc(V::VINTR), 0o3);
        assert_eq!(mode.cc(V::VMIN), 1);
        assert_eq!(mode.cc(V::VTIME), 0);
    }

    #[test]
    fn evenp_sets_seven_bits_with_parity() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["evenp"]).unwrap();
        assert_eq!(mode.control & ControlFlags::CSIZE, ControlFlags::CS7);
        assert!(mode.control.contains(ControlFlags::PARENB));
        assert!(!mode.control.contains(ControlFlags::PARODD));
        resolve(&mut mode, &["-evenp"]).unwrap();
        assert_eq!(mode.control & ControlFlags::CSIZE, ControlFlags::CS8);
        assert!(!mode.control.contains(ControlFlags::PARENB));
    }

    #[test]
    fn oddp_sets_odd_parity() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["oddp"]).unwrap();
        assert_eq!(mode.control & ControlFlags::CSIZE, ControlFlags::CS7);
        assert!(mode.control.contains(ControlFlags::PARENB));
        assert!(mode.control.contains(ControlFlags::PARODD));
    }

    #[test]
    fn dec_binds_keys_and_drops_ixany() {
        let mut mode = sane_mode();
        resolve(&mut mode, &["ixany", "intr", "^x"]).unwrap();
        resolve(&mut mode, &["dec"]).unwrap();
        assert!(!mode.input.contains(InputFlags::IXANY));
        assert_eq!(mode.cc(V::VINTR), 0o3);
        assert_eq!(mode.cc(V::VERASE), 0o177);
        assert_eq!(mode.cc(V::VKILL), 0o25);
    }

    #[test]
    fn unset_of_non_toggle_combination_is_rejected() {
        let mut mode = sane_mode();
        assert!(matches!(
            resolve(&mut mode, &["-sane"]),
            Err(SttyError::UnrecognizedOperand(op)) if op == "-sane"
        ));
    }

    #[test]
    fn specials_record_pending_effects() {
        let mut mode = sane_mode();
        let mut pending = Pending::default();
        resolve_with(&mut mode, &mut pending, &["size", "speed", "-drain"]).unwrap();
        assert!(pending.print_size);
        assert!(pending.print_speed);
        assert!(!pending.drain);
    }

    #[test]
    fn saved_token_replaces_the_model() {
        let mut source = sane_mode();
        resolve(&mut source, &["-ixon", "intr", "^a", "9600"]).unwrap();
        let token = crate::mode::encode_token(&source);
        let mut mode = sane_mode();
        resolve(&mut mode, &[token.as_str()]).unwrap();
        assert_eq!(mode, source);
    }
}
