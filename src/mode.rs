// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (vars) cflag iflag lflag oflag ispeed ospeed cfgetispeed cfgetospeed cfsetispeed cfsetospeed

//! The in-memory terminal attribute model and its saved-state token form.

use nix::libc;
use nix::sys::termios::{
    cfgetispeed, cfgetospeed, cfsetispeed, cfsetospeed, BaudRate, ControlFlags, InputFlags,
    LocalFlags, OutputFlags, SpecialCharacterIndices, Termios,
};

use crate::error::SttyError;
use crate::flags::{baud_to_rate, rate_to_baud};

pub const NCCS: usize = libc::NCCS;

/// Value of a disabled control-character slot (`_POSIX_VDISABLE`).
pub const DISABLED_CHAR: u8 = 0;

/// Byte length of the canonical model image: four flag words, the line
/// discipline, the control characters and both speed words.
pub const IMAGE_LEN: usize = 4 * 4 + 1 + NCCS + 2 * 4;

/// A terminal's attributes, detached from any file descriptor.
///
/// The baud bits the kernel keeps inside `c_cflag` are never part of
/// `control`; speed lives exclusively in `ispeed`/`ospeed` and is merged
/// back by [`TermMode::store`].
#[derive(Clone, Debug, PartialEq)]
pub struct TermMode {
    pub control: ControlFlags,
    pub input: InputFlags,
    pub output: OutputFlags,
    pub local: LocalFlags,
    pub chars: [u8; NCCS],
    pub ispeed: BaudRate,
    pub ospeed: BaudRate,
    pub line: u8,
}

impl TermMode {
    pub fn from_termios(termios: &Termios) -> Self {
        let raw: libc::termios = termios.clone().into();
        let mut chars = [0; NCCS];
        chars.copy_from_slice(&raw.c_cc);
        Self {
            control: ControlFlags::from_bits_truncate(raw.c_cflag & !(libc::CBAUD | libc::CIBAUD)),
            input: InputFlags::from_bits_truncate(raw.c_iflag),
            output: OutputFlags::from_bits_truncate(raw.c_oflag),
            local: LocalFlags::from_bits_truncate(raw.c_lflag),
            chars,
            ispeed: cfgetispeed(termios),
            ospeed: cfgetospeed(termios),
            line: raw.c_line,
        }
    }

    /// Write this model into `termios`. The flag words are stored first so
    /// that the speed setters can re-derive the kernel's baud bits.
    pub fn store(&self, termios: &mut Termios) -> Result<(), SttyError> {
        let mut raw: libc::termios = termios.clone().into();
        raw.c_cflag = self.control.bits();
        raw.c_iflag = self.input.bits();
        raw.c_oflag = self.output.bits();
        raw.c_lflag = self.local.bits();
        raw.c_cc = self.chars;
        raw.c_line = self.line;
        *termios = raw.into();
        cfsetispeed(termios, self.ispeed).map_err(|source| SttyError::Os {
            operation: "cfsetispeed",
            source,
        })?;
        cfsetospeed(termios, self.ospeed).map_err(|source| SttyError::Os {
            operation: "cfsetospeed",
            source,
        })?;
        Ok(())
    }

    pub fn cc(&self, index: SpecialCharacterIndices) -> u8 {
        self.chars[index as usize]
    }

    pub fn set_cc(&mut self, index: SpecialCharacterIndices, value: u8) {
        self.chars[index as usize] = value;
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(IMAGE_LEN);
        for word in [
            self.control.bits(),
            self.input.bits(),
            self.output.bits(),
            self.local.bits(),
        ] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.push(self.line);
        bytes.extend_from_slice(&self.chars);
        for speed in [self.ispeed, self.ospeed] {
            bytes.extend_from_slice(&baud_to_rate(speed).to_le_bytes());
        }
        bytes
    }
}

/// Render the model as its `=`-prefixed saved-state token.
pub fn encode_token(mode: &TermMode) -> String {
    let mut token = String::with_capacity(1 + 2 * IMAGE_LEN);
    token.push('=');
    for byte in mode.to_bytes() {
        token.push_str(&format!("{byte:02x}"));
    }
    token
}

/// Decode the hex payload of a saved-state token (without the leading `=`).
///
/// The exact inverse of [`encode_token`]: the payload must be twice the
/// image length and fully hexadecimal. Flag bits the platform does not
/// define are dropped; a speed word that names no supported rate is
/// rejected.
pub fn decode_token(hex: &str) -> Result<TermMode, SttyError> {
    if hex.len() != 2 * IMAGE_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SttyError::InvalidToken(format!("={hex}")));
    }

    let mut bytes = [0u8; IMAGE_LEN];
    for (dst, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
        *dst = hex_digit(pair[0]) << 4 | hex_digit(pair[1]);
    }

    let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let mut chars = [0; NCCS];
    chars.copy_from_slice(&bytes[17..17 + NCCS]);

    Ok(TermMode {
        control: ControlFlags::from_bits_truncate(word(0) & !(libc::CBAUD | libc::CIBAUD)),
        input: InputFlags::from_bits_truncate(word(4)),
        output: OutputFlags::from_bits_truncate(word(8)),
        local: LocalFlags::from_bits_truncate(word(12)),
        chars,
        ispeed: speed_from_word(word(17 + NCCS), hex)?,
        ospeed: speed_from_word(word(17 + NCCS + 4), hex)?,
        line: bytes[16],
    })
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

fn speed_from_word(word: u32, hex: &str) -> Result<BaudRate, SttyError> {
    rate_to_baud(word).ok_or_else(|| SttyError::InvalidToken(format!("={hex}")))
}

#[cfg(test)]
pub(crate) fn sane_mode() -> TermMode {
    use crate::flags::CONTROL_CHARS;
    use nix::sys::termios::SpecialCharacterIndices as V;

    let mut chars = [0; NCCS];
    for def in &CONTROL_CHARS {
        chars[def.index as usize] = def.sane;
    }
    chars[V::VMIN as usize] = 1;
    TermMode {
        control: ControlFlags::CS8 | ControlFlags::CREAD | ControlFlags::HUPCL,
        input: InputFlags::BRKINT
            | InputFlags::ICRNL
            | InputFlags::IXON
            | InputFlags::IMAXBEL
            | InputFlags::IUTF8,
        output: OutputFlags::OPOST | OutputFlags::ONLCR,
        local: LocalFlags::ISIG
            | LocalFlags::ICANON
            | LocalFlags::IEXTEN
            | LocalFlags::ECHO
            | LocalFlags::ECHOE
            | LocalFlags::ECHOK
            | LocalFlags::ECHOCTL
            | LocalFlags::ECHOKE,
        chars,
        ispeed: BaudRate::B38400,
        ospeed: BaudRate::B38400,
        line: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let mode = sane_mode();
        let token = encode_token(&mode);
        assert!(token.starts_with('='));
        assert_eq!(token.len(), 1 + 2 * IMAGE_LEN);
        let decoded = decode_token(&token[1..]).expect("valid token");
        assert_eq!(decoded, mode);
    }

    #[test]
    fn token_rejects_wrong_length() {
        assert!(matches!(
            decode_token("1234"),
            Err(SttyError::InvalidToken(_))
        ));
    }

    #[test]
    fn token_rejects_non_hex() {
        let bad = "g".repeat(2 * IMAGE_LEN);
        assert!(matches!(
            decode_token(&bad),
            Err(SttyError::InvalidToken(_))
        ));
    }

    #[test]
    fn token_drops_unknown_flag_bits() {
        let mode = sane_mode();
        let token = encode_token(&mode);
        // highest byte of the input word, bit 31: defined by no input flag
        let mut hex = token[1..].to_string();
        hex.replace_range(14..16, "80");
        let decoded = decode_token(&hex).expect("unknown bits are truncated");
        assert_eq!(decoded, mode);
    }

    #[test]
    fn token_rejects_bogus_speed() {
        let mode = sane_mode();
        let token = encode_token(&mode);
        let mut hex = token[1..].to_string();
        let at = 2 * (17 + NCCS);
        hex.replace_range(at..at + 8, "ffffffff");
        assert!(matches!(
            decode_token(&hex),
            Err(SttyError::InvalidToken(_))
        ));
    }
}
