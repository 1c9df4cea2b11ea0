// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore clocal tcgetattr tcsetattr tcsadrain tcsanow tiocgwinsz tiocswinsz ispeed ospeed

mod apply;
mod error;
mod flags;
mod mode;
mod print;

use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};
use nix::libc::{c_ushort, O_NONBLOCK, TIOCGWINSZ, TIOCSWINSZ};
use nix::sys::termios::{tcgetattr, tcsetattr, BaudRate, SetArg};
use nix::{ioctl_read_bad, ioctl_write_ptr_bad};
use std::fs::File;
use std::io::{self, Stdin};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use uucore::error::{UResult, UUsageError};
use uucore::{format_usage, help_about, help_usage};

use crate::apply::{apply_setting, ArgsUsed, Pending};
use crate::error::SttyError;
use crate::flags::baud_to_str;
use crate::mode::{encode_token, TermMode};
use crate::print::{print_settings, TokenWriter};

const USAGE: &str = help_usage!("stty.md");
const SUMMARY: &str = help_about!("stty.md");

mod options {
    pub const ALL: &str = "all";
    pub const SAVE: &str = "save";
    pub const FILE: &str = "file";
    pub const SETTINGS: &str = "settings";
}

struct Options<'a> {
    all: bool,
    save: bool,
    file: Device,
    settings: Option<Vec<&'a str>>,
}

enum Device {
    File(File),
    Stdin(Stdin),
}

impl AsFd for Device {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::File(f) => f.as_fd(),
            Self::Stdin(stdin) => stdin.as_fd(),
        }
    }
}

impl AsRawFd for Device {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Self::File(f) => f.as_raw_fd(),
            Self::Stdin(stdin) => stdin.as_raw_fd(),
        }
    }
}

impl<'a> Options<'a> {
    fn from(matches: &'a ArgMatches) -> io::Result<Self> {
        Ok(Self {
            all: matches.get_flag(options::ALL),
            save: matches.get_flag(options::SAVE),
            file: match matches.get_one::<String>(options::FILE) {
                // Two notes here:
                // 1. O_NONBLOCK is needed because a POSIX tty can block on
                //    open waiting for carrier-detect when "clocal" is not
                //    set.
                // 2. The FD is never closed explicitly; the OS reclaims it
                //    on exit.
                Some(f) => Device::File(
                    std::fs::OpenOptions::new()
                        .read(true)
                        .custom_flags(O_NONBLOCK)
                        .open(f)?,
                ),
                None => Device::Stdin(io::stdin()),
            },
            settings: matches
                .get_many::<String>(options::SETTINGS)
                .map(|v| v.map(|s| s.as_ref()).collect()),
        })
    }
}

// Needs to be repr(C) because we pass it to the ioctl calls.
#[repr(C)]
#[derive(Default, Debug)]
pub struct TermSize {
    rows: c_ushort,
    columns: c_ushort,
    x: c_ushort,
    y: c_ushort,
}

ioctl_read_bad!(
    /// Get terminal window size
    tiocgwinsz,
    TIOCGWINSZ,
    TermSize
);

ioctl_write_ptr_bad!(
    /// Set terminal window size
    tiocswinsz,
    TIOCSWINSZ,
    TermSize
);

#[uucore::main]
pub fn uumain(args: impl uucore::Args) -> UResult<()> {
    let matches = uu_app().try_get_matches_from(args)?;

    let opts = Options::from(&matches)?;

    stty(&opts)
}

fn stty(opts: &Options) -> UResult<()> {
    if opts.save && opts.all {
        return Err(UUsageError::new(
            1,
            "the options for verbose and stty-readable output styles are mutually exclusive",
        ));
    }

    if opts.settings.is_some() && (opts.save || opts.all) {
        return Err(UUsageError::new(
            1,
            "when specifying an output style, modes may not be set",
        ));
    }

    let termios = tcgetattr(opts.file.as_fd()).map_err(|source| SttyError::Os {
        operation: "tcgetattr",
        source,
    })?;
    let baseline = TermMode::from_termios(&termios);
    let mut mode = baseline.clone();
    let mut pending = Pending::default();

    if let Some(settings) = &opts.settings {
        let mut k = 0;
        while k < settings.len() {
            let next = settings.get(k + 1).copied();
            k += match apply_setting(&mut mode, &mut pending, settings[k], next)? {
                ArgsUsed::One => 1,
                ArgsUsed::Two => 2,
            };
        }
    }

    if mode != baseline {
        let mut updated = termios.clone();
        mode.store(&mut updated)?;
        let when = if pending.drain {
            SetArg::TCSADRAIN
        } else {
            SetArg::TCSANOW
        };
        tcsetattr(opts.file.as_fd(), when, &updated).map_err(|source| SttyError::Os {
            operation: "tcsetattr",
            source,
        })?;

        // The call succeeds even when only some of the attributes took
        // effect, so read everything back and compare.
        let verify = tcgetattr(opts.file.as_fd()).map_err(|source| SttyError::Os {
            operation: "tcgetattr",
            source,
        })?;
        if TermMode::from_termios(&verify) != mode {
            return Err(SttyError::ApplyVerification.into());
        }
    }

    if pending.rows.is_some() || pending.columns.is_some() {
        let mut size = window_size(&opts.file)?;
        if let Some(rows) = pending.rows {
            size.rows = rows;
        }
        if let Some(columns) = pending.columns {
            size.columns = columns;
        }
        unsafe { tiocswinsz(opts.file.as_raw_fd(), &size as *const _) }.map_err(|source| {
            SttyError::Os {
                operation: "TIOCSWINSZ",
                source,
            }
        })?;
    }

    if opts.save {
        println!("{}", encode_token(&mode));
    }

    if pending.print_size {
        let size = window_size(&opts.file)?;
        println!("{} {}", size.rows, size.columns);
    }

    if pending.print_speed {
        if mode.ispeed == BaudRate::B0 || mode.ispeed == mode.ospeed {
            println!("{}", baud_to_str(mode.ospeed));
        } else {
            println!("{} {}", baud_to_str(mode.ispeed), baud_to_str(mode.ospeed));
        }
    }

    if opts.settings.is_none() && !opts.save {
        let winsize = if opts.all {
            let size = window_size(&opts.file)?;
            Some((size.rows, size.columns))
        } else {
            None
        };
        let stdout = io::stdout().lock();
        let mut out = TokenWriter::new(stdout, TokenWriter::<io::StdoutLock>::terminal_width());
        print_settings(&mut out, &mode, winsize, opts.all)?;
    }

    Ok(())
}

fn window_size(device: &Device) -> Result<TermSize, SttyError> {
    let mut size = TermSize::default();
    unsafe { tiocgwinsz(device.as_raw_fd(), &mut size as *mut _) }.map_err(|source| {
        SttyError::Os {
            operation: "TIOCGWINSZ",
            source,
        }
    })?;
    Ok(size)
}

pub fn uu_app() -> Command {
    Command::new(uucore::util_name())
        .version(crate_version!())
        .override_usage(format_usage(USAGE))
        .about(SUMMARY)
        .infer_long_args(true)
        .arg(
            Arg::new(options::ALL)
                .short('a')
                .long(options::ALL)
                .help("print all current settings in human-readable form")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::SAVE)
                .short('g')
                .long(options::SAVE)
                .help("print all current settings in a stty-readable form")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::FILE)
                .short('F')
                .long(options::FILE)
                .value_hint(clap::ValueHint::FilePath)
                .value_name("DEVICE")
                .help("open and use the specified DEVICE instead of stdin"),
        )
        .arg(
            Arg::new(options::SETTINGS)
                .action(ArgAction::Append)
                // Allows e.g. "stty -ixon" to work
                .allow_hyphen_values(true)
                .help("settings to change"),
        )
}
