// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! End-to-end tests against a real terminal. They need a usable
//! controlling tty and skip themselves when none is available.

use std::process::{Command, Output};

fn stty(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stty"))
        .args(args)
        .output()
        .expect("failed to spawn stty")
}

/// A `/dev/tty` that actually answers attribute requests, or `None`.
fn usable_tty() -> Option<&'static str> {
    let out = stty(&["-F", "/dev/tty", "-g"]);
    if out.status.success() {
        Some("/dev/tty")
    } else {
        eprintln!("no usable tty; skipping");
        None
    }
}

#[test]
fn save_and_restore_round_trip() {
    let Some(tty) = usable_tty() else { return };

    let out = stty(&["-F", tty, "-g"]);
    let token = String::from_utf8(out.stdout).unwrap().trim().to_string();
    assert!(token.starts_with('='));

    let applied = stty(&["-F", tty, &token]);
    assert!(applied.status.success());

    let again = stty(&["-F", tty, "-g"]);
    let token2 = String::from_utf8(again.stdout).unwrap().trim().to_string();
    assert_eq!(token, token2);
}

#[test]
fn invalid_operand_names_the_token() {
    let Some(tty) = usable_tty() else { return };

    let out = stty(&["-F", tty, "garbage123"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("invalid operand"));
    assert!(stderr.contains("garbage123"));
}

#[test]
fn truncated_token_is_rejected() {
    let Some(tty) = usable_tty() else { return };

    let out = stty(&["-F", tty, "=1234"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("invalid saved terminal state"));
}

#[test]
fn output_styles_are_mutually_exclusive() {
    let out = stty(&["-a", "-g"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("mutually exclusive"));
}
