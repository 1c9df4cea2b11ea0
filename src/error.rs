// This file is part of the uutils coreutils package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! Errors returned while resolving operands or talking to the terminal.

use thiserror::Error;
use uucore::display::Quotable;
use uucore::error::UError;

#[derive(Debug, Error)]
pub enum SttyError {
    /// The token matched no operand registry.
    #[error("invalid operand: {}", .0.quote())]
    UnrecognizedOperand(String),

    /// An operand requiring a value had no following token.
    #[error("missing argument for operand: {}", .0.quote())]
    MissingArgument(String),

    /// A control-character, integer, speed, or line argument failed its
    /// grammar or range check.
    #[error("invalid argument {} for operand {}", .value.quote(), .operand.quote())]
    InvalidValue { operand: String, value: String },

    /// A `=`-prefixed saved state had the wrong length or non-hex content.
    #[error("invalid saved terminal state: {}", .0.quote())]
    InvalidToken(String),

    /// A terminal attribute or window-size call failed.
    #[error("{operation}: {source}")]
    Os {
        operation: &'static str,
        source: nix::Error,
    },

    /// The device accepted the new attributes but a re-read disagreed.
    #[error("unable to apply all operands")]
    ApplyVerification,
}

impl UError for SttyError {
    fn code(&self) -> i32 {
        1
    }
}
