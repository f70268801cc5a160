use std::fmt;

use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

/// Stable numeric codes carried by [`ScriptError`].
///
/// Codes are grouped by thousand: `1000` for script-level problems, `2000`
/// and up for parse-time problems. Callers branch on these numbers, so a
/// new condition gets a new code instead of reusing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// The script text is empty or only whitespace.
    Unassigned = 1000,
    InvalidOperatorForOperands = 2001,
    UnrecognizedComparativeExpression = 2002,
    UnrecognizedLeftOperand = 2003,
    UnrecognizedRightOperand = 2004,
    ExpectedComparisonOperator = 2005,
    UnresolvedSymbol = 2006,
    ExpectedIndexerKey = 2007,
    /// A string or list literal was opened but never properly closed.
    UnterminatedLiteral = 2008,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// A semantic scripting failure with a stable code.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("script error {code}: {message}")]
pub struct ScriptError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

// Define an enum to represent possible evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    // Structural problems found while scanning: unbalanced groups, dangling operators
    #[error("format error at {position}: {message} in `{fragment}`")]
    Format {
        message: String,
        fragment: String,
        position: usize,
    },

    // Coded semantic errors raised by the parser, operand parsers or contexts
    #[error(transparent)]
    Script(#[from] ScriptError),

    // Variant for errors that occur while running a script off-thread
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl EvalError {
    pub(crate) fn format(message: impl Into<String>, fragment: impl Into<String>, position: usize) -> Self {
        EvalError::Format {
            message: message.into(),
            fragment: fragment.into(),
            position,
        }
    }

    pub(crate) fn script(code: ErrorCode, message: impl Into<String>) -> Self {
        EvalError::Script(ScriptError::new(code, message))
    }

    /// The scripting code of this error, if it carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EvalError::Script(e) => Some(e.code),
            _ => None,
        }
    }
}

// Type alias for results that use `EvalError` as the error type
pub type Result<T> = std::result::Result<T, EvalError>;
