// Error types for the seqbind runtime.

use seqbind_ffi::RefNum;

/// Decode failure while reading a call buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("buffer underflow: need {needed} bytes at offset {offset}, {available} available")]
    Underflow {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("negative length prefix {0}")]
    NegativeLength(i32),
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Rich error type for runtime operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("call site {descriptor}:{code:#x} is already registered")]
    DuplicateCallSite { descriptor: String, code: i32 },
    #[error("call site {descriptor}:{code:#x} is not registered")]
    UnknownCallSite { descriptor: String, code: i32 },
    #[error("unknown object reference {0}")]
    UnknownRef(RefNum),
    #[error("object reference {num} holds a {actual}, expected {expected}")]
    RefTypeMismatch {
        num: RefNum,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("null object reference where an object was required")]
    NullRef,
    #[error("a transport is already installed")]
    TransportInstalled,
}

/// Convenience alias used throughout the runtime.
pub type BindResult<T> = Result<T, BindError>;

/// Failure reported by the callee through a call's failure channel.
///
/// This is an ordinary outcome of a call, not a binding bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallError {
    message: String,
}

impl CallError {
    pub fn new(message: impl Into<String>) -> Self {
        CallError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure channel text for a native error. Never empty: an empty message
/// would read as success on the caller side.
pub fn failure_message(err: &dyn std::fmt::Display) -> String {
    let msg = err.to_string();
    if msg.is_empty() { "error".to_string() } else { msg }
}

/// Abort the current call on a broken caller/callee contract.
///
/// Reached when the two stub halves disagree (unknown call site, wrong
/// object type behind a reference, truncated buffer). Such a state is not
/// recoverable, so this logs and panics rather than returning an error.
#[cold]
#[track_caller]
pub fn contract_violation(err: BindError) -> ! {
    tracing::error!(error = %err, "seqbind contract violation");
    panic!("seqbind contract violation: {err}");
}
