// Transport seam between generated caller stubs and the callee.
//
// Caller stubs never talk to the dispatch table directly. They hand their
// buffers to the process-wide transport, which delivers them to the callee
// and returns the response. Without an installed transport, calls are
// dispatched in-process.

use std::sync::OnceLock;

use seqbind_ffi::RefNum;

use crate::buffer::Buffer;
use crate::dispatch;
use crate::error::{BindError, BindResult};
use crate::ref_table::refs;

/// Delivers one synchronous call and releases callee references.
pub trait Transport: Send + Sync {
    /// Deliver `input` to the handler for (descriptor, code) and fill `output`
    /// with its response. Returns once the response is complete.
    fn send(&self, descriptor: &str, code: i32, input: &mut Buffer, output: &mut Buffer);

    /// Give back `crossings` observations of a callee object.
    fn release(&self, num: RefNum, crossings: u32);
}

/// Caller and callee in the same process, sharing the dispatch and reference
/// tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn send(&self, descriptor: &str, code: i32, input: &mut Buffer, output: &mut Buffer) {
        dispatch::dispatch(descriptor, code, output, input);
    }

    fn release(&self, num: RefNum, crossings: u32) {
        refs().release(num, crossings);
    }
}

static TRANSPORT: OnceLock<Box<dyn Transport>> = OnceLock::new();

/// Install the process-wide transport. Must happen before the first call;
/// a second install is rejected.
pub fn install_transport(transport: Box<dyn Transport>) -> BindResult<()> {
    TRANSPORT
        .set(transport)
        .map_err(|_| BindError::TransportInstalled)?;
    tracing::debug!("seqbind transport installed");
    Ok(())
}

fn transport() -> &'static dyn Transport {
    match TRANSPORT.get() {
        Some(t) => t.as_ref(),
        None => &LocalTransport,
    }
}

/// Issue one call through the installed transport.
pub fn send(descriptor: &str, code: i32, input: &mut Buffer, output: &mut Buffer) {
    transport().send(descriptor, code, input, output);
}

/// Release callee references through the installed transport.
pub fn release(num: RefNum, crossings: u32) {
    transport().release(num, crossings);
}
