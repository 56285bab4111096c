// seqbind-runtime: support library for generated caller stubs and callee
// dispatchers. Generated code only uses the items re-exported here.

pub mod error;
pub mod buffer;
pub mod dispatch;
pub mod ref_table;
pub mod proxy;
pub mod transport;
pub mod ffi_guard;
pub mod ffi;

pub use error::{
    contract_violation, failure_message, BindError, BindResult, CallError, WireError,
};
pub use buffer::Buffer;
pub use dispatch::{dispatch, register, try_register, Handler, HandlerRegistration};
pub use ref_table::{lock, read, refs, share, RefTable, RefTarget, Shared};
pub use proxy::{proxies, proxy_for, Proxy, ProxyRegistry, ProxyWrapper};
pub use transport::{install_transport, release, send, LocalTransport, Transport};
pub use ffi_guard::fatal_boundary;

// Generated dispatchers submit registrations through this re-export, so a
// bound package does not need its own inventory dependency.
pub use inventory;

pub use seqbind_ffi::{RefNum, WireType};
