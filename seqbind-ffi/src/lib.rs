// seqbind-ffi: the caller <-> callee wire contract.
// Zero external dependencies. Both the generator and the runtime depend on this
// crate so that wire tags, handle encoding and call codes have one definition.

pub mod handles;
pub mod error;
pub mod wire;
pub mod codes;

pub use handles::*;
pub use error::*;
pub use wire::*;
pub use codes::*;
