// seqbind-testpkg: a native package bound by seqbind, with both generated
// halves compiled into one crate and connected by the in-process transport.

pub mod native;

/// Dispatchers calling into [`native`]. They register themselves with the
/// runtime dispatch table at startup.
pub mod callee {
    include!(concat!(env!("OUT_DIR"), "/callee.rs"));
}

/// Stubs and wrapper types a caller uses to reach [`native`].
pub mod caller {
    include!(concat!(env!("OUT_DIR"), "/caller.rs"));
}

/// Call table manifest both halves were generated from.
pub const CODES_JSON: &str = include_str!(concat!(env!("OUT_DIR"), "/codes.json"));
