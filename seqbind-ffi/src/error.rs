/// Status codes returned by the C ABI entry points.
///
/// Only argument problems are reported this way. A broken call contract
/// (unknown call site, bad reference) aborts the process instead.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqStatus {
    Ok = 0,
    NullArgument = 1,
    InvalidDescriptor = 2,
}
