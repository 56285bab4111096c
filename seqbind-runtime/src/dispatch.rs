// Dispatch table: maps (descriptor, code) -> generated callee handler.
//
// Generated dispatchers submit a `HandlerRegistration` through inventory. The
// table is built from those submissions the first time it is touched, so all
// generated handlers are registered before the first dispatch. Handlers can
// also be registered by hand (tests, hand-written bindings).

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::buffer::Buffer;
use crate::error::{contract_violation, BindError, BindResult};

/// Callee handler: decodes `in`, invokes the native declaration, encodes `out`.
/// Argument order is `(out, in)`.
pub type Handler = fn(&mut Buffer, &mut Buffer);

// ---------------------------------------------------------------------------
// Inventory-based auto-registration
// ---------------------------------------------------------------------------

/// Submitted by generated dispatcher code, one per call site.
pub struct HandlerRegistration {
    pub descriptor: &'static str,
    pub code: i32,
    pub handler: Handler,
}
inventory::collect!(HandlerRegistration);

type Table = HashMap<String, HashMap<i32, Handler>>;

static TABLE: OnceLock<RwLock<Table>> = OnceLock::new();

fn table() -> &'static RwLock<Table> {
    TABLE.get_or_init(|| RwLock::new(collect_from_inventory()))
}

fn collect_from_inventory() -> Table {
    let mut table = Table::new();
    let mut count = 0usize;
    for reg in inventory::iter::<HandlerRegistration> {
        if let Err(err) = insert_unique(&mut table, reg.descriptor, reg.code, reg.handler) {
            // Two generated units claim the same call site: a startup
            // configuration error, never a runtime condition.
            contract_violation(err);
        }
        count += 1;
    }
    tracing::debug!(
        handlers = count,
        descriptors = table.len(),
        "seqbind dispatch table built from generated registrations"
    );
    table
}

fn insert_unique(table: &mut Table, descriptor: &str, code: i32, handler: Handler) -> BindResult<()> {
    let codes = table.entry(descriptor.to_string()).or_default();
    if codes.contains_key(&code) {
        return Err(BindError::DuplicateCallSite {
            descriptor: descriptor.to_string(),
            code,
        });
    }
    codes.insert(code, handler);
    Ok(())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register a handler, failing if the call site is already taken.
pub fn try_register(descriptor: &str, code: i32, handler: Handler) -> BindResult<()> {
    let mut table = table().write().unwrap_or_else(PoisonError::into_inner);
    insert_unique(&mut table, descriptor, code, handler)?;
    tracing::debug!(descriptor, code, "seqbind handler registered");
    Ok(())
}

/// Register a handler. A duplicate call site is a fatal configuration error.
#[track_caller]
pub fn register(descriptor: &str, code: i32, handler: Handler) {
    if let Err(err) = try_register(descriptor, code, handler) {
        contract_violation(err);
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find the handler for a call site.
pub fn lookup(descriptor: &str, code: i32) -> Option<Handler> {
    let table = table().read().unwrap_or_else(PoisonError::into_inner);
    table.get(descriptor).and_then(|codes| codes.get(&code)).copied()
}

pub fn is_registered(descriptor: &str, code: i32) -> bool {
    lookup(descriptor, code).is_some()
}

/// Number of registered handlers across all descriptors.
pub fn registered_count() -> usize {
    let table = table().read().unwrap_or_else(PoisonError::into_inner);
    table.values().map(HashMap::len).sum()
}

/// Run the handler for a call site. An unregistered call site means the
/// caller and callee were generated from different models: fatal.
#[track_caller]
pub fn dispatch(descriptor: &str, code: i32, out: &mut Buffer, input: &mut Buffer) {
    // Copy the fn pointer out so the table lock is released before the
    // handler runs; handlers may re-enter the runtime.
    let Some(handler) = lookup(descriptor, code) else {
        contract_violation(BindError::UnknownCallSite {
            descriptor: descriptor.to_string(),
            code,
        });
    };
    handler(out, input);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_i64(out: &mut Buffer, input: &mut Buffer) {
        let v = input.read_i64();
        out.write_i64(v);
    }

    fn add_i64(out: &mut Buffer, input: &mut Buffer) {
        let x = input.read_i64();
        let y = input.read_i64();
        out.write_i64(x + y);
    }

    #[test]
    fn registered_handler_is_dispatched() {
        register("dispatch_tests.a", 9, add_i64);
        let mut input = Buffer::new();
        input.write_i64(3);
        input.write_i64(4);
        let mut out = Buffer::new();
        dispatch("dispatch_tests.a", 9, &mut out, &mut input);
        assert_eq!(out.read_i64(), 7);
    }

    #[test]
    fn same_code_under_distinct_descriptors_is_allowed() {
        register("dispatch_tests.b1", 1, echo_i64);
        register("dispatch_tests.b2", 1, add_i64);
        assert!(is_registered("dispatch_tests.b1", 1));
        assert!(is_registered("dispatch_tests.b2", 1));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        try_register("dispatch_tests.c", 0x00c, echo_i64).unwrap();
        let err = try_register("dispatch_tests.c", 0x00c, add_i64).unwrap_err();
        assert_eq!(
            err,
            BindError::DuplicateCallSite {
                descriptor: "dispatch_tests.c".into(),
                code: 0x00c
            }
        );
    }

    #[test]
    #[should_panic(expected = "is already registered")]
    fn duplicate_register_is_fatal() {
        register("dispatch_tests.d", 2, echo_i64);
        register("dispatch_tests.d", 2, echo_i64);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn unknown_call_site_is_fatal() {
        let mut input = Buffer::new();
        let mut out = Buffer::new();
        dispatch("dispatch_tests.missing", 1, &mut out, &mut input);
    }

    #[test]
    fn lookup_miss_returns_none() {
        assert!(lookup("dispatch_tests.none", 42).is_none());
        register("dispatch_tests.e", 1, echo_i64);
        assert!(registered_count() >= 1);
    }
}
