// Callee-side reference table: RefNum <-> native object handle.
//
// Native objects crossing to the caller are inserted once and keep their
// RefNum for as long as the caller observes them (get-or-insert by object
// identity). Incoming RefNums are resolved back to the handle type the
// dispatcher expects; a miss or a wrong type means the two stub halves
// disagree, which is fatal.
//
// The table stores a clone of each handle and counts crossings. The caller
// side releases crossings when its proxy goes away; when the count drops to
// zero the entry and its clone are removed. The object itself belongs to
// whoever else holds handles to it.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use seqbind_ffi::RefNum;

use crate::error::{contract_violation, BindError, BindResult};

/// Native handle type of a bound struct.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wrap a native value for binding.
pub fn share<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Exclusive access to a bound value. Recovers from poisoning: a panicked
/// native call must not wedge every later call on the same object.
pub fn lock<T: ?Sized>(shared: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    shared.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared access to a bound value.
pub fn read<T: ?Sized>(shared: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    shared.read().unwrap_or_else(PoisonError::into_inner)
}

/// A native handle that can cross the boundary by reference.
pub trait RefTarget: Clone + Send + Sync + 'static {
    /// Identity of the underlying object. Two handles to the same object
    /// must return the same value.
    fn identity(&self) -> usize;
}

impl<T: ?Sized + Send + Sync + 'static> RefTarget for Arc<T> {
    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(self).cast::<()>() as usize
    }
}

struct Entry {
    handle: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    identity: usize,
    crossings: u32,
}

struct Inner {
    by_num: HashMap<RefNum, Entry>,
    by_identity: HashMap<usize, RefNum>,
    next: i32,
}

/// Identity-keyed table of native objects visible to the caller side.
pub struct RefTable {
    inner: RwLock<Inner>,
}

impl Default for RefTable {
    fn default() -> Self {
        RefTable::new()
    }
}

impl RefTable {
    pub fn new() -> Self {
        RefTable {
            inner: RwLock::new(Inner {
                by_num: HashMap::new(),
                by_identity: HashMap::new(),
                next: RefNum::FIRST.0,
            }),
        }
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one crossing of `handle` and return its RefNum. The same object
    /// always maps to the same RefNum while it is in the table.
    pub fn insert<H: RefTarget>(&self, handle: H) -> RefNum {
        let identity = handle.identity();
        let mut inner = self.write_inner();
        if let Some(&num) = inner.by_identity.get(&identity) {
            let entry = inner
                .by_num
                .get_mut(&num)
                .unwrap_or_else(|| contract_violation(BindError::UnknownRef(num)));
            if !entry.handle.is::<H>() {
                contract_violation(BindError::RefTypeMismatch {
                    num,
                    expected: type_name::<H>(),
                    actual: entry.type_name,
                });
            }
            entry.crossings = entry.crossings.saturating_add(1);
            return num;
        }

        let num = RefNum(inner.next);
        inner.next = inner
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("seqbind: object reference numbers exhausted"));
        inner.by_num.insert(
            num,
            Entry {
                handle: Box::new(handle),
                type_name: type_name::<H>(),
                identity,
                crossings: 1,
            },
        );
        inner.by_identity.insert(identity, num);
        tracing::trace!(%num, ty = type_name::<H>(), "object reference created");
        num
    }

    /// Resolve a RefNum to the handle type `H`.
    pub fn try_get<H: RefTarget>(&self, num: RefNum) -> BindResult<H> {
        if num.is_null() {
            return Err(BindError::NullRef);
        }
        let inner = self.read_inner();
        let entry = inner.by_num.get(&num).ok_or(BindError::UnknownRef(num))?;
        entry
            .handle
            .downcast_ref::<H>()
            .cloned()
            .ok_or(BindError::RefTypeMismatch {
                num,
                expected: type_name::<H>(),
                actual: entry.type_name,
            })
    }

    /// Resolve a RefNum for a dispatcher. Misses and type mismatches are fatal.
    #[track_caller]
    pub fn get<H: RefTarget>(&self, num: RefNum) -> H {
        self.try_get(num).unwrap_or_else(|err| contract_violation(err))
    }

    /// Drop `crossings` observations of `num`. The entry is removed once no
    /// observation remains. Returns whether the entry was removed.
    pub fn release(&self, num: RefNum, crossings: u32) -> bool {
        let removed = {
            let mut inner = self.write_inner();
            let Some(entry) = inner.by_num.get_mut(&num) else {
                return false;
            };
            entry.crossings = entry.crossings.saturating_sub(crossings);
            if entry.crossings > 0 {
                return false;
            }
            let entry = inner.by_num.remove(&num);
            if let Some(entry) = &entry {
                inner.by_identity.remove(&entry.identity);
            }
            entry
        };
        // The handle clone is dropped here, outside the lock, in case the
        // object's destructor re-enters the table.
        drop(removed);
        tracing::trace!(%num, "object reference released");
        true
    }

    pub fn contains(&self, num: RefNum) -> bool {
        self.read_inner().by_num.contains_key(&num)
    }

    /// Outstanding crossings of `num`, zero if unknown.
    pub fn crossings(&self, num: RefNum) -> u32 {
        self.read_inner().by_num.get(&num).map_or(0, |e| e.crossings)
    }

    pub fn len(&self) -> usize {
        self.read_inner().by_num.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static REFS: OnceLock<RefTable> = OnceLock::new();

/// The process-wide callee reference table used by generated dispatchers.
pub fn refs() -> &'static RefTable {
    REFS.get_or_init(RefTable::new)
}
