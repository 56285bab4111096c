// Caller-side proxies for callee objects.
//
// A RefNum received from the callee is turned into an `Arc<Proxy>` through the
// registry: repeated crossings of the same RefNum while a proxy is alive yield
// that same proxy (get-or-create), so caller-side identity follows callee-side
// identity. The registry only holds weak references. When the last strong
// reference goes away the proxy removes its entry and releases every crossing
// it accounted for back to the callee.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use seqbind_ffi::RefNum;

use crate::error::{contract_violation, BindError};

/// Called when a proxy dies: (num, crossings to release).
pub type Releaser = fn(RefNum, u32);

/// Caller-side stand-in for one callee object.
pub struct Proxy {
    num: RefNum,
    crossings: AtomicU32,
    registry: &'static ProxyRegistry,
}

impl Proxy {
    pub fn num(&self) -> RefNum {
        self.num
    }

    /// How many times the callee handed this object out while this proxy
    /// was alive.
    pub fn crossings(&self) -> u32 {
        self.crossings.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("num", &self.num)
            .field("crossings", &self.crossings())
            .finish()
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        self.registry.forget(self.num);
        let crossings = *self.crossings.get_mut();
        tracing::trace!(num = %self.num, crossings, "proxy dropped");
        (self.registry.release)(self.num, crossings);
    }
}

/// RefNum -> live proxy cache.
pub struct ProxyRegistry {
    proxies: RwLock<HashMap<RefNum, Weak<Proxy>>>,
    release: Releaser,
}

impl ProxyRegistry {
    pub fn new(release: Releaser) -> Self {
        ProxyRegistry {
            proxies: RwLock::new(HashMap::new()),
            release,
        }
    }

    /// Return the live proxy for `num`, creating one if none is alive. Every
    /// call records one crossing.
    pub fn get_or_create(&'static self, num: RefNum) -> Arc<Proxy> {
        if num.is_null() {
            contract_violation(BindError::NullRef);
        }

        let hit = {
            let proxies = self.proxies.read().unwrap_or_else(PoisonError::into_inner);
            proxies.get(&num).and_then(Weak::upgrade)
        };
        if let Some(proxy) = hit {
            proxy.crossings.fetch_add(1, Ordering::AcqRel);
            return proxy;
        }

        let mut proxies = self.proxies.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have created it between the two locks.
        if let Some(proxy) = proxies.get(&num).and_then(Weak::upgrade) {
            proxy.crossings.fetch_add(1, Ordering::AcqRel);
            return proxy;
        }
        let proxy = Arc::new(Proxy {
            num,
            crossings: AtomicU32::new(1),
            registry: self,
        });
        proxies.insert(num, Arc::downgrade(&proxy));
        proxy
    }

    /// The live proxy for `num`, if any. Does not record a crossing.
    pub fn get(&self, num: RefNum) -> Option<Arc<Proxy>> {
        let proxies = self.proxies.read().unwrap_or_else(PoisonError::into_inner);
        proxies.get(&num).and_then(Weak::upgrade)
    }

    /// Number of proxies currently alive.
    pub fn live_count(&self) -> usize {
        let proxies = self.proxies.read().unwrap_or_else(PoisonError::into_inner);
        proxies.values().filter(|w| w.strong_count() > 0).count()
    }

    // Remove the entry for a dying proxy unless a new live proxy already
    // replaced it.
    fn forget(&self, num: RefNum) {
        let mut proxies = self.proxies.write().unwrap_or_else(PoisonError::into_inner);
        if proxies.get(&num).is_some_and(|w| w.strong_count() == 0) {
            proxies.remove(&num);
        }
    }
}

static PROXIES: OnceLock<ProxyRegistry> = OnceLock::new();

/// The process-wide caller proxy registry. Dead proxies release through the
/// installed transport.
pub fn proxies() -> &'static ProxyRegistry {
    PROXIES.get_or_init(|| ProxyRegistry::new(crate::transport::release))
}

// ---------------------------------------------------------------------------
// Generated wrapper types
// ---------------------------------------------------------------------------

/// Implemented by every generated caller-side wrapper type.
pub trait ProxyWrapper: Sized {
    fn from_proxy(proxy: Arc<Proxy>) -> Self;

    fn proxy(&self) -> &Arc<Proxy>;

    fn ref_num(&self) -> RefNum {
        self.proxy().num()
    }
}

/// Build a wrapper for a RefNum received from the callee.
pub fn proxy_for<W: ProxyWrapper>(num: RefNum) -> W {
    W::from_proxy(proxies().get_or_create(num))
}
