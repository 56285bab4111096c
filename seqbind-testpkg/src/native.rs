// The package behind the bindings. Item names and signatures follow
// testpkg.json: exported Go-style names become snake_case, `*S` becomes
// `Shared<S>` and interface values are shared trait objects.

use std::sync::atomic::{AtomicI32, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use seqbind_runtime::{lock, read, share, Shared};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("refused")]
    Refused,
    #[error("{0} is negative")]
    Negative(i64),
}

static HI_CALLS: AtomicUsize = AtomicUsize::new(0);
static LAST_INT: AtomicI32 = AtomicI32::new(0);
static S_DROPPED: AtomicI64 = AtomicI64::new(0);

pub fn bytes_append(a: Vec<u8>, b: Vec<u8>) -> Vec<u8> {
    let mut out = a;
    out.extend_from_slice(&b);
    out
}

pub fn call_s_sum(s: Shared<S>) -> f64 {
    S::sum(&s)
}

/// Wait up to `timeout_sec` seconds until `want` values of `S` have been
/// dropped. Returns how many were, and starts counting afresh.
pub fn collect_s(want: i64, timeout_sec: i64) -> i64 {
    let deadline = Instant::now() + Duration::from_secs(timeout_sec.max(0) as u64);
    while S_DROPPED.load(Ordering::SeqCst) < want && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    S_DROPPED.swap(0, Ordering::SeqCst)
}

pub fn echo_u64(v: u64) -> u64 {
    v
}

pub fn echo_u32(v: u32) -> u32 {
    v
}

pub fn echo_i8(v: i8) -> i8 {
    v
}

pub fn echo_f32(v: f32) -> f32 {
    v
}

pub fn hello(s: String) -> String {
    format!("Hello, {s}!")
}

pub fn hi() {
    HI_CALLS.fetch_add(1, Ordering::SeqCst);
    tracing::info!("hi");
}

/// Number of `hi` calls so far.
pub fn hi_calls() -> usize {
    HI_CALLS.load(Ordering::SeqCst)
}

pub fn int(x: i32) {
    LAST_INT.store(x, Ordering::SeqCst);
}

/// Last value passed to `int`.
pub fn last_int() -> i32 {
    LAST_INT.load(Ordering::SeqCst)
}

pub fn new_s(x: f64, y: f64) -> Shared<S> {
    share(S { x, y })
}

/// Succeeds when `b` is true.
pub fn returns_error(b: bool) -> Result<String, Error> {
    if b { Ok("OK".to_string()) } else { Err(Error::Refused) }
}

pub fn sum(x: i64, y: i64) -> i64 {
    x + y
}

pub fn the_greeter() -> Arc<dyn Greeter + Send + Sync> {
    static GREETER: OnceLock<Arc<dyn Greeter + Send + Sync>> = OnceLock::new();
    GREETER.get_or_init(|| Arc::new(Polite)).clone()
}

pub fn use_greeter(g: Arc<dyn Greeter + Send + Sync>, name: String) -> String {
    g.greet(&name)
}

pub fn validate(n: i64) -> Result<(), Error> {
    if n < 0 { Err(Error::Negative(n)) } else { Ok(()) }
}

pub fn wrap(s: Shared<S>, label: String) -> Shared<Node> {
    share(Node { label, peer: s })
}

// Blocklisted: maps cannot cross, so no dispatcher calls this.
pub fn lookup(m: &std::collections::HashMap<String, i64>, key: &str) -> i64 {
    m.get(key).copied().unwrap_or_default()
}

pub struct Node {
    pub label: String,
    pub peer: Shared<S>,
}

pub struct S {
    pub x: f64,
    pub y: f64,
}

// Methods take the shared handle and lock only for as long as they touch
// the fields, so `o` may be `this` itself.
impl S {
    pub fn sum(this: &Shared<S>) -> f64 {
        let s = read(this);
        s.x + s.y
    }

    pub fn try_two_strings(_this: &Shared<S>, first: String, second: String) -> String {
        first + &second
    }

    /// Add the coordinates of `o` to this value.
    pub fn absorb(this: &Shared<S>, o: Shared<S>) {
        let (x, y) = {
            let o = read(&o);
            (o.x, o.y)
        };
        let mut s = lock(this);
        s.x += x;
        s.y += y;
    }
}

impl Drop for S {
    fn drop(&mut self) {
        S_DROPPED.fetch_add(1, Ordering::SeqCst);
    }
}

pub trait Greeter {
    fn greet(&self, name: &str) -> String;
}

struct Polite;

impl Greeter for Polite {
    fn greet(&self, name: &str) -> String {
        format!("Good day, {name}.")
    }
}
