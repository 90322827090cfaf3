//! Keyed store of reusable live connections.
//!
//! Connections are keyed by `(host, port, tls)`; a released keep-alive
//! connection parks on a bounded free list and the next [`connect`] for
//! the same key hands it back. The free list is a recency queue: releases
//! append at the tail, eviction pops the oldest from the front.
//!
//! [`connect`]: Pool::connect

use std::collections::VecDeque;
use std::io;
use std::sync::{Mutex, MutexGuard};

use crate::io::Transport;
use crate::log::{debug, trace};

const DEFAULT_FREE_MAX: usize = 32;

// ===== Dial =====

/// Transport opener injected into the pool.
///
/// TLS setup, name resolution and socket options all live behind this
/// seam; the pool only stores what comes back.
pub trait Dial {
    /// Open a transport to `host:port`, TLS-wrapped when `tls` is set.
    fn dial(&self, host: &str, port: u16, tls: bool) -> io::Result<Box<dyn Transport + Send>>;
}

// ===== PoolKey =====

/// Connection identity: host compares case-insensitively.
#[derive(Clone, Copy, Debug)]
pub struct PoolKey<'a> {
    pub host: &'a str,
    pub port: u16,
    pub tls: bool,
}

// ===== Connection =====

/// A live transport plus its reuse bookkeeping.
///
/// Boxed so its identity is stable across a pool round trip. Between
/// [`Pool::connect`] and [`Pool::release`] the connection is exclusively
/// owned by the borrower.
pub struct Connection {
    host: String,
    port: u16,
    tls: bool,
    keep_alive: bool,
    io: Box<dyn Transport + Send>,
}

impl Connection {
    /// Create a connection outside any pool.
    pub fn new(host: impl Into<String>, port: u16, tls: bool, io: Box<dyn Transport + Send>) -> Box<Self> {
        Box::new(Self {
            host: host.into(),
            port,
            tls,
            keep_alive: true,
            io,
        })
    }

    /// The transport this connection owns.
    pub fn transport(&mut self) -> &mut dyn Transport {
        &mut *self.io
    }

    /// Returns `false` once either side revoked reuse.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Revoke or restore reuse of this connection.
    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    /// Host this connection is dialed to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port this connection is dialed to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `true` for a TLS-wrapped transport.
    pub fn tls(&self) -> bool {
        self.tls
    }

    fn matches(&self, key: &PoolKey<'_>) -> bool {
        self.port == key.port && self.tls == key.tls && self.host.eq_ignore_ascii_case(key.host)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("keep_alive", &self.keep_alive)
            .finish_non_exhaustive()
    }
}

// ===== Pool =====

/// Thread-safe keyed connection store.
///
/// Every operation holds the internal mutex for its whole duration,
/// dialing included.
pub struct Pool {
    dial: Box<dyn Dial + Send + Sync>,
    inner: Mutex<Inner>,
}

struct Inner {
    free: VecDeque<Box<Connection>>,
    used: usize,
    free_max: usize,
}

impl Pool {
    /// Create a pool parking at most 32 free connections.
    pub fn new(dial: Box<dyn Dial + Send + Sync>) -> Self {
        Self::with_capacity(DEFAULT_FREE_MAX, dial)
    }

    /// Create a pool parking at most `free_max` free connections.
    ///
    /// With `free_max` of zero every released connection is closed.
    pub fn with_capacity(free_max: usize, dial: Box<dyn Dial + Send + Sync>) -> Self {
        Self {
            dial,
            inner: Mutex::new(Inner {
                free: VecDeque::new(),
                used: 0,
                free_max,
            }),
        }
    }

    /// Obtain a connection for `key`: a parked match if one exists, a
    /// freshly dialed transport otherwise.
    pub fn connect(&self, key: PoolKey<'_>) -> io::Result<Box<Connection>> {
        let mut inner = self.lock();

        if let Some(at) = inner.free.iter().position(|conn| conn.matches(&key)) {
            if let Some(conn) = inner.free.remove(at) {
                inner.used += 1;
                trace!("reusing connection to {}:{}", key.host, key.port);
                return Ok(conn);
            }
        }

        debug!("dialing {}:{} tls={}", key.host, key.port, key.tls);
        let io = self.dial.dial(key.host, key.port, key.tls)?;
        inner.used += 1;

        Ok(Box::new(Connection {
            host: key.host.to_owned(),
            port: key.port,
            tls: key.tls,
            keep_alive: true,
            io,
        }))
    }

    /// Return a borrowed connection.
    ///
    /// A connection that lost its keep-alive is closed; otherwise it
    /// parks at the tail of the free list, evicting the oldest parked
    /// connections while the list is at capacity.
    pub fn release(&self, mut conn: Box<Connection>) {
        let mut inner = self.lock();
        inner.used = inner.used.saturating_sub(1);

        if !conn.keep_alive || inner.free_max == 0 {
            trace!("closing connection to {}:{}", conn.host, conn.port);
            conn.io.close();
            return;
        }

        while inner.free.len() >= inner.free_max {
            let Some(mut oldest) = inner.free.pop_front() else {
                break;
            };
            debug!("evicting connection to {}:{}", oldest.host, oldest.port);
            oldest.io.close();
        }

        inner.free.push_back(conn);
    }

    /// Change the free list bound, evicting oldest connections down to
    /// the new bound.
    pub fn resize(&self, free_max: usize) {
        let mut inner = self.lock();
        inner.free_max = free_max;

        while inner.free.len() > free_max {
            let Some(mut oldest) = inner.free.pop_front() else {
                break;
            };
            oldest.io.close();
        }
    }

    /// Number of parked connections.
    pub fn idle(&self) -> usize {
        self.lock().free.len()
    }

    /// Number of connections currently borrowed.
    pub fn in_use(&self) -> usize {
        self.lock().used
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for conn in &mut inner.free {
            conn.io.close();
        }
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Pool")
            .field("free", &inner.free.len())
            .field("used", &inner.used)
            .field("free_max", &inner.free_max)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Transport double that only counts closes.
    struct Null {
        closed: Arc<AtomicUsize>,
    }

    impl Transport for Null {
        fn fill(&mut self) -> io::Result<usize> {
            Ok(0)
        }

        fn peek(&self) -> &[u8] {
            &[]
        }

        fn consume(&mut self, _: usize) {}

        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[derive(Default)]
    struct Opener {
        dialed: AtomicUsize,
        closed: Arc<AtomicUsize>,
    }

    impl Dial for Arc<Opener> {
        fn dial(&self, _: &str, _: u16, _: bool) -> io::Result<Box<dyn Transport + Send>> {
            self.dialed.fetch_add(1, Ordering::Relaxed);
            Ok(Box::new(Null { closed: self.closed.clone() }))
        }
    }

    fn pool(free_max: usize) -> (Pool, Arc<Opener>) {
        let opener = Arc::new(Opener::default());
        (Pool::with_capacity(free_max, Box::new(opener.clone())), opener)
    }

    fn key(host: &str) -> PoolKey<'_> {
        PoolKey { host, port: 80, tls: false }
    }

    #[test]
    fn release_then_connect_returns_the_same_connection() {
        let (pool, opener) = pool(4);

        let conn = pool.connect(key("example.com")).unwrap();
        let identity = &*conn as *const Connection;
        pool.release(conn);
        assert_eq!(pool.idle(), 1);

        let conn = pool.connect(key("example.com")).unwrap();
        assert!(std::ptr::eq(&*conn, identity));
        assert_eq!(opener.dialed.load(Ordering::Relaxed), 1);
        pool.release(conn);
    }

    #[test]
    fn host_comparison_ignores_case() {
        let (pool, opener) = pool(4);

        let conn = pool.connect(key("Example.COM")).unwrap();
        pool.release(conn);

        let _conn = pool.connect(key("example.com")).unwrap();
        assert_eq!(opener.dialed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn differing_keys_do_not_match() {
        let (pool, opener) = pool(4);

        let conn = pool.connect(key("a.example")).unwrap();
        pool.release(conn);

        let _b = pool.connect(key("b.example")).unwrap();
        let _tls = pool
            .connect(PoolKey { host: "a.example", port: 80, tls: true })
            .unwrap();
        let _port = pool
            .connect(PoolKey { host: "a.example", port: 8080, tls: false })
            .unwrap();
        assert_eq!(opener.dialed.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn eviction_pops_the_oldest_release() {
        let (pool, opener) = pool(2);

        let c1 = pool.connect(key("one.example")).unwrap();
        let c2 = pool.connect(key("two.example")).unwrap();
        let c3 = pool.connect(key("three.example")).unwrap();

        pool.release(c1);
        pool.release(c2);
        pool.release(c3);

        // the first release is the one evicted
        assert_eq!(pool.idle(), 2);
        assert_eq!(opener.closed.load(Ordering::Relaxed), 1);

        let _again = pool.connect(key("one.example")).unwrap();
        assert_eq!(opener.dialed.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn lost_keep_alive_closes_on_release() {
        let (pool, opener) = pool(4);

        let mut conn = pool.connect(key("example.com")).unwrap();
        conn.set_keep_alive(false);
        pool.release(conn);

        assert_eq!(pool.idle(), 0);
        assert_eq!(opener.closed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn zero_capacity_parks_nothing() {
        let (pool, opener) = pool(0);

        let conn = pool.connect(key("example.com")).unwrap();
        pool.release(conn);

        assert_eq!(pool.idle(), 0);
        assert_eq!(opener.closed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn resize_evicts_down_to_the_new_bound() {
        let (pool, opener) = pool(8);

        for host in ["a.example", "b.example", "c.example"] {
            let conn = pool.connect(key(host)).unwrap();
            pool.release(conn);
        }
        assert_eq!(pool.idle(), 3);

        pool.resize(1);
        assert_eq!(pool.idle(), 1);
        assert_eq!(opener.closed.load(Ordering::Relaxed), 2);

        // the newest release survived
        let _c = pool.connect(key("c.example")).unwrap();
        assert_eq!(opener.dialed.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn drop_closes_parked_connections() {
        let (pool, opener) = pool(8);

        for host in ["a.example", "b.example"] {
            let conn = pool.connect(key(host)).unwrap();
            pool.release(conn);
        }

        drop(pool);
        assert_eq!(opener.closed.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn usage_accounting() {
        let (pool, _) = pool(4);

        let a = pool.connect(key("a.example")).unwrap();
        let b = pool.connect(key("b.example")).unwrap();
        assert_eq!(pool.in_use(), 2);

        pool.release(a);
        pool.release(b);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 2);
    }
}
