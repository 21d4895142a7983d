use crate::{Connection, Driver, Error, PoolConfig, PoolError, Result, truncate_long};
use std::{
    collections::VecDeque,
    ops::{Deref, DerefMut},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU8, AtomicUsize, Ordering},
    },
};
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoolState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Draining = 3,
    Closed = 4,
}

impl PoolState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PoolState::Uninitialized,
            1 => PoolState::Initializing,
            2 => PoolState::Ready,
            3 => PoolState::Draining,
            _ => PoolState::Closed,
        }
    }
}

/// Bounded set of connections created by a [`Driver`].
///
/// Holds between `min_size` and `max_size` live connections. Checked out connections
/// are exclusively owned by a [`PooledConnection`] guard which puts them back in the
/// idle queue when dropped, whatever the exit path of the borrowing scope.
///
/// The pool is an ordinary value: create it once and pass a reference to whatever
/// issues queries.
pub struct Pool<D: Driver> {
    driver: D,
    config: PoolConfig,
    state: AtomicU8,
    idle: Mutex<VecDeque<D::Connection>>,
    permits: Semaphore,
    live: AtomicUsize,
}

impl<D: Driver> Pool<D> {
    /// Validate the configuration, no connection is opened yet.
    pub fn new(driver: D, config: PoolConfig) -> Result<Self> {
        if config.min_size == 0 || config.min_size > config.max_size {
            return Err(PoolError::InvalidSize {
                min: config.min_size,
                max: config.max_size,
            }
            .into());
        }
        Ok(Self {
            driver,
            permits: Semaphore::new(config.max_size),
            idle: Mutex::new(VecDeque::with_capacity(config.max_size)),
            config,
            state: AtomicU8::new(PoolState::Uninitialized as u8),
            live: AtomicUsize::new(0),
        })
    }

    /// Create the pool and open its first `min_size` connections.
    pub async fn initialize(driver: D, config: PoolConfig) -> Result<Self> {
        let pool = Self::new(driver, config)?;
        pool.start().await?;
        Ok(pool)
    }

    /// Same as [`Pool::initialize`] with the configuration parsed from `url`, whose scheme
    /// must be the one of the driver.
    pub async fn connect(driver: D, url: &str) -> Result<Self> {
        let scheme = url.split_once("://").map(|(s, _)| s).unwrap_or_default();
        if scheme != D::NAME {
            let error = Error::new(PoolError::WrongScheme {
                expected: D::NAME,
                found: scheme.to_string(),
            })
            .context(format!("While connecting to `{}`", truncate_long!(url)));
            log::error!("{:#}", error);
            return Err(error);
        }
        Self::initialize(driver, PoolConfig::from_url(url)?).await
    }

    /// Open the initial connections. Calling it on a ready pool does nothing.
    ///
    /// A connection failure is fatal: the connections opened so far are released, the
    /// pool ends closed and the error is returned.
    pub async fn start(&self) -> Result<()> {
        if let Err(state) = self.state.compare_exchange(
            PoolState::Uninitialized as u8,
            PoolState::Initializing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return match PoolState::from_u8(state) {
                PoolState::Ready => Ok(()),
                PoolState::Draining | PoolState::Closed => Err(PoolError::Closed.into()),
                state => Err(PoolError::NotReady(state).into()),
            };
        }
        log::info!(
            "create database connection pool: {}@{}:{}/{} (size {}..={})",
            self.config.user,
            self.config.host,
            self.config.port,
            self.config.database,
            self.config.min_size,
            self.config.max_size,
        );
        for _ in 0..self.config.min_size {
            match self.driver.connect(&self.config).await {
                Ok(connection) => {
                    self.live.fetch_add(1, Ordering::AcqRel);
                    self.lock_idle().push_back(connection);
                }
                Err(error) => {
                    let error = error.context(format!(
                        "While opening the `{}` connection pool",
                        D::NAME
                    ));
                    log::error!("{:#}", error);
                    self.permits.close();
                    self.set_state(PoolState::Draining);
                    self.disconnect_idle().await;
                    self.set_state(PoolState::Closed);
                    return Err(error);
                }
            }
        }
        self.set_state(PoolState::Ready);
        Ok(())
    }

    /// Check out a connection, suspending while all of them are in use.
    ///
    /// Connections evicted since the last call are replaced first, keeping at least
    /// `min_size` of them live.
    ///
    /// With `acquire_timeout` configured the wait is bounded and fails with
    /// [`PoolError::Timeout`].
    pub async fn acquire(&self) -> Result<PooledConnection<'_, D>> {
        match self.state() {
            PoolState::Ready => {}
            PoolState::Draining | PoolState::Closed => return Err(PoolError::Closed.into()),
            state => return Err(PoolError::NotReady(state).into()),
        }
        let permit = match self.config.acquire_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.permits.acquire())
                .await
                .map_err(|_| PoolError::Timeout(timeout))?,
            None => self.permits.acquire().await,
        }
        .map_err(|_| PoolError::Closed)?;
        self.replenish().await;
        let connection = loop {
            let Some(connection) = self.lock_idle().pop_front() else {
                break None;
            };
            if connection.is_broken() {
                self.discard(connection);
                continue;
            }
            break Some(connection);
        };
        let connection = match connection {
            Some(connection) => connection,
            None => {
                let connection = self.driver.connect(&self.config).await.map_err(|e| {
                    log::error!("{:#}", e);
                    e
                })?;
                self.live.fetch_add(1, Ordering::AcqRel);
                log::debug!("Opened a new `{}` connection", D::NAME);
                connection
            }
        };
        Ok(PooledConnection {
            pool: self,
            connection: Some(connection),
            evicted: false,
            _permit: permit,
        })
    }

    /// Refuse new acquisitions and disconnect the idle connections. Connections still
    /// checked out are closed when their guard drops.
    pub async fn shutdown(&self) -> Result<()> {
        if self.state() == PoolState::Closed {
            return Ok(());
        }
        log::info!("close database connection pool");
        self.permits.close();
        self.set_state(PoolState::Draining);
        let result = self.disconnect_idle().await;
        self.set_state(PoolState::Closed);
        result
    }

    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::Acquire))
    }
    /// Live connections, idle or checked out.
    pub fn size(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
    pub fn idle(&self) -> usize {
        self.lock_idle().len()
    }
    /// Connections that can be checked out without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn set_state(&self, state: PoolState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn lock_idle(&self) -> MutexGuard<'_, VecDeque<D::Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open connections until `min_size` are live again, after evictions.
    pub(crate) async fn replenish(&self) {
        let min_size = self.config.min_size;
        while self.state() == PoolState::Ready
            && self
                .live
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n < min_size).then_some(n + 1)
                })
                .is_ok()
        {
            match self.driver.connect(&self.config).await {
                Ok(connection) => {
                    log::debug!("Replaced an evicted `{}` connection", D::NAME);
                    self.release(connection, false);
                }
                Err(error) => {
                    self.live.fetch_sub(1, Ordering::AcqRel);
                    log::warn!(
                        "Could not replace an evicted `{}` connection: {:#}",
                        D::NAME,
                        error
                    );
                    break;
                }
            }
        }
    }

    fn release(&self, connection: D::Connection, evicted: bool) {
        if !evicted && !connection.is_broken() && self.size() <= self.config.max_size {
            let mut idle = self.lock_idle();
            // Checked under the lock so that shutdown cannot miss it
            if self.state() == PoolState::Ready {
                idle.push_back(connection);
                log::debug!("Returned a `{}` connection to the pool", D::NAME);
                return;
            }
        }
        self.discard(connection);
    }

    fn discard(&self, connection: D::Connection) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        log::debug!("Discarded a `{}` connection", D::NAME);
        drop(connection);
    }

    async fn disconnect_idle(&self) -> Result<()> {
        let drained: Vec<_> = self.lock_idle().drain(..).collect();
        let mut result = Ok(());
        for connection in drained {
            self.live.fetch_sub(1, Ordering::AcqRel);
            if let Err(error) = connection.disconnect().await {
                log::error!("{:#}", error);
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }
}

/// A connection checked out of a [`Pool`], returned to it on drop.
pub struct PooledConnection<'p, D: Driver> {
    pool: &'p Pool<D>,
    connection: Option<D::Connection>,
    evicted: bool,
    // Released after the connection is back in the idle queue
    _permit: SemaphorePermit<'p>,
}

impl<D: Driver> PooledConnection<'_, D> {
    /// Drop the connection instead of returning it to the pool.
    pub fn evict(&mut self) {
        self.evicted = true;
    }
    pub fn is_evicted(&self) -> bool {
        self.evicted
    }
}

impl<D: Driver> Deref for PooledConnection<'_, D> {
    type Target = D::Connection;
    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("The connection is held until the guard drops")
    }
}

impl<D: Driver> DerefMut for PooledConnection<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("The connection is held until the guard drops")
    }
}

impl<D: Driver> Drop for PooledConnection<'_, D> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.release(connection, self.evicted);
        }
    }
}
