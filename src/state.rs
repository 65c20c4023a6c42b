use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use diesel::{
    SqliteConnection,
    connection::TransactionManager,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// A database connection shared between the transaction middleware and the
/// handler for one request.
#[derive(Clone)]
pub struct ThreadSafeConn {
    pub inner: Arc<
        tokio::sync::Mutex<
            PooledConnection<ConnectionManager<SqliteConnection>>,
        >,
    >,
}

/// Exclusive handle on the request's connection. Handlers extract this at
/// most once; the middleware reclaims the connection after the response is
/// produced.
pub struct Conn {
    inner: tokio::sync::OwnedMutexGuard<
        PooledConnection<ConnectionManager<SqliteConnection>>,
    >,
}

impl Deref for Conn {
    type Target = PooledConnection<ConnectionManager<SqliteConnection>>;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl DerefMut for Conn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Conn {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let wrapper = parts
            .extensions
            .get::<ThreadSafeConn>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        Ok(Conn {
            inner: wrapper
                .inner
                .clone()
                .try_lock_owned()
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
        })
    }
}

/// Middleware wrapping every request in one transaction: opened before the
/// handler runs, committed on a 2xx/3xx response and rolled back otherwise.
/// This is what makes multi-row operations (membership insert + pick copy)
/// atomic from the caller's point of view.
pub async fn tx_per_request(
    State(pool): State<DbPool>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut conn = tokio::task::spawn_blocking(move || pool.get().unwrap())
        .await
        .unwrap();

    <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
        ::TransactionManager
        ::begin_transaction(&mut conn)
        .unwrap();

    let wrapper = ThreadSafeConn {
        inner: Arc::new(tokio::sync::Mutex::new(conn)),
    };
    req.extensions_mut().insert(wrapper.clone());

    let res = next.run(req).await;

    let mut conn = wrapper.inner.try_lock().unwrap();

    if res.status().is_success()
        || res.status().is_redirection()
        || res.status().is_informational()
    {
        <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
            ::TransactionManager
            ::commit_transaction(&mut conn)
            .unwrap();
    } else {
        <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
            ::TransactionManager
            ::rollback_transaction(&mut conn)
            .unwrap();
    }

    res
}
