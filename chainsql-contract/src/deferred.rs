use crate::ContractError;
use futures_util::future::{self, BoxFuture, FutureExt};
use pin_project::pin_project;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// A pending contract operation.
///
/// Resolves to the operation's result when awaited. [`Deferred::with_callback`] turns it
/// into a future which hands the result to a callback instead.
#[pin_project]
#[must_use = "deferred operations do nothing unless you `.await` or poll them"]
pub struct Deferred<'a, T> {
    #[pin]
    inner: BoxFuture<'a, Result<T, ContractError>>,
}

impl<'a, T: 'a> Deferred<'a, T> {
    pub(crate) fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, ContractError>> + Send + 'a,
    {
        Self { inner: Box::pin(fut) }
    }

    /// Drives the operation and invokes `callback` exactly once with its result
    pub fn with_callback<F>(self, callback: F) -> BoxFuture<'a, ()>
    where
        F: FnOnce(Result<T, ContractError>) + Send + 'a,
    {
        self.inner.map(callback).boxed()
    }
}

impl<'a, T> std::fmt::Debug for Deferred<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl<'a, T> Future for Deferred<'a, T> {
    type Output = Result<T, ContractError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().inner.poll(cx)
    }
}

/// Runs the callback flavour of an operation: synchronous failures reach `callback`
/// immediately, everything else once the returned future is driven.
pub(crate) fn callback_adapter<'a, T: 'a, F>(
    op: Result<Deferred<'a, T>, ContractError>,
    callback: F,
) -> BoxFuture<'a, ()>
where
    F: FnOnce(Result<T, ContractError>) + Send + 'a,
{
    match op {
        Ok(deferred) => deferred.with_callback(callback),
        Err(err) => {
            callback(Err(err));
            future::ready(()).boxed()
        }
    }
}
