//! Success/error callback pairs for the asynchronous host contract.
//!
//! Both callbacks are `FnOnce` and [`Callbacks::resolve`] consumes the pair,
//! so exactly one of them fires per call.

use crate::error::ErrorInfo;
use google_fit_client::FitError;
use std::future::Future;
use tokio::task::JoinHandle;

type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type ErrorFn = Box<dyn FnOnce(ErrorInfo) + Send>;

pub struct Callbacks<T> {
    on_success: SuccessFn<T>,
    on_error: ErrorFn,
}

impl<T> Callbacks<T> {
    pub fn new(
        on_success: impl FnOnce(T) + Send + 'static,
        on_error: impl FnOnce(ErrorInfo) + Send + 'static,
    ) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }

    pub fn resolve(self, result: Result<T, FitError>) {
        match result {
            Ok(value) => (self.on_success)(value),
            Err(e) => {
                tracing::warn!(error = %e, "resolving with error callback");
                (self.on_error)(ErrorInfo::from(&e))
            }
        }
    }
}

/// Drive `fut` on the runtime and resolve `callbacks` with its outcome.
pub fn spawn_with_callbacks<T, F>(fut: F, callbacks: Callbacks<T>) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T, FitError>> + Send + 'static,
{
    tokio::spawn(async move { callbacks.resolve(fut.await) })
}
