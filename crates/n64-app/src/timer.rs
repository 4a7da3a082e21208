use futures::future::LocalBoxFuture;
use std::time::Duration;

/// Source of delays for the event loop the loader runs on
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}
