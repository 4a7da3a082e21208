use futures::FutureExt;
use futures::future::LocalBoxFuture;
use js_sys::Promise;
use n64_app::prelude::*;
use std::time::Duration;
use wasm_bindgen_futures::JsFuture;

/// `setTimeout` wrapped in a promise
#[derive(Default)]
pub struct WebTimer;

impl Timer for WebTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window()
                && let Err(e) =
                    window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
            {
                log::error!("setTimeout failed: {e:?}");
            }
        });
        async move {
            let _ = JsFuture::from(promise).await;
        }
        .boxed_local()
    }
}
