use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_wasm_bindgen::{from_value, to_value};
use std::marker::PhantomData;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::MessageEvent;

/// `postMessage` channel between the loader and an embedding page.
/// `In` is what the page sends us, `Out` what we post back to the parent.
pub struct Messenger<In, Out> {
    _marker: PhantomData<(In, Out)>,
}

impl<In, Out> Messenger<In, Out>
where
    In: DeserializeOwned + 'static,
    Out: Serialize,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn init_message_listener(&self, mut on_message: impl FnMut(In) + 'static) -> Result<(), String> {
        let window = web_sys::window().ok_or("no window")?;

        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match from_value::<In>(event.data()) {
                Ok(message) => on_message(message),
                // other scripts on the page post messages too
                Err(e) => log::debug!("ignoring message from {}: {e}", event.origin()),
            }
        });

        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .map_err(|e| format!("{e:?}"))?;

        closure.forget();
        Ok(())
    }

    /// Posts to the parent frame. A no-op when the loader is not embedded.
    pub fn send(&self, message: &Out) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(Some(parent)) = window.parent() else {
            return;
        };
        if parent == window {
            return;
        }
        match to_value(message) {
            Ok(value) => {
                if let Err(e) = parent.post_message(&value, "*") {
                    log::debug!("postMessage failed: {e:?}");
                }
            }
            Err(e) => log::warn!("could not serialize notice: {e}"),
        }
    }
}
