#![cfg(target_arch = "wasm32")]
#![warn(clippy::all, rust_2018_idioms)]
use crate::bootstrap::WebApp;
use js_sys::Reflect;
use n64_app::LoaderConfig;
use once_cell::unsync::OnceCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;

mod bootstrap;
mod http;
mod logger;
mod messenger;
mod surface;
mod timer;
mod view;

/// Global the page may define before loading us to override defaults
const CONFIG_GLOBAL: &str = "N64_LOADER_CONFIG";

thread_local! {
    static APP: OnceCell<Rc<WebApp>> = OnceCell::new();
}

fn set_app(app: Rc<WebApp>) {
    APP.with(|cell| {
        let _ = cell.set(app);
    });
}

fn with_app<R>(f: impl FnOnce(&Rc<WebApp>) -> R) -> Result<R, JsValue> {
    APP.with(|cell| {
        let app = cell
            .get()
            .ok_or_else(|| JsValue::from_str("Loader not initialized"))?;
        Ok(f(app))
    })
}

#[wasm_bindgen(js_name = loadRom)]
pub fn load_rom(url: Option<String>) -> Result<(), JsValue> {
    with_app(|app| bootstrap::spawn_load(app, url))
}

#[wasm_bindgen(js_name = saveState)]
pub fn save_state() -> Result<(), JsValue> {
    with_app(|app| app.save_state())
}

#[wasm_bindgen(js_name = loadState)]
pub fn load_state() -> Result<(), JsValue> {
    with_app(|app| app.load_state())
}

/// Returns whether the mobile layout is now active
#[wasm_bindgen(js_name = toggleLayout)]
pub fn toggle_layout() -> Result<bool, JsValue> {
    with_app(|app| app.toggle_layout().is_mobile())
}

#[wasm_bindgen]
pub fn status() -> Result<String, JsValue> {
    with_app(|app| app.status())
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        web_sys::console::log_1(&"Already initialized, skipping".into());
        return;
    }

    let config = page_config();
    logger::init(config.log_level);
    bootstrap::when_loaded(move || match bootstrap::boot(config) {
        Ok(app) => set_app(app),
        Err(e) => log::error!("loader failed to start: {e:#}"),
    });
}

fn page_config() -> LoaderConfig {
    let value = Reflect::get(&js_sys::global(), &JsValue::from_str(CONFIG_GLOBAL))
        .unwrap_or(JsValue::UNDEFINED);
    if value.is_undefined() || value.is_null() {
        return LoaderConfig::default();
    }
    serde_wasm_bindgen::from_value(value).unwrap_or_else(|e| {
        web_sys::console::warn_1(&format!("ignoring invalid {CONFIG_GLOBAL}: {e}").into());
        LoaderConfig::default()
    })
}
