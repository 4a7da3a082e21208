use crate::http::FetchClient;
use crate::messenger::Messenger;
use crate::surface::JsModuleSurface;
use crate::timer::WebTimer;
use crate::view::DomView;
use anyhow::Context;
use n64_app::prelude::*;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, HtmlInputElement, HtmlSelectElement};

pub type WebApp = App<JsModuleSurface, FetchClient, WebTimer>;

/// Runs `f` once the page has finished loading
pub fn when_loaded(f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        log::error!("no window, loader not started");
        return;
    };
    let complete = window
        .document()
        .is_some_and(|document| document.ready_state() == "complete");
    if complete {
        f();
        return;
    }

    let on_load = Closure::once_into_js(move |_event: Event| f());
    if let Err(e) = window.add_event_listener_with_callback("load", on_load.unchecked_ref()) {
        log::error!("could not wait for page load: {e:?}");
    }
}

pub fn boot(config: LoaderConfig) -> anyhow::Result<Rc<WebApp>> {
    config.validate().context("invalid loader configuration")?;
    let window = web_sys::window().context("no global window")?;
    let document = window.document().context("window has no document")?;

    let view = Rc::new(DomView::new(document.clone(), &config, Messenger::new()));
    let surface = Rc::new(JsModuleSurface::new(js_sys::global(), &config.module_name));
    let timer = Rc::new(WebTimer);
    let app = Rc::new(App::new(
        config,
        surface,
        Rc::new(FetchClient::new()),
        Rc::clone(&timer),
        view,
    ));

    bind_controls(&document, &app);
    listen_for_messages(&app)?;

    if app.config().autostart {
        schedule_autostart(&app, &document, timer);
    }
    log::info!("loader bound to page");
    Ok(app)
}

pub fn spawn_load(app: &Rc<WebApp>, reference: Option<String>) {
    let app = Rc::clone(app);
    spawn_local(async move {
        app.load_rom(reference.as_deref()).await;
    });
}

fn bind_controls(document: &Document, app: &Rc<WebApp>) {
    let ids = &app.config().elements;

    let load = {
        let app = Rc::clone(app);
        let document = document.clone();
        let select_id = ids.rom_select.clone();
        move || spawn_load(&app, selected_rom(&document, &select_id))
    };
    on_click(document, &ids.load_button, load);

    let toggle = {
        let app = Rc::clone(app);
        move || {
            app.toggle_layout();
        }
    };
    on_click(document, &ids.toggle_mobile, toggle);

    let save = {
        let app = Rc::clone(app);
        move || app.save_state()
    };
    on_click(document, &ids.save_button, save);

    let restore = {
        let app = Rc::clone(app);
        move || app.load_state()
    };
    on_click(document, &ids.load_state_button, restore);
}

fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
    let Some(element) = document.get_element_by_id(id) else {
        log::warn!("no #{id} element, control left unbound");
        return;
    };
    let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| handler());
    if let Err(e) = element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref()) {
        log::warn!("binding #{id} failed: {e:?}");
        return;
    }
    closure.forget();
}

/// Value of the ROM selector, which may be a `<select>` or an `<input>`
fn selected_rom(document: &Document, id: &str) -> Option<String> {
    let element = document.get_element_by_id(id)?;
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    element.dyn_ref::<HtmlInputElement>().map(HtmlInputElement::value)
}

fn listen_for_messages(app: &Rc<WebApp>) -> anyhow::Result<()> {
    let app = Rc::clone(app);
    Messenger::<ClientMessage, LoaderNotice>::new()
        .init_message_listener(move |message| {
            let app = Rc::clone(&app);
            spawn_local(async move {
                app.handle_event(message.into()).await;
            });
        })
        .map_err(anyhow::Error::msg)
        .context("could not listen for page messages")
}

fn schedule_autostart(app: &Rc<WebApp>, document: &Document, timer: Rc<WebTimer>) {
    let app = Rc::clone(app);
    let document = document.clone();
    spawn_local(async move {
        timer.sleep(app.config().autostart_delay()).await;
        let reference = selected_rom(&document, &app.config().elements.rom_select);
        app.load_rom(reference.as_deref()).await;
    });
}
