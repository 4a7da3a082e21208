use crate::surface::describe;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use js_sys::Uint8Array;
use n64_app::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

/// `window.fetch`
#[derive(Default)]
pub struct FetchClient;

impl FetchClient {
    pub fn new() -> Self {
        Self
    }
}

impl HttpClient for FetchClient {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpResponse, GlueError>> {
        async move {
            let window = web_sys::window().ok_or_else(|| GlueError::transport(url, "no window"))?;
            let response: Response = JsFuture::from(window.fetch_with_str(url))
                .await
                .map_err(|e| GlueError::transport(url, describe(e)))?
                .dyn_into()
                .map_err(|_| GlueError::transport(url, "fetch did not return a Response"))?;

            let status = response.status();
            if !response.ok() {
                return Ok(HttpResponse {
                    status,
                    body: Vec::new(),
                });
            }

            let buffer = response
                .array_buffer()
                .map_err(|e| GlueError::transport(url, describe(e)))?;
            let buffer = JsFuture::from(buffer)
                .await
                .map_err(|e| GlueError::transport(url, describe(e)))?;
            Ok(HttpResponse {
                status,
                body: Uint8Array::new(&buffer).to_vec(),
            })
        }
        .boxed_local()
    }
}
