//! Asset loader on top of `fetch`, streaming the body to report progress

use std::collections::HashMap;

use js_sys::{Reflect, Uint8Array};
use product_viewer::gltf_import;
use product_viewer::scene::SceneNode;
use product_viewer::{AssetLoader, AssetSink, LoadError, TextureSink};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{ReadableStreamDefaultReader, Response};

/// Readable message of a thrown JS value
pub fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(e) = value.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    format!("{:?}", value)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchLoader;

impl AssetLoader for FetchLoader {
    fn load_asset(&mut self, path: &str, sink: AssetSink) {
        let path = path.to_string();
        spawn_local(async move {
            let result = fetch_asset(&path, &sink).await;
            sink.complete(result);
        });
    }

    fn load_texture(&mut self, path: &str, sink: TextureSink) {
        let path = path.to_string();
        spawn_local(async move {
            let bytes = fetch_bytes(&path, |_, _| {}).await;
            sink.complete_bytes(bytes);
        });
    }
}

/// Fetch a model, then every buffer and image a `.gltf` references next to it
async fn fetch_asset(path: &str, sink: &AssetSink) -> Result<SceneNode, LoadError> {
    let bytes = fetch_bytes(path, |loaded, total| sink.progress(loaded, total)).await?;
    let mut resources = HashMap::new();
    for uri in gltf_import::external_resources(&bytes, path)? {
        let data = fetch_bytes(&uri, |_, _| {}).await?;
        resources.insert(uri, data);
    }
    gltf_import::decode_asset_with(&bytes, path, &resources)
}

async fn fetch_bytes<F>(path: &str, on_progress: F) -> Result<Vec<u8>, LoadError>
where
    F: Fn(u64, Option<u64>),
{
    debug!("fetching {}", path);
    read_body(path, on_progress)
        .await
        .map_err(|e| LoadError::transport(path, js_message(&e)))
}

/// Total size from `Content-Length`, `None` when absent or unparsable
pub fn content_length(header: Option<String>) -> Option<u64> {
    header.and_then(|v| v.trim().parse::<u64>().ok())
}

async fn read_body<F>(path: &str, on_progress: F) -> Result<Vec<u8>, JsValue>
where
    F: Fn(u64, Option<u64>),
{
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(path))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "HTTP {} {}",
            response.status(),
            response.status_text()
        )));
    }
    let total = content_length(response.headers().get("content-length")?);

    let Some(body) = response.body() else {
        let buffer = JsFuture::from(response.array_buffer()?).await?;
        let bytes = Uint8Array::new(&buffer).to_vec();
        on_progress(bytes.len() as u64, total);
        return Ok(bytes);
    };

    let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
    let done_key = JsValue::from_str("done");
    let value_key = JsValue::from_str("value");
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    loop {
        let chunk = JsFuture::from(reader.read()).await?;
        if Reflect::get(&chunk, &done_key)?.is_truthy() {
            break;
        }
        let value = Uint8Array::new(&Reflect::get(&chunk, &value_key)?);
        bytes.extend_from_slice(&value.to_vec());
        on_progress(bytes.len() as u64, total);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length() {
        assert_eq!(content_length(Some("1024".into())), Some(1024));
        assert_eq!(content_length(Some(" 7 ".into())), Some(7));
        assert_eq!(content_length(Some("chunked".into())), None);
        assert_eq!(content_length(None), None);
    }
}
