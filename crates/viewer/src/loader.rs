//! Asset loading capability and the completion messages loaders post back
//!
//! Loaders never touch the viewport directly. Each request carries a sink;
//! the loader reports progress and the final result through it and the
//! viewport drains the messages on its next tick.

use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::LoadError;
use crate::gltf_import;
use crate::scene::{SceneNode, Texture};

/// Identifies one `load_asset` call; incremented per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LoadToken(pub u64);

impl LoadToken {
    pub fn next(self) -> Self {
        LoadToken(self.0 + 1)
    }
}

/// Which texture assignment a texture request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// `texture_path` of the viewer options
    Configured,
    /// Texture of a configurator material option
    Material,
}

/// Completion messages posted by loaders
#[derive(Debug)]
pub enum LoadMessage {
    Progress {
        token: LoadToken,
        loaded: u64,
        total: Option<u64>,
    },
    Asset {
        token: LoadToken,
        path: String,
        result: Result<SceneNode, LoadError>,
    },
    Texture {
        token: LoadToken,
        slot: TextureSlot,
        generation: u64,
        path: String,
        result: Result<Texture, LoadError>,
    },
}

pub type LoadReceiver = UnboundedReceiver<LoadMessage>;

/// Sending half of the viewport's load channel
#[derive(Debug, Clone)]
pub struct LoadQueue {
    tx: UnboundedSender<LoadMessage>,
}

impl LoadQueue {
    pub fn channel() -> (LoadQueue, LoadReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (LoadQueue { tx }, rx)
    }

    pub fn asset_sink(&self, token: LoadToken, path: &str) -> AssetSink {
        AssetSink {
            tx: self.tx.clone(),
            token,
            path: path.to_string(),
        }
    }

    pub fn texture_sink(
        &self,
        token: LoadToken,
        slot: TextureSlot,
        generation: u64,
        path: &str,
    ) -> TextureSink {
        TextureSink {
            tx: self.tx.clone(),
            token,
            slot,
            generation,
            path: path.to_string(),
        }
    }
}

fn post(tx: &UnboundedSender<LoadMessage>, msg: LoadMessage) {
    if tx.send(msg).is_err() {
        debug!("load completion dropped: viewport is gone");
    }
}

/// Reply channel of one asset request
#[derive(Debug)]
pub struct AssetSink {
    tx: UnboundedSender<LoadMessage>,
    token: LoadToken,
    path: String,
}

impl AssetSink {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn token(&self) -> LoadToken {
        self.token
    }

    /// Transfer progress; `total` is `None` when the size is unknown
    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        post(
            &self.tx,
            LoadMessage::Progress {
                token: self.token,
                loaded,
                total,
            },
        );
    }

    pub fn complete(self, result: Result<SceneNode, LoadError>) {
        post(
            &self.tx,
            LoadMessage::Asset {
                token: self.token,
                path: self.path,
                result,
            },
        );
    }
}

/// Reply channel of one texture request
#[derive(Debug)]
pub struct TextureSink {
    tx: UnboundedSender<LoadMessage>,
    token: LoadToken,
    slot: TextureSlot,
    generation: u64,
    path: String,
}

impl TextureSink {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn slot(&self) -> TextureSlot {
        self.slot
    }

    pub fn complete(self, result: Result<Texture, LoadError>) {
        post(
            &self.tx,
            LoadMessage::Texture {
                token: self.token,
                slot: self.slot,
                generation: self.generation,
                path: self.path,
                result,
            },
        );
    }

    pub fn complete_bytes(self, bytes: Result<Vec<u8>, LoadError>) {
        let result = bytes.and_then(|b| gltf_import::decode_texture(&b, &self.path));
        self.complete(result);
    }
}

/// Fetches assets and textures. Implementations may complete synchronously
/// inside the call or later from the event loop.
pub trait AssetLoader {
    fn load_asset(&mut self, path: &str, sink: AssetSink);

    fn load_texture(&mut self, path: &str, sink: TextureSink);
}

/// Reads from the local filesystem, completing inside the call
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Paths resolve relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsLoader {
    fn load_asset(&mut self, path: &str, sink: AssetSink) {
        let full = self.root.join(path);
        if let Ok(meta) = std::fs::metadata(&full) {
            sink.progress(meta.len(), Some(meta.len()));
        }
        sink.complete(gltf_import::import_file(&full));
    }

    fn load_texture(&mut self, path: &str, sink: TextureSink) {
        let bytes = std::fs::read(self.root.join(path)).map_err(|e| LoadError::transport(path, e));
        sink.complete_bytes(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_posts_tagged_messages() {
        let (queue, mut rx) = LoadQueue::channel();
        let sink = queue.asset_sink(LoadToken(7), "chair.glb");
        sink.progress(10, Some(100));
        sink.complete(Err(LoadError::transport("chair.glb", "404")));

        match rx.try_recv().unwrap() {
            LoadMessage::Progress { token, loaded, total } => {
                assert_eq!(token, LoadToken(7));
                assert_eq!((loaded, total), (10, Some(100)));
            }
            other => panic!("unexpected {:?}", other),
        }
        match rx.try_recv().unwrap() {
            LoadMessage::Asset { token, path, result } => {
                assert_eq!(token, LoadToken(7));
                assert_eq!(path, "chair.glb");
                assert!(result.is_err());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sink_after_receiver_dropped() {
        let (queue, rx) = LoadQueue::channel();
        drop(rx);
        queue
            .texture_sink(LoadToken(1), TextureSlot::Material, 2, "a.png")
            .complete(Err(LoadError::Cancelled));
    }

    #[test]
    fn test_fs_loader_missing_file_is_transport_error() {
        let (queue, mut rx) = LoadQueue::channel();
        let mut loader = FsLoader::new(std::env::temp_dir());
        loader.load_texture(
            "product-viewer-missing.png",
            queue.texture_sink(LoadToken(1), TextureSlot::Configured, 1, "product-viewer-missing.png"),
        );
        match rx.try_recv().unwrap() {
            LoadMessage::Texture { result, slot, .. } => {
                assert_eq!(slot, TextureSlot::Configured);
                assert!(matches!(result, Err(LoadError::Transport { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
