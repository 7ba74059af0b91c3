use std::sync::Arc;

use lensbridge_core::{
    ChatMessenger, ContentSource, FaceAnalyzer, ImageDescriber, ImageHost, TextReader,
};

/// Remote collaborators of the pipeline, constructed once at startup.
#[derive(Clone)]
pub struct Services {
    pub content: Arc<dyn ContentSource>,
    pub messenger: Arc<dyn ChatMessenger>,
    pub host: Arc<dyn ImageHost>,
    pub faces: Arc<dyn FaceAnalyzer>,
    pub reader: Arc<dyn TextReader>,
    pub describer: Arc<dyn ImageDescriber>,
}
