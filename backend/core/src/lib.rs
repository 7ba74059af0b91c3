pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::{BridgeError, BridgeResult};
pub use message::{Delivery, FlexCard, ImageEvent, OutboundMessage};
pub use traits::{
    ChatMessenger, ContentSource, FaceAnalyzer, ImageDescriber, ImageHost, TextReader,
};
pub use types::{
    Candidate, Caption, DetectedFace, FaceIdentification, FaceRegion, IdentifiedFace, Point,
    ReadJob, ReadProgress, ReadStatus, Stage, TextLine, TextRegion,
};
