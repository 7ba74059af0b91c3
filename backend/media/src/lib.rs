//! Image-side building blocks: geometry, annotation rendering, per-message
//! staging, and image hosting.

pub mod geometry;
pub mod hosting;
pub mod mime_detect;
pub mod render;
pub mod staging;

pub use geometry::{face_box, label_background, label_background_width, BoundingBox};
pub use hosting::{ImgurCredentials, ImgurHost};
pub use mime_detect::{detect_mime_type, image_extension};
pub use render::{decode_rgb, AnnotationRenderer, ANNOTATION_RED};
pub use staging::{StagingArea, StagingScope};
