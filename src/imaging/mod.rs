//! # Image Handling
//!
//! Upload normalization, the face-region mask, post-processing and encoding.
//! Everything here is synchronous and CPU-bound; async callers run it on the
//! blocking pool.

pub mod mask;
pub mod processor;
pub mod types;

pub use mask::{face_mask, region_mask, MaskRegion};
pub use processor::{apply_post_process, decode_generated, encode, normalize};
pub use types::{ImageKind, ALLOWED_EXTENSIONS};
