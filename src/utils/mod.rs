//! Utility functions

pub mod image;

pub use self::image::{decode_image, load_image_file};
