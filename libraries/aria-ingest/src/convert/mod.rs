//! File conversion plugins
//!
//! Two independent converters normalize directory contents in place:
//! images are re-encoded as JPEG, audio containers are transcoded to
//! MP3 through an external transcoder.

pub mod audio;
pub mod image;

pub use audio::AudioConvertPlugin;
pub use image::ImageConvertPlugin;
