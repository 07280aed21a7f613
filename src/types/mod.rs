//! Wire and caller-facing data types.

pub mod content;
pub mod embedding;
pub mod image;
pub mod message;
pub mod request;
pub mod response;

pub use content::*;
pub use embedding::*;
pub use image::*;
pub use message::*;
pub use request::*;
pub use response::*;
