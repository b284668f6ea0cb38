//! A convenience layer over OpenGL: windows and contexts, shader programs,
//! vertex buffers, textures, a fly-through camera, and projection matrices
//! built from calibrated pinhole cameras.
//!
//! Only `projection`, `camera` and `color` are free of GL calls; everything
//! else needs a current context, which `window::Window` provides when the
//! `window` feature is enabled.

#![deny(missing_docs)]

extern crate cgmath;
extern crate gl;
extern crate image;
#[macro_use]
extern crate log;
#[cfg(feature = "window")]
extern crate sdl2;

pub mod camera;
pub mod color;
pub mod error;
pub mod projection;
pub mod shader;
pub mod texture;
pub mod vertex_buffer;
#[cfg(feature = "window")]
pub mod window;

pub use camera::{Camera, Movement};
pub use color::Color4;
pub use error::{Error, Result};
pub use projection::Projection;
pub use shader::Shader;
pub use texture::{Texture2D, TextureParams, TextureUnit};
pub use vertex_buffer::{Usage, VertexBuffers, VertexLayout};
#[cfg(feature = "window")]
pub use window::{Window, WindowConfig};
