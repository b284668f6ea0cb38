//! Error types for the GL utilities.

use image;
use std;
use std::fmt;
use std::path::PathBuf;

/// Result type alias using `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the utilities can report.
#[derive(Debug)]
pub enum Error {
  /// The explicit near-eye-display region does not have the image's aspect ratio.
  NedAspectRatio {
    /// Requested display region, in pixels.
    display: (u32, u32),
    /// Camera image size, in pixels.
    image: (f32, f32),
  },
  /// Only one of the display region dimensions was given.
  NedMissingDisplayDimension {
    #[allow(missing_docs)]
    width: u32,
    #[allow(missing_docs)]
    height: u32,
  },
  /// The near-eye-display screen has a zero dimension.
  NedScreenSize {
    #[allow(missing_docs)]
    width: u32,
    #[allow(missing_docs)]
    height: u32,
  },
  /// A file could not be read.
  Io {
    #[allow(missing_docs)]
    path: PathBuf,
    #[allow(missing_docs)]
    source: std::io::Error,
  },
  /// An image could not be opened or decoded.
  Image(image::ImageError),
  /// A shader stage failed to compile.
  ShaderCompile {
    /// "VERTEX" or "FRAGMENT".
    stage: &'static str,
    /// Driver info log.
    log: String,
  },
  /// A shader program failed to link.
  ShaderLink {
    /// Driver info log.
    log: String,
  },
  /// Vertex data does not fit the given layout.
  VertexLayout(String),
  /// No vertex data has been bound yet.
  NotBound,
  /// Texture unit out of the supported range.
  TextureUnit(u32),
  /// Window or GL context creation failed.
  Window(String),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Error::NedAspectRatio { display, image } =>
        write!(
          f,
          "the aspect-ratio of the display region ({}x{}) is not equal to the image ({}x{})",
          display.0, display.1, image.0, image.1,
        ),
      Error::NedMissingDisplayDimension { width, height } =>
        write!(f, "both display width and display height should be set (got {}x{})", width, height),
      Error::NedScreenSize { width, height } =>
        write!(f, "the NED screen must have a non-zero size (got {}x{})", width, height),
      Error::Io { ref path, ref source } => write!(f, "cannot read {}: {}", path.display(), source),
      Error::Image(ref e) => write!(f, "image error: {}", e),
      Error::ShaderCompile { stage, ref log } => write!(f, "{} shader compilation failed:\n{}", stage, log),
      Error::ShaderLink { ref log } => write!(f, "shader program linking failed:\n{}", log),
      Error::VertexLayout(ref msg) => write!(f, "vertex layout mismatch: {}", msg),
      Error::NotBound => write!(f, "no vertex data is bound"),
      Error::TextureUnit(unit) => write!(f, "texture unit {} is not supported (0..={})", unit, ::texture::MAX_TEXTURE_UNIT),
      Error::Window(ref msg) => write!(f, "window error: {}", msg),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match *self {
      Error::Io { ref source, .. } => Some(source),
      Error::Image(ref e) => Some(e),
      _ => None,
    }
  }
}

impl From<image::ImageError> for Error {
  fn from(err: image::ImageError) -> Self {
    Error::Image(err)
  }
}

#[test]
fn ned_errors_name_the_region() {
  let e = Error::NedAspectRatio { display: (640, 400), image: (640.0, 480.0) };
  assert_eq!(
    e.to_string(),
    "the aspect-ratio of the display region (640x400) is not equal to the image (640x480)",
  );

  let e = Error::NedMissingDisplayDimension { width: 0, height: 720 };
  assert!(e.to_string().contains("0x720"));

  let e = Error::NedScreenSize { width: 1280, height: 0 };
  assert_eq!(e.to_string(), "the NED screen must have a non-zero size (got 1280x0)");
}
