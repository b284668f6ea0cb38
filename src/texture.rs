//! 2D textures loaded from image files.

use gl;
use gl::types::*;
use image;
use image::DynamicImage;
use std::path::Path;

use error::{Error, Result};

/// Highest texture unit a `Texture2D` may be bound to.
pub const MAX_TEXTURE_UNIT: u32 = 8;

/// A texture unit index, `GL_TEXTURE0 + index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnit(u32);

impl TextureUnit {
  #[allow(missing_docs)]
  pub fn new(index: u32) -> Result<TextureUnit> {
    if index > MAX_TEXTURE_UNIT {
      error!("Only texture units 0..={} are supported, got {}.", MAX_TEXTURE_UNIT, index);
      return Err(Error::TextureUnit(index))
    }
    Ok(TextureUnit(index))
  }

  #[allow(missing_docs)]
  pub fn index(&self) -> u32 {
    self.0
  }

  /// The `GL_TEXTUREn` enum for this unit.
  pub fn gl_enum(&self) -> GLenum {
    gl::TEXTURE0 + self.0
  }
}

/// Wrapping and filtering applied at upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
  /// Applied to both S and T.
  pub wrap: GLenum,
  #[allow(missing_docs)]
  pub min_filter: GLenum,
  #[allow(missing_docs)]
  pub mag_filter: GLenum,
}

impl Default for TextureParams {
  fn default() -> TextureParams {
    TextureParams {
      wrap: gl::REPEAT,
      min_filter: gl::LINEAR_MIPMAP_LINEAR,
      mag_filter: gl::LINEAR,
    }
  }
}

/// Pixel data ready for `glTexImage2D`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixels {
  /// `gl::RGB` or `gl::RGBA`.
  pub format: GLenum,
  #[allow(missing_docs)]
  pub width: u32,
  #[allow(missing_docs)]
  pub height: u32,
  /// Tightly packed rows, bottom row first.
  pub data: Vec<u8>,
}

/// Flip an image so its first row is the bottom one, as GL expects, and pick
/// RGBA for 4-channel images and RGB otherwise.
pub fn prepare_pixels(image: &DynamicImage) -> Pixels {
  let image = image.flipv();
  let (width, height) = (image.width(), image.height());
  if image.color().channel_count() == 4 {
    Pixels { format: gl::RGBA, width: width, height: height, data: image.to_rgba8().into_raw() }
  } else {
    Pixels { format: gl::RGB, width: width, height: height, data: image.to_rgb8().into_raw() }
  }
}

/// A mipmapped 2D texture attached to one texture unit.
pub struct Texture2D {
  id: GLuint,
  unit: TextureUnit,
  size: (u32, u32),
}

impl Texture2D {
  /// Decode the image at `path` and upload it.
  pub fn load<P: AsRef<Path>>(path: P, unit: TextureUnit, params: TextureParams) -> Result<Texture2D> {
    let path = path.as_ref();
    let image =
      image::open(path).map_err(|e| {
        error!("Failed to load texture {}: {}", path.display(), e);
        Error::from(e)
      })?;
    let texture = Texture2D::from_image(&image, unit, params);
    info!("Loaded texture {} ({}x{}) on unit {}.", path.display(), texture.size.0, texture.size.1, unit.index());
    Ok(texture)
  }

  /// Upload an already decoded image.
  pub fn from_image(image: &DynamicImage, unit: TextureUnit, params: TextureParams) -> Texture2D {
    let pixels = prepare_pixels(image);

    let mut id = 0;
    unsafe {
      gl::GenTextures(1, &mut id);
      gl::ActiveTexture(unit.gl_enum());
      gl::BindTexture(gl::TEXTURE_2D, id);

      gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, params.wrap as GLint);
      gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, params.wrap as GLint);
      gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, params.min_filter as GLint);
      gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, params.mag_filter as GLint);

      // RGB rows are not 4-byte aligned in general.
      gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
      gl::TexImage2D(
        gl::TEXTURE_2D,
        0,
        pixels.format as GLint,
        pixels.width as GLsizei,
        pixels.height as GLsizei,
        0,
        pixels.format,
        gl::UNSIGNED_BYTE,
        pixels.data.as_ptr() as *const _,
      );
      gl::GenerateMipmap(gl::TEXTURE_2D);
    }

    Texture2D {
      id: id,
      unit: unit,
      size: (pixels.width, pixels.height),
    }
  }

  /// Activate this texture's unit and bind it there.
  pub fn bind(&self) {
    unsafe {
      gl::ActiveTexture(self.unit.gl_enum());
      gl::BindTexture(gl::TEXTURE_2D, self.id);
    }
  }

  #[allow(missing_docs)]
  pub fn unit(&self) -> TextureUnit {
    self.unit
  }

  #[allow(missing_docs)]
  pub fn size(&self) -> (u32, u32) {
    self.size
  }

  /// The GL texture name.
  pub fn id(&self) -> GLuint {
    self.id
  }
}

impl Drop for Texture2D {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteTextures(1, &self.id);
    }
  }
}

#[test]
fn texture_unit_range() {
  assert_eq!(TextureUnit::new(0).unwrap().gl_enum(), gl::TEXTURE0);
  assert_eq!(TextureUnit::new(8).unwrap().gl_enum(), gl::TEXTURE8);
  match TextureUnit::new(9) {
    Err(Error::TextureUnit(9)) => {},
    r => panic!("expected a texture unit error, got {:?}", r),
  }
}

#[test]
fn pixels_are_flipped_rgb() {
  // Top row red, bottom row blue.
  let image =
    image::RgbImage::from_fn(2, 2, |_, y| {
      if y == 0 { image::Rgb([255, 0, 0]) } else { image::Rgb([0, 0, 255]) }
    });
  let pixels = prepare_pixels(&DynamicImage::ImageRgb8(image));

  assert_eq!(pixels.format, gl::RGB);
  assert_eq!((pixels.width, pixels.height), (2, 2));
  assert_eq!(
    pixels.data,
    vec![
      0, 0, 255,  0, 0, 255,
      255, 0, 0,  255, 0, 0,
    ],
  );
}

#[test]
fn alpha_images_upload_as_rgba() {
  let image = image::RgbaImage::from_pixel(3, 1, image::Rgba([1, 2, 3, 4]));
  let pixels = prepare_pixels(&DynamicImage::ImageRgba8(image));
  assert_eq!(pixels.format, gl::RGBA);
  assert_eq!(pixels.data, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
}

#[test]
fn grayscale_expands_to_rgb() {
  let image = image::GrayImage::from_pixel(1, 1, image::Luma([7]));
  let pixels = prepare_pixels(&DynamicImage::ImageLuma8(image));
  assert_eq!(pixels.format, gl::RGB);
  assert_eq!(pixels.data, vec![7, 7, 7]);
}

#[test]
fn missing_file_is_an_image_error() {
  let unit = TextureUnit::new(0).unwrap();
  match Texture2D::load("/nonexistent/gl_util/texture.png", unit, TextureParams::default()) {
    Err(Error::Image(_)) => {},
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("loaded a missing texture"),
  }
}
