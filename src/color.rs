//! Color structs

#[derive(Debug, Clone, Copy, PartialEq)]
/// A color with RGBA channels.
pub struct Color4<T> {
  /// Red
  pub r: T,
  /// Green
  pub g: T,
  /// Blue
  pub b: T,
  /// Alpha
  pub a: T,
}

impl<T: Copy> Color4<T> {
  /// Constructs a new `Color4` out of its RGBA values.
  pub fn of_rgba(r: T, g: T, b: T, a: T) -> Color4<T> {
    Color4 { r: r, g: g, b: b, a: a }
  }
}

impl Color4<u8> {
  /// Scale 8-bit channels into [0, 1], as `glClearColor` expects.
  pub fn to_float(&self) -> Color4<f32> {
    let f = |c: u8| c as f32 / 255.0;
    Color4::of_rgba(f(self.r), f(self.g), f(self.b), f(self.a))
  }
}

impl Default for Color4<u8> {
  fn default() -> Color4<u8> {
    Color4::of_rgba(0, 0, 0, 255)
  }
}

#[test]
fn bytes_to_float() {
  let c = Color4::of_rgba(255u8, 0, 51, 255).to_float();
  assert_eq!(c, Color4::of_rgba(1.0, 0.0, 0.2, 1.0));
}
