//! OpenGL projection matrices built from pinhole camera intrinsics.
//!
//! The matrix combines the clipping transform and the NDC transform, so
//! rendering through it reproduces the image a calibrated camera would see.

use cgmath::{Matrix4, Zero};
use gl::types::GLfloat;

use error::{Error, Result};

/// Near clip distance used when none is given.
pub const DEFAULT_Z_NEAR: f32 = 0.1;
/// Far clip distance used when none is given.
pub const DEFAULT_Z_FAR: f32 = 100.0;

/// Tolerance when comparing aspect ratios.
const ASPECT_RATIO_EPSILON: f32 = 1e-6;

/// Pinhole camera projection.
///
/// The derived fields (`a`, `b`, `matrix`) are only ever written by
/// `calc_projection`, so they always agree with the intrinsics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
  z_near: f32,
  z_far: f32,

  fxy: f32,
  cx: f32,
  cy: f32,
  w: f32,
  h: f32,

  a: f32,
  b: f32,

  matrix: Matrix4<GLfloat>,
}

impl Projection {
  /// Construct a projection from full intrinsics.
  ///
  /// `fxy` is the focal length in pixels; for a stereo rig it should be the
  /// stereo-rectified value. `(cx, cy)` is the principal point and `w`x`h`
  /// the image resolution.
  pub fn new(fxy: f32, cx: f32, cy: f32, w: f32, h: f32, z_near: f32, z_far: f32) -> Projection {
    if !(z_near > 0.0 && z_near < z_far) {
      warn!("Clip planes must satisfy 0 < z_near < z_far, got near={} far={}", z_near, z_far);
    }
    if !(fxy > 0.0 && w > 0.0 && h > 0.0) {
      warn!("Degenerate intrinsics: fxy={} size={}x{}", fxy, w, h);
    }

    let mut projection =
      Projection {
        z_near: z_near,
        z_far: z_far,
        fxy: fxy,
        cx: cx,
        cy: cy,
        w: w,
        h: h,
        a: 0.0,
        b: 0.0,
        matrix: Matrix4::zero(),
      };
    projection.calc_projection();
    projection
  }

  /// Construct a projection whose principal point is the image center.
  pub fn centered(fxy: f32, w: f32, h: f32, z_near: f32, z_far: f32) -> Projection {
    Projection::new(fxy, w / 2.0, h / 2.0, w, h, z_near, z_far)
  }

  /// Like `new`, with the default clip planes.
  pub fn with_default_clip(fxy: f32, cx: f32, cy: f32, w: f32, h: f32) -> Projection {
    Projection::new(fxy, cx, cy, w, h, DEFAULT_Z_NEAR, DEFAULT_Z_FAR)
  }

  /// Change the focal length in place.
  pub fn set_focal_length(&mut self, fxy: f32) {
    self.fxy = fxy;
    self.calc_projection();
  }

  /// A copy of this projection with a different focal length.
  pub fn with_focal_length(&self, fxy: f32) -> Projection {
    let mut projection = *self;
    projection.set_focal_length(fxy);
    projection
  }

  /// The 4x4 projection matrix, laid out for `glUniformMatrix4fv` without transposition.
  pub fn matrix(&self) -> &Matrix4<GLfloat> {
    &self.matrix
  }

  /// Convert a sample read from the depth buffer (`GL_DEPTH_COMPONENT`, in
  /// [0, 1]) into the distance along the camera's viewing axis.
  ///
  /// Samples whose NDC depth equals `-A` have no inverse and give a
  /// non-finite result.
  pub fn depth_buffer_to_camera_depth(&self, z_buf: f32) -> f32 {
    self.b / (self.a + 2.0 * z_buf - 1.0)
  }

  /// Derive the projection to use when showing this camera's image on a
  /// near-eye display, so that the scene keeps its real angular size as
  /// seen through the display optics.
  ///
  /// `ocular_fov` is the diagonal field of view of the display optics, in
  /// radians, covering the whole `screen_w`x`screen_h` screen. The image is
  /// drawn in a `disp_w`x`disp_h` region of that screen; pass `0` for both to
  /// fit the image into the screen at its own aspect ratio.
  pub fn adapt_to_ned(
    &self,
    ocular_fov: f32,
    screen_w: u32,
    screen_h: u32,
    disp_w: u32,
    disp_h: u32,
  ) -> Result<Projection> {
    let (disp_w, disp_h) = self.display_region(screen_w, screen_h, disp_w, disp_h)?;
    info!("NED screen: {}x{}, display region: {}x{}.", screen_w, screen_h, disp_w, disp_h);

    let (screen_w, screen_h) = (screen_w as f32, screen_h as f32);
    let (disp_w, disp_h) = (disp_w as f32, disp_h as f32);

    let half_diag_screen = (screen_w * screen_w + screen_h * screen_h).sqrt() / 2.0;
    let half_diag_disp = (disp_w * disp_w + disp_h * disp_h).sqrt() / 2.0;
    let ned_fov = 2.0 * (half_diag_disp / half_diag_screen * (ocular_fov / 2.0).tan()).atan();
    debug!("NED ocular FOV: {} rad, display FOV: {} rad in the display region.", ocular_fov, ned_fov);

    let cam_fov = 2.0 * ((self.w * self.w + self.h * self.h).sqrt() / 2.0 / self.fxy).atan();
    let virtual_fxy = disp_w / self.w * self.fxy;
    let ned_fxy = (cam_fov / 2.0).tan() * virtual_fxy / (ned_fov / 2.0).tan();
    debug!("Camera FOV: {} rad, NED focal length: {}.", cam_fov, ned_fxy);

    Ok(Projection::centered(ned_fxy, disp_w, disp_h, self.z_near, self.z_far))
  }

  /// Resolve the on-screen region the image occupies.
  fn display_region(&self, screen_w: u32, screen_h: u32, disp_w: u32, disp_h: u32) -> Result<(u32, u32)> {
    if screen_w == 0 || screen_h == 0 {
      error!("The NED screen must have a non-zero size, got {}x{}.", screen_w, screen_h);
      return Err(Error::NedScreenSize { width: screen_w, height: screen_h })
    }

    let im_aspect_ratio = self.w / self.h;

    match (disp_w, disp_h) {
      (0, 0) => {
        let screen_aspect_ratio = screen_w as f32 / screen_h as f32;
        if (im_aspect_ratio - screen_aspect_ratio).abs() <= ASPECT_RATIO_EPSILON {
          Ok((screen_w, screen_h))
        } else if im_aspect_ratio < screen_aspect_ratio {
          // Pillarbox.
          Ok(((screen_h as f32 * im_aspect_ratio).round() as u32, screen_h))
        } else {
          // Letterbox.
          Ok((screen_w, (screen_w as f32 / im_aspect_ratio).round() as u32))
        }
      },
      (0, _) | (_, 0) => {
        error!("Both display width and display height should be set, got {}x{}.", disp_w, disp_h);
        Err(Error::NedMissingDisplayDimension { width: disp_w, height: disp_h })
      },
      (disp_w, disp_h) => {
        if (im_aspect_ratio - disp_w as f32 / disp_h as f32).abs() > ASPECT_RATIO_EPSILON {
          error!(
            "The aspect-ratio of the display region ({}x{}) is not equal to the image ({}x{}).",
            disp_w, disp_h, self.w, self.h,
          );
          return Err(Error::NedAspectRatio { display: (disp_w, disp_h), image: (self.w, self.h) })
        }
        Ok((disp_w, disp_h))
      },
    }
  }

  #[allow(missing_docs)]
  pub fn focal_length(&self) -> f32 {
    self.fxy
  }

  #[allow(missing_docs)]
  pub fn principal_point(&self) -> (f32, f32) {
    (self.cx, self.cy)
  }

  /// Image resolution as `(w, h)`.
  pub fn size(&self) -> (f32, f32) {
    (self.w, self.h)
  }

  #[allow(missing_docs)]
  pub fn z_near(&self) -> f32 {
    self.z_near
  }

  #[allow(missing_docs)]
  pub fn z_far(&self) -> f32 {
    self.z_far
  }

  /// The `(A, B)` pair mapping camera depth to NDC depth.
  pub fn depth_coefficients(&self) -> (f32, f32) {
    (self.a, self.b)
  }

  fn calc_projection(&mut self) {
    self.matrix[0][0] = 2.0 * self.fxy / self.w;
    self.matrix[0][2] = 1.0 - 2.0 * self.cx / self.w;
    self.matrix[1][1] = 2.0 * self.fxy / self.h;
    self.matrix[1][2] = 1.0 - 2.0 * self.cy / self.h;

    self.a = -(self.z_far + self.z_near) / (self.z_far - self.z_near);
    self.b = -2.0 * self.z_near * self.z_far / (self.z_far - self.z_near);
    self.matrix[2][2] = self.a;
    self.matrix[3][2] = self.b;

    self.matrix[2][3] = -1.0;
  }
}

#[cfg(test)]
fn assert_close(actual: f32, expected: f32, tolerance: f32) {
  assert!(
    (actual - expected).abs() <= tolerance,
    "{} != {} (tolerance {})",
    actual,
    expected,
    tolerance,
  );
}

#[cfg(test)]
fn vga() -> Projection {
  Projection::new(500.0, 320.0, 240.0, 640.0, 480.0, 0.1, 100.0)
}

#[test]
fn vga_matrix_entries() {
  let p = vga();
  let m = p.matrix();
  assert_close(m[0][0], 1.5625, 1e-6);
  assert_close(m[1][1], 2.083333, 1e-5);
  assert_eq!(m[0][2], 0.0);
  assert_eq!(m[1][2], 0.0);
  assert_close(m[2][2], -1.002002, 1e-5);
  assert_close(m[3][2], -0.2002002, 1e-6);
  assert_eq!(m[2][3], -1.0);

  let (a, b) = p.depth_coefficients();
  assert_eq!(a, m[2][2]);
  assert_eq!(b, m[3][2]);
}

#[test]
fn only_six_entries_are_set() {
  let cases = [
    (350.0, 300.0, 250.0, 640.0, 480.0, 0.5, 20.0),
    (1200.0, 960.0, 540.0, 1920.0, 1080.0, 0.01, 1000.0),
    (80.0, 10.0, 70.0, 100.0, 100.0, 1.0, 2.0),
  ];

  for &(fxy, cx, cy, w, h, z_near, z_far) in cases.iter() {
    let p = Projection::new(fxy, cx, cy, w, h, z_near, z_far);
    let m = p.matrix();
    let expected = [
      ((0, 0), 2.0 * fxy / w),
      ((0, 2), 1.0 - 2.0 * cx / w),
      ((1, 1), 2.0 * fxy / h),
      ((1, 2), 1.0 - 2.0 * cy / h),
      ((2, 2), -(z_far + z_near) / (z_far - z_near)),
      ((3, 2), -2.0 * z_near * z_far / (z_far - z_near)),
      ((2, 3), -1.0),
    ];

    for i in 0 .. 4 {
    for j in 0 .. 4 {
      match expected.iter().find(|&&(ij, _)| ij == (i, j)) {
        Some(&(_, v)) => assert_eq!(m[i][j], v, "entry [{}][{}]", i, j),
        None => assert_eq!(m[i][j], 0.0, "entry [{}][{}]", i, j),
      }
    }}
  }
}

#[test]
fn centered_matches_explicit_principal_point() {
  let centered = Projection::centered(500.0, 640.0, 480.0, 0.1, 100.0);
  assert_eq!(centered, vga());
  assert_eq!(centered.principal_point(), (320.0, 240.0));
}

#[test]
fn default_clip_planes() {
  let p = Projection::with_default_clip(500.0, 320.0, 240.0, 640.0, 480.0);
  assert_eq!(p, vga());
  assert_eq!(p.z_near(), DEFAULT_Z_NEAR);
  assert_eq!(p.z_far(), DEFAULT_Z_FAR);
}

#[test]
fn focal_length_update_rederives_matrix() {
  let mut p = vga();
  p.set_focal_length(820.0);
  assert_eq!(p, Projection::new(820.0, 320.0, 240.0, 640.0, 480.0, 0.1, 100.0));
  assert_eq!(p.focal_length(), 820.0);

  let q = vga().with_focal_length(820.0);
  assert_eq!(q, p);
  assert_eq!(vga().focal_length(), 500.0);
}

#[test]
fn depth_round_trip() {
  let p = Projection::centered(500.0, 640.0, 480.0, 0.1, 100.0);
  let (a, b) = p.depth_coefficients();

  for &distance in [0.15, 0.5, 1.0, 2.5, 10.0, 20.0].iter() {
    // A point `distance` in front of the camera sits at z = -distance.
    let z_cam: f32 = -distance;
    let ndc_z = (a * z_cam + b) / -z_cam;
    let z_buf = (ndc_z + 1.0) / 2.0;
    let depth = p.depth_buffer_to_camera_depth(z_buf);
    assert_close(depth, distance, 1e-4 * distance);
  }
}

#[test]
fn depth_buffer_extremes_are_clip_planes() {
  let p = Projection::centered(500.0, 640.0, 480.0, 0.5, 20.0);
  assert_close(p.depth_buffer_to_camera_depth(0.0), 0.5, 1e-5);
  assert_close(p.depth_buffer_to_camera_depth(1.0), 20.0, 1e-3);
}

#[test]
fn depth_buffer_midpoint_is_near_z_near() {
  let p = vga();
  let (a, b) = p.depth_coefficients();
  let depth = p.depth_buffer_to_camera_depth(0.5);
  assert_close(depth, b / a, 1e-6);
  assert_close(depth, 0.1998, 1e-4);
}

#[test]
fn degenerate_depth_is_not_finite() {
  // near=1, far=3 gives A=-2, B=-3, so A + 2 * z_buf - 1 == 0 exactly at z_buf=1.5.
  let p = Projection::centered(500.0, 640.0, 480.0, 1.0, 3.0);
  assert_eq!(p.depth_coefficients(), (-2.0, -3.0));
  let z_buf = 1.5;
  assert!(!p.depth_buffer_to_camera_depth(z_buf).is_finite());
}

#[test]
fn ned_matching_screen_uses_full_screen() {
  let p = vga();
  let ned = p.adapt_to_ned(1.2, 1280, 960, 0, 0).unwrap();
  assert_eq!(ned.size(), (1280.0, 960.0));
  assert_eq!(ned.principal_point(), (640.0, 480.0));
  assert_eq!(ned.z_near(), p.z_near());
  assert_eq!(ned.z_far(), p.z_far());
}

#[test]
fn ned_fits_image_inside_screen() {
  let p = vga();

  let wide = p.adapt_to_ned(1.2, 1920, 1080, 0, 0).unwrap();
  assert_eq!(wide.size(), (1440.0, 1080.0));

  let tall = p.adapt_to_ned(1.2, 800, 1000, 0, 0).unwrap();
  assert_eq!(tall.size(), (800.0, 600.0));
}

#[test]
fn ned_with_camera_fov_keeps_scaled_focal_length() {
  let p = vga();
  // Diagonal FOV of the camera itself.
  let cam_fov = 2.0 * (400.0f32 / 500.0).atan();
  let ned = p.adapt_to_ned(cam_fov, 1280, 960, 0, 0).unwrap();
  assert_close(ned.focal_length(), 1000.0, 1e-2);
}

#[test]
fn ned_smaller_region_narrows_fov() {
  let p = vga();
  let full = p.adapt_to_ned(1.5, 1280, 960, 1280, 960).unwrap();
  let half = p.adapt_to_ned(1.5, 1280, 960, 640, 480).unwrap();

  let ocular_half_tan = (1.5f32 / 2.0).tan();
  let cam_half_tan = 400.0f32 / 500.0;
  assert_close(full.focal_length(), cam_half_tan * 1000.0 / ocular_half_tan, 1e-2);
  // Half the diagonal gives half the tangent, and half the virtual focal length.
  assert_close(half.focal_length(), full.focal_length(), 1e-2);
}

#[test]
fn ned_rejects_mismatched_region() {
  match vga().adapt_to_ned(1.2, 1280, 960, 640, 400) {
    Err(Error::NedAspectRatio { display, image }) => {
      assert_eq!(display, (640, 400));
      assert_eq!(image, (640.0, 480.0));
    },
    r => panic!("expected an aspect ratio error, got {:?}", r),
  }
}

#[test]
fn ned_rejects_single_dimension() {
  match vga().adapt_to_ned(1.2, 1280, 960, 0, 480) {
    Err(Error::NedMissingDisplayDimension { width: 0, height: 480 }) => {},
    r => panic!("expected a missing dimension error, got {:?}", r),
  }
  match vga().adapt_to_ned(1.2, 1280, 960, 640, 0) {
    Err(Error::NedMissingDisplayDimension { width: 640, height: 0 }) => {},
    r => panic!("expected a missing dimension error, got {:?}", r),
  }
}

#[test]
fn ned_rejects_empty_screen() {
  for &(w, h, disp_w, disp_h) in &[(1280, 0, 0, 0), (0, 960, 0, 0), (0, 0, 0, 0), (0, 0, 640, 480)] {
    match vga().adapt_to_ned(1.2, w, h, disp_w, disp_h) {
      Err(Error::NedScreenSize { width, height }) => assert_eq!((width, height), (w, h)),
      r => panic!("expected a screen size error for {}x{}, got {:?}", w, h, r),
    }
  }
}

#[test]
fn ned_leaves_source_untouched() {
  let p = vga();
  let _ = p.adapt_to_ned(1.2, 1920, 1080, 0, 0).unwrap();
  assert_eq!(p, vga());
}
