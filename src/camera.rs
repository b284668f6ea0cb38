//! Fly-through camera driven by keyboard and mouse deltas.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use gl::types::GLfloat;

/// Default yaw, in degrees. Looks down -z.
pub const YAW: f32 = -90.0;
/// Default pitch, in degrees.
pub const PITCH: f32 = 0.0;
/// Default movement speed, in units per second.
pub const SPEED: f32 = 2.5;
/// Default degrees of rotation per unit of mouse movement.
pub const SENSITIVITY: f32 = 0.1;
/// Default (and widest) zoom, in degrees.
pub const ZOOM: f32 = 45.0;

const MIN_ZOOM: f32 = 1.0;
const MAX_PITCH: f32 = 89.0;

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
  Forward,
  Backward,
  Left,
  Right,
  Up,
  Down,
}

/// A position plus yaw/pitch, with the derived orthonormal basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
  position: Point3<f32>,
  front: Vector3<f32>,
  up: Vector3<f32>,
  right: Vector3<f32>,
  world_up: Vector3<f32>,

  // Euler angles, in degrees.
  yaw: f32,
  pitch: f32,

  #[allow(missing_docs)]
  pub move_speed: f32,
  #[allow(missing_docs)]
  pub mouse_sensitivity: f32,
  fov: f32,
}

impl Default for Camera {
  fn default() -> Camera {
    Camera::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0), YAW, PITCH)
  }
}

impl Camera {
  /// Create a camera at `position`, oriented by `yaw` and `pitch` (degrees)
  /// relative to `world_up`.
  pub fn new(position: Point3<f32>, world_up: Vector3<f32>, yaw: f32, pitch: f32) -> Camera {
    let mut camera =
      Camera {
        position: position,
        front: Vector3::new(0.0, 0.0, -1.0),
        up: world_up,
        right: Vector3::new(1.0, 0.0, 0.0),
        world_up: world_up,
        yaw: yaw,
        pitch: pitch,
        move_speed: SPEED,
        mouse_sensitivity: SENSITIVITY,
        fov: ZOOM,
      };
    camera.update_camera_vectors();
    camera
  }

  /// World-to-camera transform.
  pub fn view_matrix(&self) -> Matrix4<GLfloat> {
    Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
  }

  /// Move along the camera's own axes for `delta_time` seconds.
  pub fn process_keyboard(&mut self, direction: Movement, delta_time: f32) {
    let velocity = self.move_speed * delta_time;
    match direction {
      Movement::Forward  => self.position += self.front * velocity,
      Movement::Backward => self.position -= self.front * velocity,
      Movement::Left     => self.position -= self.right * velocity,
      Movement::Right    => self.position += self.right * velocity,
      Movement::Up       => self.position += self.up * velocity,
      Movement::Down     => self.position -= self.up * velocity,
    }
  }

  /// Turn by a mouse delta. With `constrain_pitch`, the pitch stays within
  /// +/-89 degrees so the view never flips over.
  pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
    self.yaw += x_offset * self.mouse_sensitivity;
    self.pitch += y_offset * self.mouse_sensitivity;

    if constrain_pitch {
      self.pitch = self.pitch.max(-MAX_PITCH).min(MAX_PITCH);
    }

    self.update_camera_vectors();
  }

  /// Zoom by a scroll delta. Positive zooms in.
  pub fn process_mouse_scroll(&mut self, y_offset: f32) {
    self.fov = (self.fov - y_offset).max(MIN_ZOOM).min(ZOOM);
  }

  /// Zoom, in degrees.
  pub fn fov(&self) -> f32 {
    self.fov
  }

  #[allow(missing_docs)]
  pub fn position(&self) -> Point3<f32> {
    self.position
  }

  #[allow(missing_docs)]
  pub fn front(&self) -> Vector3<f32> {
    self.front
  }

  #[allow(missing_docs)]
  pub fn right(&self) -> Vector3<f32> {
    self.right
  }

  #[allow(missing_docs)]
  pub fn up(&self) -> Vector3<f32> {
    self.up
  }

  /// `(yaw, pitch)` in degrees.
  pub fn angles(&self) -> (f32, f32) {
    (self.yaw, self.pitch)
  }

  fn update_camera_vectors(&mut self) {
    let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
    let front =
      Vector3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
      );
    self.front = front.normalize();
    self.right = self.front.cross(self.world_up).normalize();
    self.up = self.right.cross(self.front).normalize();
  }
}

#[cfg(test)]
fn assert_vec_close(actual: Vector3<f32>, expected: Vector3<f32>) {
  assert!(
    (actual - expected).magnitude() < 1e-5,
    "{:?} != {:?}",
    actual,
    expected,
  );
}

#[test]
fn default_looks_down_negative_z() {
  let camera = Camera::default();
  assert_vec_close(camera.front(), Vector3::new(0.0, 0.0, -1.0));
  assert_vec_close(camera.right(), Vector3::new(1.0, 0.0, 0.0));
  assert_vec_close(camera.up(), Vector3::new(0.0, 1.0, 0.0));
  assert_eq!(camera.fov(), ZOOM);
}

#[test]
fn default_view_is_identity() {
  let view = Camera::default().view_matrix();
  for i in 0 .. 4 {
  for j in 0 .. 4 {
    let expected = if i == j { 1.0 } else { 0.0 };
    assert!((view[i][j] - expected).abs() < 1e-6, "entry [{}][{}] = {}", i, j, view[i][j]);
  }}
}

#[test]
fn keyboard_moves_along_basis() {
  let mut camera = Camera::default();
  camera.process_keyboard(Movement::Forward, 2.0);
  assert_vec_close(camera.position() - Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -5.0));

  camera.process_keyboard(Movement::Right, 1.0);
  camera.process_keyboard(Movement::Up, 0.4);
  assert_vec_close(camera.position() - Point3::new(0.0, 0.0, 0.0), Vector3::new(2.5, 1.0, -5.0));

  camera.process_keyboard(Movement::Backward, 2.0);
  camera.process_keyboard(Movement::Left, 1.0);
  camera.process_keyboard(Movement::Down, 0.4);
  assert_vec_close(camera.position() - Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0));
}

#[test]
fn mouse_turns_camera() {
  let mut camera = Camera::default();
  // 900 * 0.1 = 90 degrees to the right.
  camera.process_mouse_movement(900.0, 0.0, true);
  assert_vec_close(camera.front(), Vector3::new(1.0, 0.0, 0.0));
  assert_vec_close(camera.right(), Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn pitch_is_clamped_when_constrained() {
  let mut camera = Camera::default();
  camera.process_mouse_movement(0.0, 2000.0, true);
  assert_eq!(camera.angles().1, 89.0);
  camera.process_mouse_movement(0.0, -4000.0, true);
  assert_eq!(camera.angles().1, -89.0);

  let mut free = Camera::default();
  free.process_mouse_movement(0.0, 1000.0, false);
  assert_eq!(free.angles().1, 100.0);
}

#[test]
fn scroll_zoom_is_clamped() {
  let mut camera = Camera::default();
  camera.process_mouse_scroll(10.0);
  assert_eq!(camera.fov(), 35.0);
  camera.process_mouse_scroll(100.0);
  assert_eq!(camera.fov(), 1.0);
  camera.process_mouse_scroll(-100.0);
  assert_eq!(camera.fov(), 45.0);
}
