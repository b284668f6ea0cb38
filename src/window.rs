//! Window and OpenGL context management, on top of SDL2.
//!
//! All GL calls made through this crate must happen on the thread that
//! created the `Window`.

use cgmath::Vector2;
use gl;
use gl::types::*;
use sdl2;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::{KeyboardState, Scancode};
use sdl2::rect::Rect;
use sdl2::video::{FullscreenType, GLContext, GLProfile, SwapInterval, WindowPos};

use color::Color4;
use error::{Error, Result};

#[allow(missing_docs)]
pub const GL_MAJOR_VERSION: u8 = 3;
#[allow(missing_docs)]
pub const GL_MINOR_VERSION: u8 = 3;

/// Called once per `clear` with the current keyboard state. Setting the flag
/// asks the window to close.
pub type KeyboardCallback = Box<dyn FnMut(&KeyboardState, &mut bool)>;

/// How to create a `Window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
  #[allow(missing_docs)]
  pub width: u32,
  #[allow(missing_docs)]
  pub height: u32,
  #[allow(missing_docs)]
  pub title: String,
  /// Create the window hidden, e.g. for offscreen rendering.
  pub visible: bool,
  /// Core-profile context version.
  pub gl_version: (u8, u8),
  /// Capture the mouse for relative motion, as a fly-through camera wants.
  pub relative_mouse: bool,
  /// Draw the title bar and borders.
  pub decorated: bool,
  /// Open centered on this display instead of the primary one.
  pub display: Option<i32>,
}

impl Default for WindowConfig {
  fn default() -> WindowConfig {
    WindowConfig {
      width: 800,
      height: 600,
      title: String::from("gl_util"),
      visible: true,
      gl_version: (GL_MAJOR_VERSION, GL_MINOR_VERSION),
      relative_mouse: false,
      decorated: true,
      display: None,
    }
  }
}

/// Close on Escape.
fn default_keyboard_callback(keys: &KeyboardState, should_close: &mut bool) {
  if keys.is_scancode_pressed(Scancode::Escape) {
    *should_close = true;
  }
}

fn window_error<'a, E: ::std::fmt::Display>(what: &'a str) -> impl FnOnce(E) -> Error + 'a {
  move |e| {
    error!("{}: {}", what, e);
    Error::Window(format!("{}: {}", what, e))
  }
}

/// GL viewport extent for a drawable size in pixels.
fn viewport_size(drawable: (u32, u32)) -> (GLsizei, GLsizei) {
  let clamp = |x: u32| if x > GLsizei::max_value() as u32 { GLsizei::max_value() } else { x as GLsizei };
  (clamp(drawable.0), clamp(drawable.1))
}

fn set_viewport(window: &sdl2::video::Window) {
  let (w, h) = viewport_size(window.drawable_size());
  unsafe {
    gl::Viewport(0, 0, w, h);
  }
}

fn check_display_index(index: i32, count: i32) -> Result<()> {
  if index < 0 || index >= count {
    error!("No display {}, {} connected.", index, count);
    return Err(Error::Window(format!("No display {} ({} connected)", index, count)))
  }
  Ok(())
}

/// Top-left corner that centers a window of `size` in `bounds`.
fn centered_in(bounds: Rect, size: (u32, u32)) -> (i32, i32) {
  let x = bounds.x() + (bounds.width() as i32 - size.0 as i32) / 2;
  let y = bounds.y() + (bounds.height() as i32 - size.1 as i32) / 2;
  (x, y)
}

fn display_bounds(video: &sdl2::VideoSubsystem, index: i32) -> Result<Rect> {
  let count = video.num_video_displays().map_err(window_error("Cannot count displays"))?;
  check_display_index(index, count)?;
  video.display_bounds(index).map_err(window_error("Cannot query display bounds"))
}

/// A window with its own GL context.
pub struct Window {
  sdl: sdl2::Sdl,
  video: sdl2::VideoSubsystem,
  window: sdl2::video::Window,
  gl_context: GLContext,
  event_pump: sdl2::EventPump,

  background: Color4<u8>,
  depth_test: Option<GLenum>,
  should_close: bool,
  on_keyboard: KeyboardCallback,

  mouse_motion: Vector2<i32>,
  scroll: i32,
}

impl Window {
  /// Open a window, create its GL context and load the GL function pointers.
  pub fn new(config: &WindowConfig) -> Result<Window> {
    let sdl = sdl2::init().map_err(window_error("Cannot initialize SDL"))?;
    let video = sdl.video().map_err(window_error("Cannot initialize SDL video"))?;

    {
      let gl_attr = video.gl_attr();
      gl_attr.set_context_profile(GLProfile::Core);
      gl_attr.set_context_version(config.gl_version.0, config.gl_version.1);
      gl_attr.set_depth_size(24);
      gl_attr.set_double_buffer(true);
    }

    let window = {
      let mut builder = video.window(&config.title, config.width, config.height);
      builder.opengl().resizable();
      match config.display {
        None => { builder.position_centered(); },
        Some(index) => {
          let (x, y) = centered_in(display_bounds(&video, index)?, (config.width, config.height));
          builder.position(x, y);
        },
      }
      if !config.decorated {
        builder.borderless();
      }
      if !config.visible {
        builder.hidden();
      }
      builder.build().map_err(window_error("Cannot create window"))?
    };

    let gl_context = window.gl_create_context().map_err(window_error("Cannot create GL context"))?;
    window.gl_make_current(&gl_context).map_err(window_error("Cannot activate GL context"))?;

    // Load the OpenGL function pointers.
    gl::load_with(|s| video.gl_get_proc_address(s) as *const _);

    if let Err(e) = video.gl_set_swap_interval(SwapInterval::VSync) {
      warn!("Cannot enable vsync: {}", e);
    }

    let event_pump = sdl.event_pump().map_err(window_error("Cannot create event pump"))?;

    set_viewport(&window);

    info!(
      "Opened {}x{} window {:?} with GL {}.{} core.",
      config.width, config.height, config.title, config.gl_version.0, config.gl_version.1,
    );

    let window = Window {
      sdl: sdl,
      video: video,
      window: window,
      gl_context: gl_context,
      event_pump: event_pump,
      background: Color4::default(),
      depth_test: None,
      should_close: false,
      on_keyboard: Box::new(default_keyboard_callback),
      mouse_motion: Vector2::new(0, 0),
      scroll: 0,
    };
    window.set_relative_mouse(config.relative_mouse);
    Ok(window)
  }

  /// Make this window's context current.
  pub fn activate(&self) -> Result<()> {
    self.window.gl_make_current(&self.gl_context).map_err(window_error("Cannot activate GL context"))
  }

  /// Unbind buffers and release the current context.
  pub fn deactivate(&self) -> Result<()> {
    unsafe {
      gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0);
      gl::BindBuffer(gl::ARRAY_BUFFER, 0);
      gl::BindVertexArray(0);
    }
    self.video.gl_release_current_context().map_err(window_error("Cannot release GL context"))
  }

  #[allow(missing_docs)]
  pub fn hide(&mut self) {
    self.window.hide();
  }

  #[allow(missing_docs)]
  pub fn show(&mut self) {
    self.window.show();
  }

  /// Clear the color (and depth, with depth testing on) buffers, then run
  /// the keyboard callback.
  pub fn clear(&mut self) {
    let c = self.background.to_float();
    unsafe {
      gl::ClearColor(c.r, c.g, c.b, c.a);
      let mut mask = gl::COLOR_BUFFER_BIT;
      if self.depth_test.is_some() {
        mask |= gl::DEPTH_BUFFER_BIT;
      }
      gl::Clear(mask);
    }

    let keys = self.event_pump.keyboard_state();
    (self.on_keyboard)(&keys, &mut self.should_close);
  }

  /// Swap buffers and process pending window events.
  pub fn refresh(&mut self) {
    self.window.gl_swap_window();

    self.mouse_motion = Vector2::new(0, 0);
    self.scroll = 0;
    for event in self.event_pump.poll_iter() {
      match event {
        Event::Quit{..} | Event::AppTerminating{..} => {
          self.should_close = true;
        },
        Event::Window { win_event: WindowEvent::SizeChanged(w, h), .. } => {
          // The framebuffer can be larger than the window on HiDPI displays.
          let (fw, fh) = self.window.drawable_size();
          debug!("Window resized to {}x{} ({}x{} pixels).", w, h, fw, fh);
          set_viewport(&self.window);
        },
        Event::MouseMotion { xrel, yrel, .. } => {
          self.mouse_motion.x += xrel;
          self.mouse_motion.y += yrel;
        },
        Event::MouseWheel { y, .. } => {
          self.scroll += y;
        },
        _ => {},
      }
    }
  }

  #[allow(missing_docs)]
  pub fn should_close(&self) -> bool {
    self.should_close
  }

  /// Ask the render loop to stop.
  pub fn close(&mut self) {
    self.should_close = true;
  }

  /// Enable depth testing with the given comparison, e.g. `gl::LEQUAL`.
  pub fn enable_depth_test(&mut self, depth_func: GLenum) {
    unsafe {
      gl::Enable(gl::DEPTH_TEST);
      gl::DepthFunc(depth_func);
    }
    self.depth_test = Some(depth_func);
  }

  #[allow(missing_docs)]
  pub fn disable_depth_test(&mut self) {
    unsafe {
      gl::Disable(gl::DEPTH_TEST);
    }
    self.depth_test = None;
  }

  #[allow(missing_docs)]
  pub fn set_background_color(&mut self, r: u8, g: u8, b: u8, a: u8) {
    self.background = Color4::of_rgba(r, g, b, a);
  }

  /// Switch between desktop fullscreen and windowed mode.
  pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
    let mode = if fullscreen { FullscreenType::Desktop } else { FullscreenType::Off };
    self.window.set_fullscreen(mode).map_err(window_error("Cannot change fullscreen mode"))
  }

  /// Move the window to display `display_index` and make it fullscreen there.
  pub fn set_fullscreen_on(&mut self, display_index: i32) -> Result<()> {
    let bounds = display_bounds(&self.video, display_index)?;
    self.window.set_fullscreen(FullscreenType::Off).map_err(window_error("Cannot change fullscreen mode"))?;
    let (x, y) = centered_in(bounds, self.window.size());
    self.window.set_position(WindowPos::Positioned(x), WindowPos::Positioned(y));
    info!("Going fullscreen on display {} ({}x{}).", display_index, bounds.width(), bounds.height());
    self.set_fullscreen(true)
  }

  /// Number of connected displays, for `set_fullscreen_on`.
  pub fn display_count(&self) -> Result<i32> {
    self.video.num_video_displays().map_err(window_error("Cannot count displays"))
  }

  /// Replace the per-frame keyboard handling (default: Escape closes).
  pub fn set_keyboard_callback<F>(&mut self, callback: F)
    where F: FnMut(&KeyboardState, &mut bool) + 'static
  {
    self.on_keyboard = Box::new(callback);
  }

  /// Read one depth-buffer sample, in [0, 1]. `(x, y)` is in window
  /// pixels with the origin at the bottom-left.
  pub fn read_depth(&self, x: i32, y: i32) -> f32 {
    let mut depth: GLfloat = 0.0;
    unsafe {
      gl::ReadPixels(x, y, 1, 1, gl::DEPTH_COMPONENT, gl::FLOAT, &mut depth as *mut GLfloat as *mut _);
    }
    depth
  }

  /// Drawable size in pixels.
  pub fn size(&self) -> (u32, u32) {
    self.window.drawable_size()
  }

  /// Relative mouse movement seen by the last `refresh`.
  pub fn mouse_motion(&self) -> Vector2<i32> {
    self.mouse_motion
  }

  /// Vertical wheel movement seen by the last `refresh`.
  pub fn scroll(&self) -> i32 {
    self.scroll
  }

  /// Current keyboard state, for per-frame movement.
  pub fn keyboard_state(&self) -> KeyboardState {
    self.event_pump.keyboard_state()
  }

  /// Capture or release the mouse for relative motion.
  pub fn set_relative_mouse(&self, on: bool) {
    self.sdl.mouse().set_relative_mouse_mode(on);
  }

  #[allow(missing_docs)]
  pub fn video(&self) -> &sdl2::VideoSubsystem {
    &self.video
  }
}

#[test]
fn viewport_follows_drawable_pixels() {
  assert_eq!(viewport_size((1600, 1200)), (1600, 1200));
  assert_eq!(viewport_size((0, 0)), (0, 0));
  assert_eq!(viewport_size((u32::max_value(), 7)), (GLsizei::max_value(), 7));
}

#[test]
fn sdl_failures_become_window_errors() {
  match Err::<(), _>("context lost").map_err(window_error("Cannot release GL context")) {
    Err(Error::Window(ref msg)) => assert_eq!(msg, "Cannot release GL context: context lost"),
    r => panic!("expected a window error, got {:?}", r),
  }
}

#[test]
fn display_index_must_exist() {
  assert!(check_display_index(0, 1).is_ok());
  assert!(check_display_index(1, 2).is_ok());
  for &(index, count) in &[(1, 1), (-1, 2), (0, 0)] {
    match check_display_index(index, count) {
      Err(Error::Window(_)) => {},
      r => panic!("expected a window error for display {} of {}, got {:?}", index, count, r),
    }
  }
}

#[test]
fn windows_center_on_their_display() {
  // A secondary 1920x1080 display to the right of a 2560-wide primary.
  let bounds = Rect::new(2560, 0, 1920, 1080);
  assert_eq!(centered_in(bounds, (800, 600)), (2560 + 560, 240));
  assert_eq!(centered_in(bounds, (1920, 1080)), (2560, 0));
}

#[test]
fn default_config_is_a_decorated_window_on_the_primary_display() {
  let config = WindowConfig::default();
  assert!(config.decorated);
  assert_eq!(config.display, None);
  assert_eq!((config.width, config.height), (800, 600));
}
