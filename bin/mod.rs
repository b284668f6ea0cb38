//! Demo binary: a textured quad seen through a pinhole camera projection,
//! flown around with WASD + mouse.
//!
//! Usage: `gl-util-demo [shader_dir] [texture] [ned_fov_degrees screen_w screen_h]`

#![deny(missing_docs)]

extern crate cgmath;
extern crate env_logger;
extern crate gl;
extern crate gl_util;
extern crate image;
#[macro_use]
extern crate log;
extern crate sdl2;

use cgmath::Point3;
use sdl2::keyboard::Scancode;
use std::env;
use std::process;
use std::time::Instant;

use gl_util::camera;
use gl_util::{Camera, Movement, Projection, Shader, Texture2D, TextureParams, TextureUnit};
use gl_util::{Usage, VertexBuffers, VertexLayout, Window, WindowConfig};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

const MOVEMENT_KEYS: [(Scancode, Movement); 6] = [
  (Scancode::W, Movement::Forward),
  (Scancode::S, Movement::Backward),
  (Scancode::A, Movement::Left),
  (Scancode::D, Movement::Right),
  (Scancode::Space, Movement::Up),
  (Scancode::LShift, Movement::Down),
];

/// A unit quad facing +z, as (x, y, z, u, v).
const QUAD_VERTICES: [f32; 20] = [
  -1.0, -1.0, 0.0,  0.0, 0.0,
   1.0, -1.0, 0.0,  1.0, 0.0,
   1.0,  1.0, 0.0,  1.0, 1.0,
  -1.0,  1.0, 0.0,  0.0, 1.0,
];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

struct NedArgs {
  ocular_fov: f32,
  screen_w: u32,
  screen_h: u32,
}

fn focal_length_for_zoom(zoom_degrees: f32, height: u32) -> f32 {
  height as f32 / 2.0 / (zoom_degrees.to_radians() / 2.0).tan()
}

fn checkerboard() -> image::DynamicImage {
  let image =
    image::RgbImage::from_fn(64, 64, |x, y| {
      if (x / 8 + y / 8) % 2 == 0 {
        image::Rgb([230, 230, 230])
      } else {
        image::Rgb([40, 90, 160])
      }
    });
  image::DynamicImage::ImageRgb8(image)
}

fn parse_ned(args: &[String]) -> Option<NedArgs> {
  if args.len() < 3 {
    return None
  }
  match (args[0].parse::<f32>(), args[1].parse(), args[2].parse()) {
    (Ok(fov), Ok(screen_w), Ok(screen_h)) =>
      Some(NedArgs { ocular_fov: fov.to_radians(), screen_w: screen_w, screen_h: screen_h }),
    _ => {
      warn!("Ignoring malformed NED arguments {:?}", args);
      None
    },
  }
}

fn run() -> gl_util::Result<()> {
  let args: Vec<String> = env::args().skip(1).collect();
  let shader_dir = args.get(0).cloned().unwrap_or_else(|| String::from("shaders"));
  let texture_path = args.get(1).cloned();
  let ned = if args.len() > 2 { parse_ned(&args[2..]) } else { None };

  let camera_projection = Projection::centered(focal_length_for_zoom(camera::ZOOM, HEIGHT), WIDTH as f32, HEIGHT as f32, 0.1, 100.0);
  let ned_projection =
    match ned {
      None => None,
      Some(ref ned) => Some(camera_projection.adapt_to_ned(ned.ocular_fov, ned.screen_w, ned.screen_h, 0, 0)?),
    };

  let (window_w, window_h) =
    match ned_projection {
      None => (WIDTH, HEIGHT),
      Some(ref p) => (p.size().0 as u32, p.size().1 as u32),
    };

  let mut window =
    Window::new(&WindowConfig {
      width: window_w,
      height: window_h,
      title: String::from("gl_util demo"),
      relative_mouse: true,
      .. WindowConfig::default()
    })?;
  window.enable_depth_test(gl::LEQUAL);
  window.set_background_color(25, 25, 30, 255);

  let shader = Shader::from_prefix(&shader_dir, "textured")?;
  let unit = TextureUnit::new(0)?;
  let texture =
    match texture_path {
      Some(path) => Texture2D::load(path, unit, TextureParams::default())?,
      None => Texture2D::from_image(&checkerboard(), unit, TextureParams::default()),
    };

  let mut quad = VertexBuffers::new();
  quad.bind(&QUAD_VERTICES, &VertexLayout::new(&[3, 2]), Some(&QUAD_INDICES[..]), Usage::Static)?;

  let mut camera = Camera::new(Point3::new(0.0, 0.0, 3.0), cgmath::Vector3::new(0.0, 1.0, 0.0), camera::YAW, camera::PITCH);
  let mut projection = ned_projection.unwrap_or(camera_projection);

  let mut last_frame = Instant::now();
  let mut last_report = Instant::now();

  while !window.should_close() {
    let now = Instant::now();
    let delta_time = now.duration_since(last_frame).as_secs_f32();
    last_frame = now;

    {
      let keys = window.keyboard_state();
      for &(key, movement) in MOVEMENT_KEYS.iter() {
        if keys.is_scancode_pressed(key) {
          camera.process_keyboard(movement, delta_time);
        }
      }
    }

    let motion = window.mouse_motion();
    camera.process_mouse_movement(motion.x as f32, -motion.y as f32, true);
    if window.scroll() != 0 {
      camera.process_mouse_scroll(window.scroll() as f32);
      if ned_projection.is_none() {
        projection.set_focal_length(focal_length_for_zoom(camera.fov(), HEIGHT));
      }
    }

    window.clear();

    shader.use_program();
    shader.set_mat4("projection_matrix", projection.matrix());
    shader.set_mat4("view_matrix", &camera.view_matrix());
    shader.set_int("texture_in", texture.unit().index() as i32);
    texture.bind();
    quad.draw(gl::TRIANGLES)?;

    if now.duration_since(last_report).as_secs() >= 1 {
      last_report = now;
      let (w, h) = window.size();
      let z_buf = window.read_depth(w as i32 / 2, h as i32 / 2);
      if z_buf < 1.0 {
        info!("Depth at center: {} (buffer {})", projection.depth_buffer_to_camera_depth(z_buf), z_buf);
      } else {
        info!("Nothing at center");
      }
    }

    window.refresh();
  }

  quad.unbind_vertex_array();

  // GL objects must go while the context is still current.
  drop(quad);
  drop(texture);
  drop(shader);
  window.deactivate()?;
  Ok(())
}

fn main() {
  env_logger::init();

  if let Err(e) = run() {
    error!("{}", e);
    process::exit(1);
  }
}
