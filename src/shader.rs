//! GLSL program loading and uniform setters.

use cgmath::{Matrix, Matrix4, Vector3, Vector4};
use gl;
use gl::types::*;
use std;
use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::CString;
use std::path::Path;

use error::{Error, Result};

/// A linked vertex + fragment shader program.
pub struct Shader {
  id: GLuint,
  missing_uniforms: MissingUniforms,
}

/// Uniform names already reported as missing, so a render loop logs each once.
#[derive(Debug, Default)]
struct MissingUniforms {
  names: RefCell<HashSet<String>>,
}

impl MissingUniforms {
  /// True the first time `name` is seen.
  fn first_miss(&self, name: &str) -> bool {
    let mut names = self.names.borrow_mut();
    if names.contains(name) {
      return false
    }
    names.insert(name.to_owned());
    true
  }
}

/// Read a shader source file.
fn read_source(path: &Path) -> Result<String> {
  std::fs::read_to_string(path).map_err(|e| {
    error!("Cannot read shader source {}: {}", path.display(), e);
    Error::Io { path: path.to_owned(), source: e }
  })
}

/// Paths of the `<prefix>.vs.glsl` / `<prefix>.fs.glsl` pair inside `dir`.
pub fn prefix_paths(dir: &Path, prefix: &str) -> (std::path::PathBuf, std::path::PathBuf) {
  (
    dir.join(format!("{}.vs.glsl", prefix)),
    dir.join(format!("{}.fs.glsl", prefix)),
  )
}

/// Turn a driver info log buffer into a string, dropping the trailing NUL.
fn info_log_to_string(mut buf: Vec<u8>, written: GLsizei) -> String {
  buf.truncate(std::cmp::max(written, 0) as usize);
  while buf.last() == Some(&0) {
    buf.pop();
  }
  String::from_utf8_lossy(&buf).into_owned()
}

fn compile_stage(stage: &'static str, kind: GLenum, source: &str) -> Result<GLuint> {
  let source =
    CString::new(source.as_bytes())
    .map_err(|_| Error::ShaderCompile { stage: stage, log: String::from("source contains a NUL byte") })?;

  unsafe {
    let id = gl::CreateShader(kind);
    gl::ShaderSource(id, 1, &source.as_ptr(), std::ptr::null());
    gl::CompileShader(id);

    let mut success = gl::FALSE as GLint;
    gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut success);
    if success == gl::TRUE as GLint {
      return Ok(id)
    }

    let mut len = 0;
    gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len);
    let mut buf = vec![0u8; std::cmp::max(len, 1) as usize];
    let mut written = 0;
    gl::GetShaderInfoLog(id, buf.len() as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar);
    gl::DeleteShader(id);

    let log = info_log_to_string(buf, written);
    error!("Shader compilation error of type: {}\n\t{}", stage, log);
    Err(Error::ShaderCompile { stage: stage, log: log })
  }
}

impl Shader {
  /// Compile and link a program from two source files.
  pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(vs_path: P, fs_path: Q) -> Result<Shader> {
    let vs = read_source(vs_path.as_ref())?;
    let fs = read_source(fs_path.as_ref())?;
    Shader::from_sources(&vs, &fs)
  }

  /// Load `<prefix>.vs.glsl` and `<prefix>.fs.glsl` from `dir`.
  pub fn from_prefix<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Shader> {
    let (vs, fs) = prefix_paths(dir.as_ref(), prefix);
    Shader::from_files(vs, fs)
  }

  /// Compile and link a program from in-memory sources.
  pub fn from_sources(vertex_shader: &str, fragment_shader: &str) -> Result<Shader> {
    let vs = compile_stage("VERTEX", gl::VERTEX_SHADER, vertex_shader)?;
    let fs =
      match compile_stage("FRAGMENT", gl::FRAGMENT_SHADER, fragment_shader) {
        Ok(fs) => fs,
        Err(e) => {
          unsafe { gl::DeleteShader(vs) };
          return Err(e)
        },
      };

    unsafe {
      let id = gl::CreateProgram();
      gl::AttachShader(id, vs);
      gl::AttachShader(id, fs);
      gl::LinkProgram(id);

      // Linked into the program now.
      gl::DeleteShader(vs);
      gl::DeleteShader(fs);

      let mut success = gl::FALSE as GLint;
      gl::GetProgramiv(id, gl::LINK_STATUS, &mut success);
      if success != gl::TRUE as GLint {
        let mut len = 0;
        gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; std::cmp::max(len, 1) as usize];
        let mut written = 0;
        gl::GetProgramInfoLog(id, buf.len() as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar);
        gl::DeleteProgram(id);

        let log = info_log_to_string(buf, written);
        error!("Shader program linking error:\n\t{}", log);
        return Err(Error::ShaderLink { log: log })
      }

      debug!("Linked shader program {}.", id);
      Ok(Shader { id: id, missing_uniforms: MissingUniforms::default() })
    }
  }

  /// The GL program name.
  pub fn id(&self) -> GLuint {
    self.id
  }

  /// Make this the current program.
  pub fn use_program(&self) {
    unsafe {
      gl::UseProgram(self.id);
    }
  }

  /// Location of a uniform, or `None` if the program has no such active uniform.
  pub fn uniform_location(&self, name: &str) -> Option<GLint> {
    let c_name = match CString::new(name) {
      Ok(c_name) => c_name,
      Err(_) => {
        warn!("Uniform name {:?} contains a NUL byte", name);
        return None
      },
    };
    let loc = unsafe { gl::GetUniformLocation(self.id, c_name.as_ptr()) };
    if loc == -1 {
      // Compilers drop unused uniforms.
      if self.missing_uniforms.first_miss(name) {
        warn!("No active uniform {:?} in program {}", name, self.id);
      }
      None
    } else {
      Some(loc)
    }
  }

  fn with_uniform<F: FnOnce(GLint)>(&self, name: &str, f: F) {
    if let Some(loc) = self.uniform_location(name) {
      self.use_program();
      f(loc);
    }
  }

  #[allow(missing_docs)]
  pub fn set_bool(&self, name: &str, value: bool) {
    self.set_int(name, value as GLint);
  }

  #[allow(missing_docs)]
  pub fn set_int(&self, name: &str, value: GLint) {
    self.with_uniform(name, |loc| unsafe { gl::Uniform1i(loc, value) });
  }

  #[allow(missing_docs)]
  pub fn set_float(&self, name: &str, value: GLfloat) {
    self.with_uniform(name, |loc| unsafe { gl::Uniform1f(loc, value) });
  }

  #[allow(missing_docs)]
  pub fn set_float3(&self, name: &str, x: GLfloat, y: GLfloat, z: GLfloat) {
    self.with_uniform(name, |loc| unsafe { gl::Uniform3f(loc, x, y, z) });
  }

  #[allow(missing_docs)]
  pub fn set_float4(&self, name: &str, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat) {
    self.with_uniform(name, |loc| unsafe { gl::Uniform4f(loc, x, y, z, w) });
  }

  #[allow(missing_docs)]
  pub fn set_vec3(&self, name: &str, v: &Vector3<GLfloat>) {
    self.set_float3(name, v.x, v.y, v.z);
  }

  #[allow(missing_docs)]
  pub fn set_vec4(&self, name: &str, v: &Vector4<GLfloat>) {
    self.set_float4(name, v.x, v.y, v.z, v.w);
  }

  /// Upload a column-major matrix, e.g. `Projection::matrix`.
  pub fn set_mat4(&self, name: &str, m: &Matrix4<GLfloat>) {
    self.with_uniform(name, |loc| unsafe { gl::UniformMatrix4fv(loc, 1, gl::FALSE, m.as_ptr()) });
  }
}

impl Drop for Shader {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteProgram(self.id);
    }
  }
}

#[test]
fn missing_source_is_an_io_error() {
  let dir = std::env::temp_dir().join("gl_util_missing_shader_dir");
  match Shader::from_prefix(&dir, "nothing") {
    Err(Error::Io { path, .. }) => assert_eq!(path, dir.join("nothing.vs.glsl")),
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("loaded a shader from a missing file"),
  }
}

#[test]
fn prefix_names_both_stages() {
  let (vs, fs) = prefix_paths(Path::new("shaders"), "quad");
  assert_eq!(vs, Path::new("shaders/quad.vs.glsl"));
  assert_eq!(fs, Path::new("shaders/quad.fs.glsl"));
}

#[test]
fn info_log_drops_padding() {
  let log = info_log_to_string(b"0:1: error\0\0\0".to_vec(), 11);
  assert_eq!(log, "0:1: error");
  assert_eq!(info_log_to_string(vec![0], 0), "");
}

#[test]
fn missing_uniforms_are_reported_once() {
  let missing = MissingUniforms::default();
  assert!(missing.first_miss("view_matrix"));
  assert!(!missing.first_miss("view_matrix"));
  assert!(!missing.first_miss("view_matrix"));
  assert!(missing.first_miss("projection_matrix"));
}
