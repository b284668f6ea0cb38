//! Vertex array, vertex buffer and element buffer objects, kept together.

use gl;
use gl::types::*;
use std;
use std::mem;

use error::{Error, Result};

/// Most floats a single vertex attribute can hold (a vec4).
pub const MAX_ATTRIBUTE_COMPONENTS: u8 = 4;

/// How an interleaved `f32` vertex is split into attributes.
///
/// `VertexLayout::new(&[3, 2])` is a vec3 position at location 0 followed by
/// a vec2 texture coordinate at location 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
  components: Vec<u8>,
}

impl VertexLayout {
  #[allow(missing_docs)]
  pub fn new(components: &[u8]) -> VertexLayout {
    VertexLayout { components: components.to_vec() }
  }

  /// Floats per vertex.
  pub fn floats_per_vertex(&self) -> usize {
    self.components.iter().map(|&c| c as usize).sum()
  }

  /// Bytes per vertex.
  pub fn stride(&self) -> usize {
    self.floats_per_vertex() * mem::size_of::<GLfloat>()
  }

  /// Byte offset of each attribute within a vertex.
  pub fn offsets(&self) -> Vec<usize> {
    let mut offset = 0;
    self.components.iter().map(|&c| {
      let this = offset;
      offset += c as usize * mem::size_of::<GLfloat>();
      this
    }).collect()
  }

  #[allow(missing_docs)]
  pub fn components(&self) -> &[u8] {
    &self.components
  }

  /// Number of whole vertices in `vertices`, or an error if it doesn't divide evenly.
  pub fn vertex_count(&self, vertices: &[GLfloat]) -> Result<usize> {
    let per_vertex = self.floats_per_vertex();
    if per_vertex == 0 {
      return Err(Error::VertexLayout(String::from("layout has no components")))
    }
    if let Some((i, &c)) = self.components.iter().enumerate().find(|&(_, &c)| c == 0 || c > MAX_ATTRIBUTE_COMPONENTS) {
      return Err(Error::VertexLayout(
        format!("attribute {} has {} components, expected 1..={}", i, c, MAX_ATTRIBUTE_COMPONENTS)
      ))
    }
    if vertices.len() % per_vertex != 0 {
      return Err(Error::VertexLayout(
        format!("{} floats is not a multiple of {} floats per vertex", vertices.len(), per_vertex)
      ))
    }
    Ok(vertices.len() / per_vertex)
  }
}

/// Buffer usage hint passed to `glBufferData`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
  Static,
  Dynamic,
  Stream,
}

impl Usage {
  fn to_enum(&self) -> GLenum {
    match *self {
      Usage::Static  => gl::STATIC_DRAW,
      Usage::Dynamic => gl::DYNAMIC_DRAW,
      Usage::Stream  => gl::STREAM_DRAW,
    }
  }
}

/// Attribute locations left enabled by a previous layout of `previous` attributes.
fn stale_attributes(previous: usize, layout: &VertexLayout) -> std::ops::Range<usize> {
  let current = layout.components().len();
  current .. std::cmp::max(current, previous)
}

/// A VAO with its VBO and (optional) EBO.
pub struct VertexBuffers {
  vao: GLuint,
  vbo: GLuint,
  /// Generated on the first indexed bind.
  ebo: Option<GLuint>,
  vertex_count: usize,
  index_count: usize,
  /// Attribute arrays enabled by the last `bind`.
  enabled_attributes: usize,
  is_bound: bool,
}

impl VertexBuffers {
  /// Generate the VAO and VBO names.
  pub fn new() -> VertexBuffers {
    let mut vao = 0;
    let mut vbo = 0;
    unsafe {
      gl::GenVertexArrays(1, &mut vao);
      gl::GenBuffers(1, &mut vbo);
    }
    VertexBuffers {
      vao: vao,
      vbo: vbo,
      ebo: None,
      vertex_count: 0,
      index_count: 0,
      enabled_attributes: 0,
      is_bound: false,
    }
  }

  /// Upload `vertices` (and `indices`, if any) and describe them to GL
  /// according to `layout`. Attribute `i` gets `layout.components()[i]` floats.
  pub fn bind(
    &mut self,
    vertices: &[GLfloat],
    layout: &VertexLayout,
    indices: Option<&[GLuint]>,
    usage: Usage,
  ) -> Result<()> {
    let vertex_count = layout.vertex_count(vertices)?;

    unsafe {
      gl::BindVertexArray(self.vao);

      gl::BindBuffer(gl::ARRAY_BUFFER, self.vbo);
      gl::BufferData(
        gl::ARRAY_BUFFER,
        mem::size_of_val(vertices) as GLsizeiptr,
        vertices.as_ptr() as *const _,
        usage.to_enum(),
      );

      if let Some(indices) = indices {
        let ebo = match self.ebo {
          Some(ebo) => ebo,
          None => {
            let mut ebo = 0;
            gl::GenBuffers(1, &mut ebo);
            self.ebo = Some(ebo);
            ebo
          },
        };
        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
        gl::BufferData(
          gl::ELEMENT_ARRAY_BUFFER,
          mem::size_of_val(indices) as GLsizeiptr,
          indices.as_ptr() as *const _,
          gl::STATIC_DRAW,
        );
      }

      let stride = layout.stride() as GLsizei;
      for (i, (&size, offset)) in layout.components().iter().zip(layout.offsets()).enumerate() {
        gl::VertexAttribPointer(
          i as GLuint,
          size as GLint,
          gl::FLOAT,
          gl::FALSE,
          stride,
          offset as *const GLvoid,
        );
        gl::EnableVertexAttribArray(i as GLuint);
      }
      for i in stale_attributes(self.enabled_attributes, layout) {
        gl::DisableVertexAttribArray(i as GLuint);
      }
    }

    self.enabled_attributes = layout.components().len();
    self.vertex_count = vertex_count;
    self.index_count = indices.map_or(0, |i| i.len());
    self.is_bound = true;
    Ok(())
  }

  /// Bind the VAO for drawing.
  pub fn bind_vertex_array(&self) -> Result<()> {
    if !self.is_bound {
      error!("No valid vertices are bound to VAO {}.", self.vao);
      return Err(Error::NotBound)
    }
    unsafe {
      gl::BindVertexArray(self.vao);
    }
    Ok(())
  }

  #[allow(missing_docs)]
  pub fn unbind_vertex_array(&self) {
    unsafe {
      gl::BindVertexArray(0);
    }
  }

  /// Bind and issue a draw call: indexed if indices were uploaded.
  pub fn draw(&self, mode: GLenum) -> Result<()> {
    self.bind_vertex_array()?;
    unsafe {
      if self.ebo.is_some() && self.index_count > 0 {
        gl::DrawElements(mode, self.index_count as GLsizei, gl::UNSIGNED_INT, std::ptr::null());
      } else {
        gl::DrawArrays(mode, 0, self.vertex_count as GLsizei);
      }
    }
    Ok(())
  }

  #[allow(missing_docs)]
  pub fn vertex_count(&self) -> usize {
    self.vertex_count
  }

  #[allow(missing_docs)]
  pub fn index_count(&self) -> usize {
    self.index_count
  }
}

impl Drop for VertexBuffers {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteVertexArrays(1, &self.vao);
      gl::DeleteBuffers(1, &self.vbo);
      if let Some(ebo) = self.ebo {
        gl::DeleteBuffers(1, &ebo);
      }
    }
  }
}

#[test]
fn position_uv_layout() {
  let layout = VertexLayout::new(&[3, 2]);
  assert_eq!(layout.floats_per_vertex(), 5);
  assert_eq!(layout.stride(), 5 * 4);
  assert_eq!(layout.offsets(), vec![0, 12]);
}

#[test]
fn position_color_normal_layout() {
  let layout = VertexLayout::new(&[3, 4, 3]);
  assert_eq!(layout.stride(), 40);
  assert_eq!(layout.offsets(), vec![0, 12, 28]);
}

#[test]
fn vertex_count_checks_layout() {
  let layout = VertexLayout::new(&[3, 2]);
  assert_eq!(layout.vertex_count(&[0.0; 20]).unwrap(), 4);
  match layout.vertex_count(&[0.0; 7]) {
    Err(Error::VertexLayout(_)) => {},
    r => panic!("expected a layout error, got {:?}", r),
  }
  match VertexLayout::new(&[]).vertex_count(&[0.0; 3]) {
    Err(Error::VertexLayout(_)) => {},
    r => panic!("expected a layout error, got {:?}", r),
  }
}

#[test]
fn vertex_count_rejects_bad_component_sizes() {
  for components in &[&[0u8, 3][..], &[5][..], &[3, 2, 8][..]] {
    match VertexLayout::new(components).vertex_count(&[0.0; 40]) {
      Err(Error::VertexLayout(ref msg)) => assert!(msg.contains("1..=4"), "{}", msg),
      r => panic!("expected a layout error for {:?}, got {:?}", components, r),
    }
  }
  assert_eq!(VertexLayout::new(&[1, 4]).vertex_count(&[0.0; 10]).unwrap(), 2);
}

#[test]
fn rebinding_fewer_attributes_disables_the_rest() {
  assert_eq!(stale_attributes(3, &VertexLayout::new(&[3])), 1 .. 3);
  assert_eq!(stale_attributes(2, &VertexLayout::new(&[3, 2])).len(), 0);
  assert_eq!(stale_attributes(0, &VertexLayout::new(&[3, 2, 3])).len(), 0);
}
