use std::rc::Rc;

use thiserror::Error;

use crate::context::{AttribLayout, AttribLocation, BufferId, BufferUsage, GlContext, VertexArrayId};

pub struct GeometryBuilder<'a> {
    attributes: Vec<(AttribLocation, VertexAttribute)>,
    data: &'a [f32],
    usage: BufferUsage,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        Self {
            data,
            attributes: Vec::new(),
            usage: BufferUsage::StaticDraw,
        }
    }

    pub fn with_attribute(mut self, location: AttribLocation, attr: VertexAttribute) -> Self {
        self.attributes.push((location, attr));
        self
    }

    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn build<C: GlContext>(self, ctx: &Rc<C>) -> Result<Geometry<C>, GeometryError> {
        let total_len: usize = self.attributes.iter().map(|(_, a)| a.size()).sum();

        if total_len == 0 {
            return Err(GeometryError::NoAttributes);
        }

        if self.data.len() % total_len != 0 {
            return Err(GeometryError::InvalidDataLength);
        }

        let vao = ctx.create_vertex_array().ok_or(GeometryError::Creation)?;
        let vbo = match ctx.create_buffer() {
            Some(vbo) => vbo,
            None => {
                ctx.delete_vertex_array(vao);
                return Err(GeometryError::Creation);
            }
        };

        ctx.bind_vertex_array(Some(vao));
        ctx.bind_array_buffer(Some(vbo));
        ctx.buffer_data_f32(self.data, self.usage);

        // A single attribute is tightly packed, so the stride stays 0.
        let stride = if self.attributes.len() == 1 {
            0
        } else {
            (total_len * std::mem::size_of::<f32>()) as i32
        };

        let mut offset = 0;

        for (location, attr) in &self.attributes {
            ctx.enable_vertex_attrib_array(*location);
            ctx.vertex_attrib_pointer_f32(
                *location,
                AttribLayout {
                    components: attr.size() as i32,
                    normalized: false,
                    stride,
                    offset: offset * std::mem::size_of::<f32>(),
                },
            );
            offset += attr.size();
        }

        let vertices = self.data.len() / total_len;

        Ok(Geometry {
            ctx: Rc::clone(ctx),
            vao,
            vbo,
            vertices,
            vertex_len: total_len,
            usage: self.usage,
        })
    }
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Invalid data length for given attributes")]
    InvalidDataLength,
    #[error("Geometry needs at least one attribute")]
    NoAttributes,
    #[error("Could not create vertex buffer objects")]
    Creation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttribute {
    Float,
    Vec2,
    Vec3,
}

impl VertexAttribute {
    pub fn size(&self) -> usize {
        match self {
            VertexAttribute::Float => 1,
            VertexAttribute::Vec2 => 2,
            VertexAttribute::Vec3 => 3,
        }
    }
}

/// Two triangles covering the rectangle, as a flat list of 2D points.
#[rustfmt::skip]
pub fn rectangle_vertices(x: f32, y: f32, width: f32, height: f32) -> [f32; 12] {
    let x1 = x;
    let x2 = x + width;
    let y1 = y;
    let y2 = y + height;

    [
        x1, y1,
        x2, y1,
        x1, y2,
        x1, y2,
        x2, y1,
        x2, y2,
    ]
}

/// A vertex array together with the single buffer feeding it.
pub struct Geometry<C: GlContext> {
    ctx: Rc<C>,
    vao: VertexArrayId,
    vbo: BufferId,
    vertices: usize,
    vertex_len: usize,
    usage: BufferUsage,
}

impl<C: GlContext> Geometry<C> {
    pub fn vao(&self) -> VertexArrayId {
        self.vao
    }

    pub fn vbo(&self) -> BufferId {
        self.vbo
    }

    pub fn vertices(&self) -> usize {
        self.vertices
    }

    /// Replaces the whole buffer contents. There is no partial update.
    pub fn write(&mut self, data: &[f32]) -> Result<(), GeometryError> {
        if data.len() % self.vertex_len != 0 {
            return Err(GeometryError::InvalidDataLength);
        }

        self.ctx.bind_array_buffer(Some(self.vbo));
        self.ctx.buffer_data_f32(data, self.usage);
        self.vertices = data.len() / self.vertex_len;

        Ok(())
    }

    /// Overwrites the buffer with the six corners of one rectangle.
    pub fn set_rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), GeometryError> {
        self.write(&rectangle_vertices(x, y, width, height))
    }
}

impl<C: GlContext> Drop for Geometry<C> {
    fn drop(&mut self) {
        self.ctx.delete_buffer(self.vbo);
        self.ctx.delete_vertex_array(self.vao);
    }
}
