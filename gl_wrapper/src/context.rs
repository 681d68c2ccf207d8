//! The graphics context boundary.
//!
//! Everything the wrapper types need from a GL implementation goes through
//! [`GlContext`]. All methods take `&self`; implementations that keep state
//! do so behind interior mutability, the same way the GL driver does.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
}

/// Layout of one float vertex attribute inside the bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribLayout {
    pub components: i32,
    pub normalized: bool,
    /// Byte stride, 0 for tightly packed.
    pub stride: i32,
    /// Byte offset of the first component.
    pub offset: usize,
}

pub trait GlContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId>;
    fn shader_source(&self, shader: ShaderId, source: &str);
    fn compile_shader(&self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&self, shader: ShaderId);

    fn create_program(&self) -> Option<ProgramId>;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    fn link_program(&self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn uniform_2f(&self, location: UniformLocation, x: f32, y: f32);
    fn uniform_4f(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32);

    fn create_buffer(&self) -> Option<BufferId>;
    fn bind_array_buffer(&self, buffer: Option<BufferId>);
    /// Replaces the whole store of the bound array buffer.
    fn buffer_data_f32(&self, data: &[f32], usage: BufferUsage);
    fn delete_buffer(&self, buffer: BufferId);

    fn create_vertex_array(&self) -> Option<VertexArrayId>;
    fn bind_vertex_array(&self, vao: Option<VertexArrayId>);
    fn delete_vertex_array(&self, vao: VertexArrayId);
    fn enable_vertex_attrib_array(&self, location: AttribLocation);
    fn vertex_attrib_pointer_f32(&self, location: AttribLocation, layout: AttribLayout);

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear_color_buffer(&self);
    fn draw_triangles(&self, first: i32, count: i32);
}
