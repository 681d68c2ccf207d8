use std::ffi::{c_char, c_void, CString};

use gl::types::{GLint, GLsizei, GLuint};

use crate::context::*;

/// [`GlContext`] backed by the `gl` crate's global function pointers.
///
/// Only one of these should exist per current GL context. It must not be used
/// after that context stops being current on the calling thread.
pub struct NativeGl {
    _private: (),
}

impl NativeGl {
    /// Loads the GL function pointers through `loader` and returns a handle
    /// to the now current context.
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        Self { _private: () }
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn non_zero(id: GLuint) -> Option<GLuint> {
    if id == 0 {
        None
    } else {
        Some(id)
    }
}

fn log_to_string(mut buf: Vec<u8>, written: GLsizei) -> String {
    buf.truncate(written.max(0) as usize);

    let data = match buf.iter().position(|a| *a == 0) {
        Some(end) => &buf[..end],
        None => &buf[..],
    };

    String::from_utf8_lossy(data).trim_end().to_string()
}

impl GlContext for NativeGl {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        let id = unsafe { gl::CreateShader(stage_enum(stage)) };
        non_zero(id).map(ShaderId)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        let ptr = source.as_ptr() as *const c_char;
        let len = source.len() as GLint;

        unsafe {
            gl::ShaderSource(shader.0, 1, &ptr as *const *const c_char, &len as *const GLint);
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        unsafe { gl::CompileShader(shader.0) }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        let mut success: GLint = 0;
        unsafe { gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, &mut success as *mut GLint) };
        success == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let mut len: GLint = 0;
        let mut written: GLsizei = 0;

        unsafe {
            gl::GetShaderiv(shader.0, gl::INFO_LOG_LENGTH, &mut len as *mut GLint);
            let mut buf = vec![0_u8; len.max(1) as usize];

            gl::GetShaderInfoLog(
                shader.0,
                buf.len() as GLsizei,
                &mut written as *mut GLsizei,
                buf.as_mut_ptr() as *mut c_char,
            );

            log_to_string(buf, written)
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader.0) }
    }

    fn create_program(&self) -> Option<ProgramId> {
        let id = unsafe { gl::CreateProgram() };
        non_zero(id).map(ProgramId)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program.0, shader.0) }
    }

    fn link_program(&self, program: ProgramId) {
        unsafe { gl::LinkProgram(program.0) }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        let mut success: GLint = 0;
        unsafe { gl::GetProgramiv(program.0, gl::LINK_STATUS, &mut success as *mut GLint) };
        success == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let mut len: GLint = 0;
        let mut written: GLsizei = 0;

        unsafe {
            gl::GetProgramiv(program.0, gl::INFO_LOG_LENGTH, &mut len as *mut GLint);
            let mut buf = vec![0_u8; len.max(1) as usize];

            gl::GetProgramInfoLog(
                program.0,
                buf.len() as GLsizei,
                &mut written as *mut GLsizei,
                buf.as_mut_ptr() as *mut c_char,
            );

            log_to_string(buf, written)
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program.0) }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { gl::UseProgram(program.map_or(0, |p| p.0)) }
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetAttribLocation(program.0, name.as_ptr()) };

        if location < 0 {
            None
        } else {
            Some(AttribLocation(location as u32))
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program.0, name.as_ptr()) };

        if location < 0 {
            None
        } else {
            Some(UniformLocation(location))
        }
    }

    fn uniform_2f(&self, location: UniformLocation, x: f32, y: f32) {
        unsafe { gl::Uniform2f(location.0, x, y) }
    }

    fn uniform_4f(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        unsafe { gl::Uniform4f(location.0, x, y, z, w) }
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, (&mut id) as *mut u32) };
        non_zero(id).map(BufferId)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, buffer.map_or(0, |b| b.0)) }
    }

    fn buffer_data_f32(&self, data: &[f32], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::StaticDraw => gl::STATIC_DRAW,
            BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
        };

        unsafe {
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(data) as isize,
                data.as_ptr() as *const c_void,
                usage,
            );
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { gl::DeleteBuffers(1, (&buffer.0) as *const u32) }
    }

    fn create_vertex_array(&self) -> Option<VertexArrayId> {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, (&mut id) as *mut u32) };
        non_zero(id).map(VertexArrayId)
    }

    fn bind_vertex_array(&self, vao: Option<VertexArrayId>) {
        unsafe { gl::BindVertexArray(vao.map_or(0, |v| v.0)) }
    }

    fn delete_vertex_array(&self, vao: VertexArrayId) {
        unsafe { gl::DeleteVertexArrays(1, (&vao.0) as *const u32) }
    }

    fn enable_vertex_attrib_array(&self, location: AttribLocation) {
        unsafe { gl::EnableVertexAttribArray(location.0) }
    }

    fn vertex_attrib_pointer_f32(&self, location: AttribLocation, layout: AttribLayout) {
        unsafe {
            gl::VertexAttribPointer(
                location.0,
                layout.components,
                gl::FLOAT,
                if layout.normalized { gl::TRUE } else { gl::FALSE },
                layout.stride,
                layout.offset as *const c_void,
            );
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { gl::Viewport(x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear_color_buffer(&self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT) }
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { gl::DrawArrays(gl::TRIANGLES, first, count) }
    }
}
