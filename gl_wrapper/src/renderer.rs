use std::rc::Rc;

use crate::context::{GlContext, ProgramId, UniformLocation};
use crate::geometry::Geometry;
use crate::program::Program;

pub struct GlRenderer<C: GlContext> {
    ctx: Rc<C>,
    current_program: Option<ProgramId>,
}

impl<C: GlContext> GlRenderer<C> {
    pub fn new(ctx: &Rc<C>) -> Self {
        Self {
            ctx: Rc::clone(ctx),
            current_program: None,
        }
    }

    pub fn use_program(&mut self, program: &Program<C>) {
        let p_id = program.get_id();
        if self.current_program != Some(p_id) {
            self.ctx.use_program(Some(p_id));
            self.current_program = Some(p_id);
        }
    }

    /// Draws every vertex currently held by `geometry` as triangles.
    pub fn draw(&mut self, geometry: &Geometry<C>, program: &Program<C>) {
        self.use_program(program);

        self.ctx.bind_vertex_array(Some(geometry.vao()));
        self.ctx.draw_triangles(0, geometry.vertices() as i32);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.ctx.viewport(0, 0, width as i32, height as i32);
    }

    pub fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.ctx.clear_color(r, g, b, a);
        self.ctx.clear_color_buffer();
    }

    pub fn set_vec2(&self, location: UniformLocation, value: [f32; 2]) {
        self.ctx.uniform_2f(location, value[0], value[1]);
    }

    pub fn set_vec4(&self, location: UniformLocation, value: [f32; 4]) {
        self.ctx.uniform_4f(location, value[0], value[1], value[2], value[3]);
    }
}
