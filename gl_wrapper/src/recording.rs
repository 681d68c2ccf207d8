//! A headless [`GlContext`] that records every call.
//!
//! Shader objects go through a small front-end check (version directive,
//! balanced brackets, a `main` function) and programs check that stage inputs
//! match stage outputs, so compile and link failures can be exercised without
//! a driver. Attribute and uniform locations are assigned in declaration
//! order.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::context::*;

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderStage, ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    Uniform2f(UniformLocation, [f32; 2]),
    Uniform4f(UniformLocation, [f32; 4]),
    CreateBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    BufferData {
        buffer: Option<BufferId>,
        len: usize,
        usage: BufferUsage,
    },
    DeleteBuffer(BufferId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    EnableVertexAttribArray(AttribLocation),
    VertexAttribPointer(AttribLocation, AttribLayout),
    Viewport([i32; 4]),
    ClearColor([f32; 4]),
    Clear,
    DrawTriangles { first: i32, count: i32 },
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: bool,
    log: String,
    attribs: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    calls: Vec<GlCall>,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    buffers: HashMap<BufferId, Vec<f32>>,
    vertex_arrays: HashSet<VertexArrayId>,
    bound_buffer: Option<BufferId>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct RecordingContext {
    state: RefCell<State>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    /// Drains the recorded calls, keeping object state intact.
    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<f32>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// Strips a trailing `//` comment and surrounding whitespace.
fn code_of(line: &str) -> &str {
    match line.find("//") {
        Some(i) => line[..i].trim(),
        None => line.trim(),
    }
}

/// Names declared with `qualifier`, e.g. `in vec2 a_position;`.
fn declarations(source: &str, qualifier: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut tokens = code_of(line).split_whitespace();
            if tokens.next()? != qualifier {
                return None;
            }
            let _ty = tokens.next()?;
            let name = tokens.next()?.trim_end_matches(';');
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

fn check_source(source: &str) -> Result<(), String> {
    let first = source.lines().map(code_of).find(|l| !l.is_empty());
    match first {
        Some(line) if line.starts_with("#version") => {}
        _ => return Err("ERROR: 0:1: '' : missing #version directive".to_string()),
    }

    let mut open: Vec<(char, usize)> = Vec::new();
    let mut last_line = 1;

    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        last_line = line_no;

        for ch in code_of(line).chars() {
            match ch {
                '{' | '(' => open.push((ch, line_no)),
                '}' | ')' => {
                    let expected = if ch == '}' { '{' } else { '(' };
                    match open.pop() {
                        Some((o, _)) if o == expected => {}
                        _ => return Err(format!("ERROR: 0:{line_no}: '{ch}' : syntax error")),
                    }
                }
                _ => {}
            }
        }
    }

    if let Some((ch, line_no)) = open.pop() {
        return Err(format!(
            "ERROR: 0:{line_no}: '{ch}' : syntax error: unexpected end of file"
        ));
    }

    if !source.lines().any(|l| code_of(l).starts_with("void main")) {
        return Err(format!("ERROR: 0:{last_line}: '' : missing main function"));
    }

    Ok(())
}

impl GlContext for RecordingContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        let mut state = self.state.borrow_mut();
        let id = ShaderId(state.next_id());

        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(GlCall::CreateShader(stage, id));

        Some(id)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        if let Some(obj) = self.state.borrow_mut().shaders.get_mut(&shader) {
            obj.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::CompileShader(shader));

        if let Some(obj) = state.shaders.get_mut(&shader) {
            match check_source(&obj.source) {
                Ok(()) => {
                    obj.compiled = true;
                    obj.log.clear();
                }
                Err(log) => {
                    obj.compiled = false;
                    obj.log = log;
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        state.shaders.remove(&shader);
        state.calls.push(GlCall::DeleteShader(shader));
    }

    fn create_program(&self) -> Option<ProgramId> {
        let mut state = self.state.borrow_mut();
        let id = ProgramId(state.next_id());

        state.programs.insert(id, ProgramObject::default());
        state.calls.push(GlCall::CreateProgram(id));

        Some(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(obj) = state.programs.get_mut(&program) {
            obj.attached.push(shader);
        }
        state.calls.push(GlCall::AttachShader(program, shader));
    }

    fn link_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::LinkProgram(program));

        let attached = match state.programs.get(&program) {
            Some(obj) => obj.attached.clone(),
            None => return,
        };

        let find = |stage: ShaderStage| {
            attached
                .iter()
                .filter_map(|id| state.shaders.get(id))
                .find(|s| s.stage == stage && s.compiled)
                .map(|s| s.source.clone())
        };

        let result = match (find(ShaderStage::Vertex), find(ShaderStage::Fragment)) {
            (Some(vert), Some(frag)) => {
                let outputs = declarations(&vert, "out");
                let unmatched = declarations(&frag, "in")
                    .into_iter()
                    .find(|input| !outputs.contains(input));

                match unmatched {
                    Some(name) => Err(format!(
                        "ERROR: Linking failed: fragment input '{name}' has no matching vertex output"
                    )),
                    None => {
                        let mut uniforms = declarations(&vert, "uniform");
                        for name in declarations(&frag, "uniform") {
                            if !uniforms.contains(&name) {
                                uniforms.push(name);
                            }
                        }
                        Ok((declarations(&vert, "in"), uniforms))
                    }
                }
            }
            (None, _) => {
                Err("ERROR: Linking failed: missing compiled vertex shader".to_string())
            }
            (_, None) => {
                Err("ERROR: Linking failed: missing compiled fragment shader".to_string())
            }
        };

        if let Some(obj) = state.programs.get_mut(&program) {
            match result {
                Ok((attribs, uniforms)) => {
                    obj.linked = true;
                    obj.log.clear();
                    obj.attribs = attribs;
                    obj.uniforms = uniforms;
                }
                Err(log) => {
                    obj.linked = false;
                    obj.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |p| p.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.calls.push(GlCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.record(GlCall::UseProgram(program));
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let state = self.state.borrow();
        let obj = state.programs.get(&program).filter(|p| p.linked)?;

        obj.attribs
            .iter()
            .position(|a| a == name)
            .map(|i| AttribLocation(i as u32))
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let obj = state.programs.get(&program).filter(|p| p.linked)?;

        obj.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as i32))
    }

    fn uniform_2f(&self, location: UniformLocation, x: f32, y: f32) {
        self.record(GlCall::Uniform2f(location, [x, y]));
    }

    fn uniform_4f(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        self.record(GlCall::Uniform4f(location, [x, y, z, w]));
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let mut state = self.state.borrow_mut();
        let id = BufferId(state.next_id());

        state.buffers.insert(id, Vec::new());
        state.calls.push(GlCall::CreateBuffer(id));

        Some(id)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        let mut state = self.state.borrow_mut();
        state.bound_buffer = buffer;
        state.calls.push(GlCall::BindArrayBuffer(buffer));
    }

    fn buffer_data_f32(&self, data: &[f32], usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound_buffer;

        if let Some(store) = buffer.and_then(|b| state.buffers.get_mut(&b)) {
            *store = data.to_vec();
        }

        state.calls.push(GlCall::BufferData {
            buffer,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        if state.bound_buffer == Some(buffer) {
            state.bound_buffer = None;
        }
        state.calls.push(GlCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Option<VertexArrayId> {
        let mut state = self.state.borrow_mut();
        let id = VertexArrayId(state.next_id());

        state.vertex_arrays.insert(id);
        state.calls.push(GlCall::CreateVertexArray(id));

        Some(id)
    }

    fn bind_vertex_array(&self, vao: Option<VertexArrayId>) {
        self.record(GlCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: VertexArrayId) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vao);
        state.calls.push(GlCall::DeleteVertexArray(vao));
    }

    fn enable_vertex_attrib_array(&self, location: AttribLocation) {
        self.record(GlCall::EnableVertexAttribArray(location));
    }

    fn vertex_attrib_pointer_f32(&self, location: AttribLocation, layout: AttribLayout) {
        self.record(GlCall::VertexAttribPointer(location, layout));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport([x, y, width, height]));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear_color_buffer(&self) {
        self.record(GlCall::Clear);
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.record(GlCall::DrawTriangles { first, count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_skip_comments_and_precision() {
        let src = "#version 300 es\n// in vec2 commented;\nprecision highp float;\nin vec2 a_position; // trailing\nuniform vec4 u_color;\n";

        assert_eq!(declarations(src, "in"), vec!["a_position".to_string()]);
        assert_eq!(declarations(src, "uniform"), vec!["u_color".to_string()]);
    }

    #[test]
    fn unbalanced_brace_reports_line() {
        let src = "#version 300 es\nvoid main() {\n  gl_Position = vec4(0.0);\n";
        let err = check_source(src).unwrap_err();

        assert!(err.contains("0:2"), "{err}");
    }

    #[test]
    fn missing_version_is_rejected() {
        assert!(check_source("void main() {}").is_err());
    }
}
