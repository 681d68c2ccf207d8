use std::rc::Rc;

use thiserror::Error;

use crate::context::{AttribLocation, GlContext, ProgramId, ShaderId, ShaderStage, UniformLocation};

/// A successfully compiled shader object. Deleted on drop.
pub struct Shader<C: GlContext> {
    ctx: Rc<C>,
    id: ShaderId,
    stage: ShaderStage,
}

impl<C: GlContext> Drop for Shader<C> {
    fn drop(&mut self) {
        self.ctx.delete_shader(self.id);
    }
}

/// Compiles `source` as a `stage` shader.
///
/// On failure the compiler log is written to the error log, the shader object
/// is released and the log is returned in the error.
pub fn compile<C: GlContext>(
    ctx: &Rc<C>,
    source: &str,
    stage: ShaderStage,
) -> Result<Shader<C>, ProgramError> {
    let id = ctx
        .create_shader(stage)
        .ok_or(ProgramError::Creation("shader"))?;

    ctx.shader_source(id, source);
    ctx.compile_shader(id);

    if !ctx.shader_compile_status(id) {
        let log = ctx.shader_info_log(id);
        log::error!("{} shader failed to compile: {}", stage.name(), log);
        ctx.delete_shader(id);

        return Err(ProgramError::Compilation { stage, log });
    }

    log::debug!("compiled {} shader {:?}", stage.name(), id);

    Ok(Shader {
        ctx: Rc::clone(ctx),
        id,
        stage,
    })
}

/// Links a vertex and a fragment shader into a program.
///
/// The shaders can be dropped right after; the program keeps what it needs.
pub fn link<C: GlContext>(
    ctx: &Rc<C>,
    vertex: &Shader<C>,
    fragment: &Shader<C>,
) -> Result<Program<C>, ProgramError> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(ProgramError::StageMismatch);
    }

    let id = ctx
        .create_program()
        .ok_or(ProgramError::Creation("program"))?;

    ctx.attach_shader(id, vertex.id);
    ctx.attach_shader(id, fragment.id);
    ctx.link_program(id);

    if !ctx.program_link_status(id) {
        let log = ctx.program_info_log(id);
        log::error!("program failed to link: {}", log);
        ctx.delete_program(id);

        return Err(ProgramError::Linking(log));
    }

    log::debug!("linked program {:?}", id);

    Ok(Program {
        ctx: Rc::clone(ctx),
        id,
    })
}

pub struct ProgramBuilder<'a> {
    vert: &'a str,
    frag: &'a str,
}

impl<'a> ProgramBuilder<'a> {
    pub fn new(vert_src: &'a str, frag_src: &'a str) -> Self {
        Self {
            vert: vert_src,
            frag: frag_src,
        }
    }

    pub fn build<C: GlContext>(self, ctx: &Rc<C>) -> Result<Program<C>, ProgramError> {
        let vert = compile(ctx, self.vert, ShaderStage::Vertex)?;
        let frag = compile(ctx, self.frag, ShaderStage::Fragment)?;

        link(ctx, &vert, &frag)
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("could not create {0} object")]
    Creation(&'static str),
    #[error("{} shader compilation failed: {log}", .stage.name())]
    Compilation { stage: ShaderStage, log: String },
    #[error("program linking failed: {0}")]
    Linking(String),
    #[error("expected one vertex and one fragment shader")]
    StageMismatch,
    #[error("attribute `{0}` is not an active program input")]
    MissingAttribute(String),
    #[error("uniform `{0}` is not an active program uniform")]
    MissingUniform(String),
}

pub struct Program<C: GlContext> {
    ctx: Rc<C>,
    id: ProgramId,
}

impl<C: GlContext> Program<C> {
    pub fn get_id(&self) -> ProgramId {
        self.id
    }

    pub fn attrib_location(&self, name: &str) -> Result<AttribLocation, ProgramError> {
        self.ctx
            .attrib_location(self.id, name)
            .ok_or_else(|| ProgramError::MissingAttribute(name.to_string()))
    }

    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation, ProgramError> {
        self.ctx
            .uniform_location(self.id, name)
            .ok_or_else(|| ProgramError::MissingUniform(name.to_string()))
    }
}

impl<C: GlContext> Drop for Program<C> {
    fn drop(&mut self) {
        self.ctx.delete_program(self.id);
    }
}
