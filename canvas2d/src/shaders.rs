//! Embedded GLSL sources.

/// Maps `a_position` from pixels to clip space using `u_resolution`.
pub const PIXEL_VERT: &str = include_str!("shaders/pixel.vert");

/// Fills with `u_color`.
pub const SOLID_FRAG: &str = include_str!("shaders/solid.frag");

pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const RESOLUTION_UNIFORM: &str = "u_resolution";
pub const COLOR_UNIFORM: &str = "u_color";

#[derive(Debug, Clone, Copy)]
pub struct ShaderSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl Default for ShaderSources<'static> {
    fn default() -> Self {
        Self {
            vertex: PIXEL_VERT,
            fragment: SOLID_FRAG,
        }
    }
}
