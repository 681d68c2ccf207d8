/// Fixed triangle, in pixel coordinates.
#[rustfmt::skip]
pub const TRIANGLE: [f32; 6] = [
    0.0, 0.0,
    0.0, 240.0,
    320.0, 0.0,
];

pub mod context;
pub mod geometry;
pub mod native;
pub mod program;
pub mod recording;
pub mod renderer;
