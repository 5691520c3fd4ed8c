//! Loading, compilation, and linking of GPU shader programs, with a small
//! uniform-setting interface for the rendering loop. Stages come either as
//! GLSL source text or as precompiled SPIR-V modules; construction absorbs
//! every failure into a validity flag and keeps the driver diagnostics
//! queryable. Window and context management live elsewhere.

pub mod driver;
pub mod error;
pub mod opengl;
pub mod program;
pub mod source;
pub mod stage;
