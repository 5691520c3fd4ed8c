/// Shader stage kinds supported by the program pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

/// Capability surface of the graphics driver consumed by shader loading.
/// The real context is [`crate::opengl::GlDriver`]; tests substitute a mock
/// with resource accounting.
pub trait ShaderDriver {
    type Stage: Copy;
    type Program: Copy;
    type Location;

    fn create_stage(&self, kind: StageKind) -> Option<Self::Stage>;
    fn compile_text(&self, stage: Self::Stage, source: &str);
    /// Submits a SPIR-V module and specializes it at entry point `main`
    /// with no specialization constants.
    fn compile_binary(&self, stage: Self::Stage, binary: &[u8]);
    fn stage_compile_status(&self, stage: Self::Stage) -> bool;
    fn stage_info_log(&self, stage: Self::Stage) -> String;
    fn delete_stage(&self, stage: Self::Stage);

    fn create_program(&self) -> Option<Self::Program>;
    fn attach_stage(&self, program: Self::Program, stage: Self::Stage);
    fn detach_stage(&self, program: Self::Program, stage: Self::Stage);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    fn use_program(&self, program: Self::Program);
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::Location>;
    fn set_uniform_i32(&self, location: &Self::Location, value: i32);
    fn set_uniform_f32(&self, location: &Self::Location, value: f32);
    fn set_uniform_vec3(&self, location: &Self::Location, x: f32, y: f32, z: f32);
}

/// Upper bound on captured diagnostic logs. Longer driver logs are clipped.
pub const INFO_LOG_CAPACITY: usize = 512;

pub(crate) fn clip_log(mut log: String) -> String {
    if log.len() > INFO_LOG_CAPACITY {
        let mut end = INFO_LOG_CAPACITY;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}
