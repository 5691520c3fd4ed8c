use crate::driver::{ShaderDriver, StageKind};
use gl::types::*;
use std::ffi::CString;
use std::ptr;

/// [`ShaderDriver`] backed by the real OpenGL context. The windowing layer is
/// responsible for making a 4.6 context current and loading the function
/// pointers before any method here is called.
#[derive(Default)]
pub struct GlDriver;

const SPIRV_ENTRY_POINT: &[u8] = b"main\0";

fn gl_stage_kind(kind: StageKind) -> GLenum {
    match kind {
        StageKind::Vertex => gl::VERTEX_SHADER,
        StageKind::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn whitespace_cstring(len: usize) -> CString {
    let mut buffer: Vec<u8> = Vec::with_capacity(len + 1);
    buffer.extend([b' '].iter().cycle().take(len));
    unsafe { CString::from_vec_unchecked(buffer) }
}

impl ShaderDriver for GlDriver {
    type Stage = GLuint;
    type Program = GLuint;
    type Location = GLint;

    fn create_stage(&self, kind: StageKind) -> Option<GLuint> {
        let stage = unsafe { gl::CreateShader(gl_stage_kind(kind)) };
        (stage != 0).then_some(stage)
    }

    fn compile_text(&self, stage: GLuint, source: &str) {
        // Pointer-with-length form, so interior NUL bytes cannot trip us up.
        let source_ptr = source.as_ptr() as *const GLchar;
        let source_len = source.len() as GLint;
        unsafe {
            gl::ShaderSource(stage, 1, &source_ptr, &source_len);
            gl::CompileShader(stage);
        }
    }

    fn compile_binary(&self, stage: GLuint, binary: &[u8]) {
        unsafe {
            gl::ShaderBinary(
                1,
                &stage,
                gl::SHADER_BINARY_FORMAT_SPIR_V,
                binary.as_ptr() as *const std::os::raw::c_void,
                binary.len() as GLsizei,
            );
            gl::SpecializeShader(
                stage,
                SPIRV_ENTRY_POINT.as_ptr() as *const GLchar,
                0,
                ptr::null(),
                ptr::null(),
            );
        }
    }

    fn stage_compile_status(&self, stage: GLuint) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetShaderiv(stage, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn stage_info_log(&self, stage: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(stage, gl::INFO_LOG_LENGTH, &mut len);
        }
        if len <= 0 {
            return String::new();
        }

        let log = whitespace_cstring(len as usize);
        unsafe {
            gl::GetShaderInfoLog(stage, len, ptr::null_mut(), log.as_ptr() as *mut GLchar);
        }
        log.to_string_lossy().into_owned()
    }

    fn delete_stage(&self, stage: GLuint) {
        unsafe {
            gl::DeleteShader(stage);
        }
    }

    fn create_program(&self) -> Option<GLuint> {
        let program = unsafe { gl::CreateProgram() };
        (program != 0).then_some(program)
    }

    fn attach_stage(&self, program: GLuint, stage: GLuint) {
        unsafe {
            gl::AttachShader(program, stage);
        }
    }

    fn detach_stage(&self, program: GLuint, stage: GLuint) {
        unsafe {
            gl::DetachShader(program, stage);
        }
    }

    fn link_program(&self, program: GLuint) {
        unsafe {
            gl::LinkProgram(program);
        }
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        }
        success != 0
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        }
        if len <= 0 {
            return String::new();
        }

        let log = whitespace_cstring(len as usize);
        unsafe {
            gl::GetProgramInfoLog(program, len, ptr::null_mut(), log.as_ptr() as *mut GLchar);
        }
        log.to_string_lossy().into_owned()
    }

    fn delete_program(&self, program: GLuint) {
        unsafe {
            gl::DeleteProgram(program);
        }
    }

    fn use_program(&self, program: GLuint) {
        unsafe {
            gl::UseProgram(program);
        }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> Option<GLint> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        (location != -1).then_some(location)
    }

    fn set_uniform_i32(&self, location: &GLint, value: i32) {
        unsafe {
            gl::Uniform1i(*location, value);
        }
    }

    fn set_uniform_f32(&self, location: &GLint, value: f32) {
        unsafe {
            gl::Uniform1f(*location, value);
        }
    }

    fn set_uniform_vec3(&self, location: &GLint, x: f32, y: f32, z: f32) {
        unsafe {
            gl::Uniform3f(*location, x, y, z);
        }
    }
}
