use crate::driver::{clip_log, ShaderDriver, StageKind};
use crate::error::ShaderError;
use crate::source::ShaderSource;
use crate::stage::CompiledStage;
use nalgebra_glm as glm;
use std::path::Path;

/// Linked GPU shader program. Either fully valid (both stages compiled and
/// linked) or invalid; there is no usable in-between state. Construction
/// never fails loudly: all errors collapse into [`ShaderProgram::is_valid`],
/// with the captured driver diagnostics kept for inspection.
///
/// Single-owner and move-only; dropping it releases the driver-side program
/// object exactly once, whether or not linking succeeded.
pub struct ShaderProgram<'d, D: ShaderDriver> {
    driver: &'d D,
    handle: Option<D::Program>,
    valid: bool,
    diagnostic: Option<String>,
}

impl<'d, D: ShaderDriver> ShaderProgram<'d, D> {
    /// Builds a program from two shader files, picking the text or SPIR-V
    /// loading strategy per file by extension.
    pub fn from_paths(
        driver: &'d D,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> ShaderProgram<'d, D> {
        Self::from_sources(
            driver,
            ShaderSource::from_path(vertex_path),
            ShaderSource::from_path(fragment_path),
        )
    }

    /// Builds a program from two in-memory SPIR-V modules, for shaders
    /// embedded in the binary rather than shipped as files.
    pub fn from_binaries(driver: &'d D, vertex: &[u8], fragment: &[u8]) -> ShaderProgram<'d, D> {
        Self::from_sources(
            driver,
            ShaderSource::BinaryBuffer(vertex),
            ShaderSource::BinaryBuffer(fragment),
        )
    }

    pub fn from_sources(
        driver: &'d D,
        vertex: ShaderSource,
        fragment: ShaderSource,
    ) -> ShaderProgram<'d, D> {
        let mut program = ShaderProgram {
            driver,
            handle: None,
            valid: false,
            diagnostic: None,
        };

        // Stages load independently; either failure skips linking entirely.
        // Compiled stages are dropped on every path out of this scope.
        let vertex = CompiledStage::load(driver, vertex, StageKind::Vertex);
        let fragment = CompiledStage::load(driver, fragment, StageKind::Fragment);

        match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => program.link(&vertex, &fragment),
            (vertex, fragment) => {
                for error in [vertex.err(), fragment.err()].into_iter().flatten() {
                    program.record_failure(&error);
                }
            }
        }

        program
    }

    fn link(&mut self, vertex: &CompiledStage<'d, D>, fragment: &CompiledStage<'d, D>) {
        let Some(handle) = self.driver.create_program() else {
            self.record_failure(&ShaderError::Link(
                "driver refused to create a program".to_string(),
            ));
            return;
        };
        self.handle = Some(handle);

        self.driver.attach_stage(handle, vertex.handle());
        self.driver.attach_stage(handle, fragment.handle());
        self.driver.link_program(handle);
        let linked = self.driver.program_link_status(handle);
        self.driver.detach_stage(handle, vertex.handle());
        self.driver.detach_stage(handle, fragment.handle());

        if linked {
            self.valid = true;
        } else {
            // The dead handle stays around until Drop, which releases it the
            // same way it releases a healthy one.
            let log = clip_log(self.driver.program_info_log(handle));
            self.record_failure(&ShaderError::Link(log));
        }
    }

    fn record_failure(&mut self, error: &ShaderError) {
        log::error!("{error}");
        let text = error.to_string();
        match &mut self.diagnostic {
            Some(diagnostic) => {
                diagnostic.push('\n');
                diagnostic.push_str(&text);
            }
            None => self.diagnostic = Some(text),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn handle(&self) -> Option<D::Program> {
        self.handle
    }

    /// Driver diagnostics captured during a failed construction, clipped to
    /// [`crate::driver::INFO_LOG_CAPACITY`] bytes per entry.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Makes this program the active one for subsequent draw calls. The
    /// active-program slot is global to the context; the rendering loop owns
    /// the sequencing, this object does not track whether it is bound.
    pub fn use_program(&self) {
        if let Some(handle) = self.handle {
            self.driver.use_program(handle);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_int(name, value as i32);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        if let Some(location) = self.location(name) {
            self.driver.set_uniform_i32(&location, value);
        }
    }

    pub fn set_float(&self, name: &str, value: f32) {
        if let Some(location) = self.location(name) {
            self.driver.set_uniform_f32(&location, value);
        }
    }

    pub fn set_vec3(&self, name: &str, x: f32, y: f32, z: f32) {
        if let Some(location) = self.location(name) {
            self.driver.set_uniform_vec3(&location, x, y, z);
        }
    }

    pub fn set_vec3v(&self, name: &str, value: &glm::Vec3) {
        self.set_vec3(name, value.x, value.y, value.z);
    }

    // A name the driver does not know yields no location and the set is
    // skipped without surfacing an error.
    fn location(&self, name: &str) -> Option<D::Location> {
        let handle = self.handle?;
        let location = self.driver.uniform_location(handle, name);
        if location.is_none() {
            log::warn!("uniform '{name}' not found in shader program");
        }
        location
    }
}

impl<'d, D: ShaderDriver> Drop for ShaderProgram<'d, D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.driver.delete_program(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockDriver, Submission};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    const VERTEX_SRC: &str = "#version 460 core\nvoid main() { gl_Position = vec4(0.0); }\n";
    const FRAGMENT_SRC: &str =
        "#version 460 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";
    const BROKEN_FRAGMENT_SRC: &str = "#version 460 core\nvoid main() { vec3 x = ; }\n";

    fn shader_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn text_program(driver: &MockDriver) -> ShaderProgram<'_, MockDriver> {
        let vertex = shader_file(".vert", VERTEX_SRC.as_bytes());
        let fragment = shader_file(".frag", FRAGMENT_SRC.as_bytes());
        ShaderProgram::from_paths(driver, vertex.path(), fragment.path())
    }

    #[test]
    fn valid_text_pair_links() {
        let driver = MockDriver::new();
        let program = text_program(&driver);
        assert!(program.is_valid());
        assert!(program.handle().is_some());
        assert!(program.diagnostic().is_none());
        // Both stages are gone by the time the constructor returns.
        assert!(driver.live_stages.borrow().is_empty());
    }

    #[test]
    fn programs_get_distinct_handles() {
        let driver = MockDriver::new();
        let first = text_program(&driver);
        let second = text_program(&driver);
        assert_ne!(first.handle(), second.handle());
    }

    #[test]
    fn broken_fragment_invalidates_without_leaks() {
        let driver = MockDriver::new();
        let vertex = shader_file(".vert", VERTEX_SRC.as_bytes());
        let fragment = shader_file(".frag", BROKEN_FRAGMENT_SRC.as_bytes());

        let program = ShaderProgram::from_paths(&driver, vertex.path(), fragment.path());
        assert!(!program.is_valid());
        assert!(program.handle().is_none());
        assert!(program.diagnostic().unwrap().contains("syntax error"));
        // Compile failed before linking, so nothing driver-side survives.
        assert!(driver.no_live_objects());
    }

    #[test]
    fn missing_files_invalidate_without_panicking() {
        let driver = MockDriver::new();
        let program = ShaderProgram::from_paths(
            &driver,
            Path::new("/nonexistent/a.vert"),
            Path::new("/nonexistent/b.frag"),
        );
        assert!(!program.is_valid());
        assert!(program.diagnostic().unwrap().contains("could not be read"));
        assert!(driver.no_live_objects());
    }

    #[test]
    fn link_failure_keeps_the_handle_until_drop() {
        let driver = MockDriver::new();
        driver.fail_link.set(true);

        let spirv = MockDriver::spirv_bytes();
        let program = ShaderProgram::from_binaries(&driver, &spirv, &spirv);
        assert!(!program.is_valid());
        assert!(program.diagnostic().unwrap().contains("mismatch"));
        // Stages are released once linking has been attempted; the dead
        // program handle is not.
        assert!(driver.live_stages.borrow().is_empty());
        assert_eq!(driver.live_programs.borrow().len(), 1);

        drop(program);
        assert!(driver.live_programs.borrow().is_empty());
        assert_eq!(driver.program_deletions.get(), 1);
    }

    #[test]
    fn binary_file_and_buffer_construction_agree() {
        let driver = MockDriver::new();
        driver.define_uniform("time", 3);

        let spirv = MockDriver::spirv_bytes();
        let vertex = shader_file(".spv", &spirv);
        let fragment = shader_file(".spv", &spirv);

        let from_files = ShaderProgram::from_paths(&driver, vertex.path(), fragment.path());
        let from_buffers = ShaderProgram::from_binaries(&driver, &spirv, &spirv);
        assert!(from_files.is_valid());
        assert!(from_buffers.is_valid());

        from_files.set_float("time", 0.5);
        from_buffers.set_float("time", 0.5);
        let submissions = driver.submissions.borrow();
        assert_eq!(submissions[0], (3, Submission::Float(0.5)));
        assert_eq!(submissions[1], (3, Submission::Float(0.5)));
    }

    #[test]
    fn spv_extension_is_routed_to_the_binary_loader() {
        let driver = MockDriver::new();
        // Text in a .spv file must be rejected by the binary path, proving
        // the extension actually selects the strategy.
        let vertex = shader_file(".spv", VERTEX_SRC.as_bytes());
        let fragment = shader_file(".frag", FRAGMENT_SRC.as_bytes());

        let program = ShaderProgram::from_paths(&driver, vertex.path(), fragment.path());
        assert!(!program.is_valid());
        assert!(program.diagnostic().unwrap().contains("SPIR-V"));
    }

    #[test]
    fn setters_on_an_invalid_program_submit_nothing() {
        let driver = MockDriver::new();
        driver.define_uniform("time", 3);
        let program = ShaderProgram::from_paths(
            &driver,
            Path::new("/nonexistent/a.vert"),
            Path::new("/nonexistent/b.frag"),
        );

        program.use_program();
        program.set_bool("flag", true);
        program.set_int("count", 7);
        program.set_float("time", 1.5);
        program.set_vec3("tint", 1.0, 0.0, 0.0);

        assert_eq!(driver.active.get(), None);
        assert!(driver.submissions.borrow().is_empty());
    }

    #[test]
    fn unknown_uniform_name_is_a_silent_noop() {
        let driver = MockDriver::new();
        let program = text_program(&driver);
        program.set_float("no_such_uniform", 1.0);
        assert!(driver.submissions.borrow().is_empty());
    }

    #[test]
    fn activation_and_float_uniform_reach_the_driver() {
        let driver = MockDriver::new();
        driver.define_uniform("time", 7);

        let spirv = MockDriver::spirv_bytes();
        let program = ShaderProgram::from_binaries(&driver, &spirv, &spirv);
        assert!(program.is_valid());

        program.use_program();
        assert_eq!(driver.active.get(), program.handle());

        program.set_float("time", 1.5);
        assert_eq!(*driver.submissions.borrow(), [(7, Submission::Float(1.5))]);
    }

    #[test]
    fn scalar_and_vector_setters_submit_expected_values() {
        let driver = MockDriver::new();
        driver.define_uniform("flag", 1);
        driver.define_uniform("count", 2);
        driver.define_uniform("tint", 4);

        let program = text_program(&driver);
        program.set_bool("flag", true);
        program.set_int("count", 42);
        program.set_vec3("tint", 0.1, 0.2, 0.3);
        program.set_vec3v("tint", &glm::vec3(1.0, 2.0, 3.0));

        assert_eq!(
            *driver.submissions.borrow(),
            [
                (1, Submission::Int(1)),
                (2, Submission::Int(42)),
                (4, Submission::Vec3(0.1, 0.2, 0.3)),
                (4, Submission::Vec3(1.0, 2.0, 3.0)),
            ]
        );
    }

    #[test]
    fn moving_a_program_releases_the_handle_once() {
        let driver = MockDriver::new();
        let program = text_program(&driver);
        assert_eq!(driver.program_deletions.get(), 0);

        let moved = Box::new(program);
        drop(moved);
        // The mock panics on a second delete of the same handle.
        assert_eq!(driver.program_deletions.get(), 1);
    }
}
