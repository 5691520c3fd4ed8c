use crate::driver::{clip_log, ShaderDriver, StageKind};
use crate::error::ShaderError;
use crate::source::ShaderSource;
use std::fs;

/// Compiled but not yet linked shader stage. Lives only inside program
/// construction; dropping it releases the driver-side shader object.
pub struct CompiledStage<'d, D: ShaderDriver> {
    driver: &'d D,
    handle: D::Stage,
}

impl<'d, D: ShaderDriver> CompiledStage<'d, D> {
    /// Single entry point for all three loading strategies.
    pub fn load(
        driver: &'d D,
        source: ShaderSource,
        kind: StageKind,
    ) -> Result<CompiledStage<'d, D>, ShaderError> {
        match source {
            ShaderSource::TextFile(path) => {
                let text = fs::read_to_string(path)?;
                Self::compile(driver, kind, |stage| driver.compile_text(stage, &text))
            }
            ShaderSource::BinaryFile(path) => {
                let bytes = fs::read(path)?;
                Self::compile(driver, kind, |stage| driver.compile_binary(stage, &bytes))
            }
            ShaderSource::BinaryBuffer(bytes) => {
                Self::compile(driver, kind, |stage| driver.compile_binary(stage, bytes))
            }
        }
    }

    fn compile<F: FnOnce(D::Stage)>(
        driver: &'d D,
        kind: StageKind,
        submit: F,
    ) -> Result<CompiledStage<'d, D>, ShaderError> {
        let handle = driver
            .create_stage(kind)
            .ok_or_else(|| ShaderError::Compile("driver refused to create a stage".to_string()))?;
        submit(handle);

        if driver.stage_compile_status(handle) {
            Ok(CompiledStage { driver, handle })
        } else {
            let log = clip_log(driver.stage_info_log(handle));
            driver.delete_stage(handle);
            Err(ShaderError::Compile(log))
        }
    }

    pub fn handle(&self) -> D::Stage {
        self.handle
    }
}

impl<'d, D: ShaderDriver> Drop for CompiledStage<'d, D> {
    fn drop(&mut self) {
        self.driver.delete_stage(self.handle);
    }
}
