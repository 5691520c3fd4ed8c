use std::path::Path;

/// Extension marking a precompiled SPIR-V module. Compared case-sensitively
/// against the extension as [`Path::extension`] reports it, without the dot.
pub const SPIRV_EXTENSION: &str = "spv";

/// Input shape for a single shader stage. Construction picks the loading
/// strategy by matching on the variant, so the choice is explicit rather
/// than hidden in constructor overloads.
#[derive(Clone, Copy, Debug)]
pub enum ShaderSource<'a> {
    /// GLSL source text read from disk.
    TextFile(&'a Path),
    /// SPIR-V module read from disk.
    BinaryFile(&'a Path),
    /// SPIR-V module already in memory; the buffer stays owned by the caller.
    BinaryBuffer(&'a [u8]),
}

impl<'a> ShaderSource<'a> {
    /// Classifies a path by extension: exactly `spv` means a SPIR-V module,
    /// anything else is treated as source text.
    pub fn from_path(path: &'a Path) -> ShaderSource<'a> {
        if path.extension().is_some_and(|ext| ext == SPIRV_EXTENSION) {
            ShaderSource::BinaryFile(path)
        } else {
            ShaderSource::TextFile(path)
        }
    }
}
