pub mod discover;
pub mod scan;

use crate::toolchain::Toolchain;

/// Pipeline stage of a shader, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
    /// HLSL compute shader, compiled with an explicit stage and entry point.
    SpecialCompute,
}

impl Stage {
    /// GLSL stages in the order their files are listed in a makefile.
    pub const NATIVE: [Stage; 6] = [
        Stage::Vertex,
        Stage::TessControl,
        Stage::TessEval,
        Stage::Geometry,
        Stage::Fragment,
        Stage::Compute,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            Stage::Vertex => "vert",
            Stage::TessControl => "tesc",
            Stage::TessEval => "tese",
            Stage::Geometry => "geom",
            Stage::Fragment => "frag",
            Stage::Compute => "comp",
            Stage::SpecialCompute => "hlsl",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Stage> {
        Self::NATIVE
            .into_iter()
            .chain([Stage::SpecialCompute])
            .find(|stage| stage.extension() == extension)
    }

    pub fn is_hlsl(self) -> bool {
        self == Stage::SpecialCompute
    }
}

/// A shader source file, named relative to the directory it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFile {
    name: String,
    stage: Stage,
    artifact: String,
}

impl ShaderFile {
    /// Classifies `name` by its extension. Returns `None` for files that are not shaders.
    pub fn new(name: impl Into<String>, toolchain: &Toolchain) -> Option<ShaderFile> {
        let name = name.into();
        let (stem, extension) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }

        let stage = Stage::from_extension(extension)?;

        // HLSL modules replace the source extension instead of stacking on top of it
        let artifact = if stage.is_hlsl() {
            format!("{stem}.{}", toolchain.artifact_extension)
        } else {
            format!("{name}.{}", toolchain.artifact_extension)
        };

        Some(ShaderFile {
            name,
            stage,
            artifact,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// File name of the compiled module.
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// File name without its shader extension.
    pub fn base_name(&self) -> &str {
        let extension = self.stage.extension();
        &self.name[..self.name.len() - extension.len() - 1]
    }

    /// Flags telling the compiler which stage and entry point to use.
    ///
    /// GLSL stages are implied by the file extension, so only HLSL files get any.
    pub fn stage_flags(&self, toolchain: &Toolchain) -> Vec<String> {
        match self.stage {
            Stage::SpecialCompute => vec![
                format!("-fshader-stage={}", toolchain.hlsl_stage),
                format!("-fentry-point={}", self.base_name()),
            ],
            _ => Vec::new(),
        }
    }
}
