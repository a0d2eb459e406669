//! Shader Programs
//!
//! A program is identified by the shader objects linked into it. The cache key
//! packs the six per-stage 16-bit resource indices into three words, two
//! stages per word, with absent stages stored as 0.

use std::fmt;

use bindery_core::{ObjectKind, ResourceId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 6] = [
        Self::Vertex,
        Self::TessControl,
        Self::TessEval,
        Self::Geometry,
        Self::Fragment,
        Self::Compute,
    ];

    /// The resource kind a shader object for this stage is registered as.
    #[must_use]
    pub const fn object_kind(self) -> ObjectKind {
        match self {
            Self::Vertex => ObjectKind::VertexShader,
            Self::TessControl => ObjectKind::TessControlShader,
            Self::TessEval => ObjectKind::TessEvalShader,
            Self::Geometry => ObjectKind::GeometryShader,
            Self::Fragment => ObjectKind::FragmentShader,
            Self::Compute => ObjectKind::ComputeShader,
        }
    }

    /// (word, shift) of this stage inside a [`ProgramKey`].
    const fn key_position(self) -> (usize, u32) {
        match self {
            Self::Vertex => (0, 16),
            Self::Fragment => (0, 0),
            Self::TessControl => (1, 16),
            Self::TessEval => (1, 0),
            Self::Geometry => (2, 16),
            Self::Compute => (2, 0),
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.object_kind(), f)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStageError {
    #[error("Program has no shader stages")]
    Empty,

    #[error("Compute shaders cannot be linked together with graphics stages")]
    MixedComputeAndGraphics,

    #[error("Graphics program is missing its {0} stage")]
    MissingStage(ShaderStage),

    #[error("Tessellation needs both control and evaluation stages")]
    IncompleteTessellation,

    #[error("Stage {stage} refers to a {found}, expected a {}", .stage.object_kind())]
    WrongObjectKind { stage: ShaderStage, found: ObjectKind },
}

/// Shader objects to link, one optional resource per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgramStages {
    pub vertex: Option<ResourceId>,
    pub tess_control: Option<ResourceId>,
    pub tess_eval: Option<ResourceId>,
    pub geometry: Option<ResourceId>,
    pub fragment: Option<ResourceId>,
    pub compute: Option<ResourceId>,
}

impl ProgramStages {
    #[must_use]
    pub fn graphics(vertex: ResourceId, fragment: ResourceId) -> Self {
        Self {
            vertex: Some(vertex),
            fragment: Some(fragment),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn compute(compute: ResourceId) -> Self {
        Self {
            compute: Some(compute),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: ResourceId) -> Self {
        self.geometry = Some(geometry);
        self
    }

    #[must_use]
    pub fn with_tessellation(mut self, control: ResourceId, eval: ResourceId) -> Self {
        self.tess_control = Some(control);
        self.tess_eval = Some(eval);
        self
    }

    #[must_use]
    pub const fn stage(&self, stage: ShaderStage) -> Option<ResourceId> {
        match stage {
            ShaderStage::Vertex => self.vertex,
            ShaderStage::TessControl => self.tess_control,
            ShaderStage::TessEval => self.tess_eval,
            ShaderStage::Geometry => self.geometry,
            ShaderStage::Fragment => self.fragment,
            ShaderStage::Compute => self.compute,
        }
    }

    /// Present stages in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, ResourceId)> + '_ {
        ShaderStage::ALL
            .into_iter()
            .filter_map(|stage| Some((stage, self.stage(stage)?)))
    }

    /// Checks the stage combination and returns the program kind it links to.
    pub fn program_kind(&self) -> Result<ObjectKind, ProgramStageError> {
        let graphics_stages = self
            .iter()
            .filter(|(stage, _)| *stage != ShaderStage::Compute)
            .count();

        match (self.compute.is_some(), graphics_stages) {
            (false, 0) => Err(ProgramStageError::Empty),
            (true, 0) => Ok(ObjectKind::ComputeProgram),
            (true, _) => Err(ProgramStageError::MixedComputeAndGraphics),
            (false, _) => {
                if self.vertex.is_none() {
                    return Err(ProgramStageError::MissingStage(ShaderStage::Vertex));
                }
                if self.fragment.is_none() {
                    return Err(ProgramStageError::MissingStage(ShaderStage::Fragment));
                }
                if self.tess_control.is_some() != self.tess_eval.is_some() {
                    return Err(ProgramStageError::IncompleteTessellation);
                }
                Ok(ObjectKind::GraphicsProgram)
            }
        }
    }

    #[must_use]
    pub fn key(&self) -> ProgramKey {
        let mut words = [0u32; 3];
        for (stage, id) in self.iter() {
            let (word, shift) = stage.key_position();
            words[word] |= u32::from(id.index()) << shift;
        }
        ProgramKey { words }
    }
}

/// Cache key of a linked program: `[vs << 16 | fs, tc << 16 | te, gs << 16 | cs]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramKey {
    words: [u32; 3],
}

impl ProgramKey {
    #[inline]
    #[must_use]
    pub const fn words(&self) -> [u32; 3] {
        self.words
    }

    /// Resource index stored for `stage`; 0 when absent.
    #[must_use]
    pub const fn stage_index(&self, stage: ShaderStage) -> u16 {
        let (word, shift) = stage.key_position();
        (self.words[word] >> shift) as u16
    }
}
