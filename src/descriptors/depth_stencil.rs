use super::CompareFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Stencil behaviour for one triangle facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StencilFaceOps {
    pub fail: StencilOp,
    pub pass: StencilOp,
    /// Stencil passed but the depth test failed.
    pub depth_fail: StencilOp,
    pub compare: CompareFunction,
    pub reference: u8,
    pub read_mask: u8,
}

impl Default for StencilFaceOps {
    fn default() -> Self {
        Self {
            fail: StencilOp::Keep,
            pass: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            compare: CompareFunction::Always,
            reference: 0xFF,
            read_mask: 0xFF,
        }
    }
}

/// Depth and stencil test configuration. Contains no floating-point fields, so
/// equality, ordering and hashing are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepthStencilStateDesc {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareFunction,
    pub stencil_test: bool,
    pub stencil_write_mask: u8,
    pub front: StencilFaceOps,
    pub back: StencilFaceOps,
}

impl Default for DepthStencilStateDesc {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            stencil_test: false,
            stencil_write_mask: 0xFF,
            front: StencilFaceOps::default(),
            back: StencilFaceOps::default(),
        }
    }
}

impl DepthStencilStateDesc {
    /// No depth or stencil testing at all, e.g. for full-screen passes.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_depth(mut self, test: bool, write: bool, compare: CompareFunction) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self.depth_compare = compare;
        self
    }

    /// Enables stencil testing with the same ops on both faces.
    #[must_use]
    pub fn with_stencil(mut self, ops: StencilFaceOps, write_mask: u8) -> Self {
        self.stencil_test = true;
        self.stencil_write_mask = write_mask;
        self.front = ops;
        self.back = ops;
        self
    }
}
