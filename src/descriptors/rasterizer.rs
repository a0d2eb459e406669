use bitflags::bitflags;

use super::{canonical_bits, impl_keyed_traits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FrontFace {
    #[default]
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FillMode {
    Point,
    Line,
    #[default]
    Fill,
}

bitflags! {
    /// On/off rasterizer features.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct RasterizerFlags: u8 {
        const DEPTH_CLAMP  = 1 << 0;
        const SCISSOR      = 1 << 1;
        const MULTISAMPLE  = 1 << 2;
        const LINE_SMOOTH  = 1 << 3;
    }
}

impl Default for RasterizerFlags {
    fn default() -> Self {
        Self::DEPTH_CLAMP
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RasterizerStateDesc {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub fill_mode: FillMode,
    pub flags: RasterizerFlags,
    pub constant_depth_bias: i32,
    pub slope_scaled_depth_bias: f32,
}

impl Default for RasterizerStateDesc {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
            fill_mode: FillMode::Fill,
            flags: RasterizerFlags::default(),
            constant_depth_bias: 0,
            slope_scaled_depth_bias: 0.0,
        }
    }
}

impl RasterizerStateDesc {
    #[must_use]
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    #[must_use]
    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: RasterizerFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Depth bias for shadow casters.
    #[must_use]
    pub fn with_depth_bias(mut self, constant: i32, slope_scaled: f32) -> Self {
        self.constant_depth_bias = constant;
        self.slope_scaled_depth_bias = slope_scaled;
        self
    }

    fn key(&self) -> (CullMode, FrontFace, FillMode, RasterizerFlags, i32, u32) {
        (
            self.cull_mode,
            self.front_face,
            self.fill_mode,
            self.flags,
            self.constant_depth_bias,
            canonical_bits(self.slope_scaled_depth_bias),
        )
    }
}

impl_keyed_traits!(RasterizerStateDesc);
