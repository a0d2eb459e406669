use super::impl_keyed_traits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BlendFactor {
    Zero,
    #[default]
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

/// Blend equation. `Disabled` turns blending off for the output entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BlendOp {
    #[default]
    Disabled,
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Blend function of a single color output.
///
/// Factors are ignored while `op` is [`BlendOp::Disabled`], so all disabled
/// descriptors compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendStateDesc {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub op: BlendOp,
}

impl BlendStateDesc {
    /// Blending off.
    pub const DISABLED: Self = Self {
        src_rgb: BlendFactor::One,
        dst_rgb: BlendFactor::One,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::One,
        op: BlendOp::Disabled,
    };

    /// Conventional non-premultiplied alpha blending.
    pub const ALPHA: Self = Self {
        src_rgb: BlendFactor::SrcAlpha,
        dst_rgb: BlendFactor::OneMinusSrcAlpha,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::OneMinusSrcAlpha,
        op: BlendOp::Add,
    };

    pub const ADDITIVE: Self = Self {
        src_rgb: BlendFactor::One,
        dst_rgb: BlendFactor::One,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::One,
        op: BlendOp::Add,
    };

    #[inline]
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self.op, BlendOp::Disabled)
    }

    fn key(&self) -> (BlendOp, [BlendFactor; 4]) {
        if self.is_enabled() {
            (
                self.op,
                [self.src_rgb, self.dst_rgb, self.src_alpha, self.dst_alpha],
            )
        } else {
            (BlendOp::Disabled, [BlendFactor::One; 4])
        }
    }
}

impl_keyed_traits!(BlendStateDesc);
