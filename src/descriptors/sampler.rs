use super::{CompareFunction, canonical_bits, impl_keyed_traits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MagFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    #[default]
    NearestMipmapLinear,
    LinearMipmapLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AddressMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CompareMode {
    #[default]
    None,
    /// Depth-comparison sampling for shadow maps.
    CompareRefToTexture,
}

/// Sampler object configuration.
///
/// Samplers have a total order, so their cache uses ordered lookup.
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub border_color: [f32; 4],
    pub compare_mode: CompareMode,
    pub compare_func: CompareFunction,
    pub mip_lod_bias: f32,
    pub max_anisotropy: f32,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: MagFilter::Linear,
            min_filter: MinFilter::NearestMipmapLinear,
            address_u: AddressMode::Repeat,
            address_v: AddressMode::Repeat,
            address_w: AddressMode::Repeat,
            border_color: [0.0; 4],
            compare_mode: CompareMode::None,
            compare_func: CompareFunction::LessEqual,
            mip_lod_bias: 0.0,
            max_anisotropy: 0.0,
            min_lod: -1000.0,
            max_lod: 1000.0,
        }
    }
}

impl SamplerDesc {
    /// Same address mode on all three axes.
    #[must_use]
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_u = mode;
        self.address_v = mode;
        self.address_w = mode;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, mag: MagFilter, min: MinFilter) -> Self {
        self.mag_filter = mag;
        self.min_filter = min;
        self
    }

    /// Shadow-map sampler comparing against `func`.
    #[must_use]
    pub fn with_comparison(mut self, func: CompareFunction) -> Self {
        self.compare_mode = CompareMode::CompareRefToTexture;
        self.compare_func = func;
        self
    }

    #[must_use]
    pub fn with_anisotropy(mut self, max_anisotropy: f32) -> Self {
        self.max_anisotropy = max_anisotropy;
        self
    }

    #[must_use]
    pub fn with_border_color(mut self, color: [f32; 4]) -> Self {
        self.border_color = color;
        self
    }

    #[allow(clippy::type_complexity)]
    fn key(
        &self,
    ) -> (
        (MagFilter, MinFilter),
        (AddressMode, AddressMode, AddressMode),
        [u32; 4],
        (CompareMode, CompareFunction),
        [u32; 4],
    ) {
        (
            (self.mag_filter, self.min_filter),
            (self.address_u, self.address_v, self.address_w),
            self.border_color.map(canonical_bits),
            (self.compare_mode, self.compare_func),
            [
                canonical_bits(self.mip_lod_bias),
                canonical_bits(self.max_anisotropy),
                canonical_bits(self.min_lod),
                canonical_bits(self.max_lod),
            ],
        )
    }
}

impl_keyed_traits!(SamplerDesc);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_separately_built_equal_samplers_compare_equal() {
        let a = SamplerDesc::default().with_address_mode(AddressMode::ClampToEdge);
        let b = SamplerDesc {
            address_u: AddressMode::ClampToEdge,
            address_v: AddressMode::ClampToEdge,
            address_w: AddressMode::ClampToEdge,
            ..SamplerDesc::default()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_field_difference() {
        let a = SamplerDesc::default();
        let b = SamplerDesc::default().with_filters(MagFilter::Nearest, a.min_filter);
        assert_ne!(a, b);
    }

    #[test]
    fn test_negative_zero_bias_matches_zero() {
        let a = SamplerDesc::default();
        let b = SamplerDesc {
            mip_lod_bias: -0.0,
            ..SamplerDesc::default()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_total_order_dedups_in_ordered_set() {
        let mut set = BTreeSet::new();
        set.insert(SamplerDesc::default());
        set.insert(SamplerDesc::default().with_anisotropy(16.0));
        set.insert(SamplerDesc::default());
        assert_eq!(set.len(), 2);
    }
}
