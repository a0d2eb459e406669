//! Binding-State Configuration
//!
//! [`BindingStateConfig`] says how many binding slots of each kind the
//! renderer wants. The manager clamps every request to what the device
//! reports, so a config written for a large desktop GPU still starts on a
//! smaller one, with a warning.
//!
//! ```rust
//! use bindery::BindingStateConfig;
//!
//! let config = BindingStateConfig::default()
//!     .with_texture_units(24)
//!     .with_common_vertex_formats(false);
//! assert_eq!(config.max_texture_units, 24);
//! ```

use serde::{Deserialize, Serialize};

use crate::descriptors::SlotKind;
use crate::device::DeviceLimits;
use crate::slots::MAX_SLOT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingStateConfig {
    /// Texture binding slots wanted.
    pub max_texture_units: u32,
    /// Uniform-buffer binding slots wanted.
    pub max_uniform_buffers: u32,
    /// Storage-buffer binding slots wanted.
    pub max_storage_buffers: u32,
    /// Capacity hint for the resource id table.
    pub expected_resources: usize,
    /// Register position, 2D position and position/normal/uv vertex formats
    /// at startup.
    pub register_common_vertex_formats: bool,
}

impl Default for BindingStateConfig {
    fn default() -> Self {
        Self {
            max_texture_units: 16,
            max_uniform_buffers: 32,
            max_storage_buffers: 8,
            expected_resources: 64,
            register_common_vertex_formats: true,
        }
    }
}

impl BindingStateConfig {
    #[must_use]
    pub fn with_texture_units(mut self, count: u32) -> Self {
        self.max_texture_units = count;
        self
    }

    #[must_use]
    pub fn with_uniform_buffers(mut self, count: u32) -> Self {
        self.max_uniform_buffers = count;
        self
    }

    #[must_use]
    pub fn with_storage_buffers(mut self, count: u32) -> Self {
        self.max_storage_buffers = count;
        self
    }

    #[must_use]
    pub fn with_common_vertex_formats(mut self, enabled: bool) -> Self {
        self.register_common_vertex_formats = enabled;
        self
    }

    #[must_use]
    pub const fn wanted(&self, kind: SlotKind) -> u32 {
        match kind {
            SlotKind::UniformBuffer => self.max_uniform_buffers,
            SlotKind::StorageBuffer => self.max_storage_buffers,
            SlotKind::Texture => self.max_texture_units,
        }
    }

    /// Slot capacity actually used for `kind` on a device with `limits`.
    #[must_use]
    pub fn resolve_capacity(&self, kind: SlotKind, limits: &DeviceLimits) -> u32 {
        let wanted = self.wanted(kind);
        let device_max = limits.for_kind(kind).min(MAX_SLOT_CAPACITY);
        if wanted > device_max {
            log::warn!(
                "Wanted {wanted} {kind} bindings but the device supports {device_max}; clamping"
            );
        }
        let chosen = wanted.min(device_max);
        log::info!("{kind} bindings: wanted {wanted}, device max {device_max}, chosen {chosen}");
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BindingStateConfig::default();
        assert_eq!(config.wanted(SlotKind::Texture), 16);
        assert_eq!(config.wanted(SlotKind::UniformBuffer), 32);
        assert_eq!(config.wanted(SlotKind::StorageBuffer), 8);
        assert!(config.register_common_vertex_formats);
    }

    #[test]
    fn test_capacity_is_clamped_to_device() {
        let limits = DeviceLimits {
            max_texture_units: 8,
            ..DeviceLimits::default()
        };
        let config = BindingStateConfig::default();
        assert_eq!(config.resolve_capacity(SlotKind::Texture, &limits), 8);
        assert_eq!(config.resolve_capacity(SlotKind::StorageBuffer, &limits), 8);
    }
}
