//! Vertex Formats
//!
//! A [`VertexFormatDesc`] is the attribute layout of a vertex-array object.
//! Each attribute is compressed into one `u64` so the whole format is a
//! fixed-size array compared with plain integer equality:
//!
//! ```text
//! bits  0..3   component count (1..=4, 0 = attribute unused)
//! bits  3..5   component type
//! bit   5      normalized
//! bit   6      integer in shader
//! bits  7..11  vertex buffer binding
//! bits 16..32  relative offset
//! bits 32..64  instance divisor
//! ```

use bindery_core::BitField;
use thiserror::Error;

pub const MAX_VERTEX_ATTRIBUTES: usize = 8;
pub const MAX_VERTEX_BUFFER_BINDINGS: u8 = 16;

type ComponentsField = BitField<0, 3>;
type ComponentTypeField = BitField<3, 2>;
type NormalizedField = BitField<5, 1>;
type IntegerField = BitField<6, 1>;
type BufferBindingField = BitField<7, 4>;
type RelativeOffsetField = BitField<16, 16>;
type DivisorField = BitField<32, 32>;

const _: () = {
    assert!(ComponentsField::END <= ComponentTypeField::SHIFT);
    assert!(ComponentTypeField::END <= NormalizedField::SHIFT);
    assert!(IntegerField::END <= BufferBindingField::SHIFT);
    assert!(BufferBindingField::END <= RelativeOffsetField::SHIFT);
    assert!(RelativeOffsetField::END <= DivisorField::SHIFT);
    assert!(BufferBindingField::MAX + 1 == MAX_VERTEX_BUFFER_BINDINGS as u64);
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ComponentType {
    #[default]
    F32,
    U8,
    U16,
    U32,
}

impl ComponentType {
    const ALL: [ComponentType; 4] = [Self::F32, Self::U8, Self::U16, Self::U32];

    #[must_use]
    pub const fn size(self) -> u32 {
        match self {
            Self::F32 | Self::U32 => 4,
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormatError {
    #[error("{count} attributes exceed the limit of {MAX_VERTEX_ATTRIBUTES}")]
    TooManyAttributes { count: usize },

    #[error("Attribute {location} has {count} components; expected 1..=4")]
    ComponentCount { location: usize, count: u8 },

    #[error("Attribute {location} uses buffer binding {binding}; expected < {MAX_VERTEX_BUFFER_BINDINGS}")]
    BufferBinding { location: usize, binding: u8 },
}

/// One vertex attribute, in uncompressed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub components: u8,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Fetched as an integer rather than converted to float.
    pub integer: bool,
    pub buffer_binding: u8,
    pub relative_offset: u16,
    /// 0 advances per vertex, `n` advances every `n` instances.
    pub instance_divisor: u32,
}

impl VertexAttribute {
    /// `components` floats at `relative_offset` in buffer binding 0.
    #[must_use]
    pub const fn float(components: u8, relative_offset: u16) -> Self {
        Self {
            components,
            component_type: ComponentType::F32,
            normalized: false,
            integer: false,
            buffer_binding: 0,
            relative_offset,
            instance_divisor: 0,
        }
    }

    #[must_use]
    pub const fn with_type(mut self, component_type: ComponentType, normalized: bool) -> Self {
        self.component_type = component_type;
        self.normalized = normalized;
        self
    }

    #[must_use]
    pub const fn as_integer(mut self) -> Self {
        self.integer = true;
        self
    }

    #[must_use]
    pub const fn with_binding(mut self, buffer_binding: u8) -> Self {
        self.buffer_binding = buffer_binding;
        self
    }

    #[must_use]
    pub const fn per_instance(mut self, divisor: u32) -> Self {
        self.instance_divisor = divisor;
        self
    }

    /// Size of one attribute value in bytes.
    #[must_use]
    pub const fn byte_size(&self) -> u32 {
        self.components as u32 * self.component_type.size()
    }

    fn validate(&self, location: usize) -> Result<(), VertexFormatError> {
        if !(1..=4).contains(&self.components) {
            return Err(VertexFormatError::ComponentCount {
                location,
                count: self.components,
            });
        }
        if self.buffer_binding >= MAX_VERTEX_BUFFER_BINDINGS {
            return Err(VertexFormatError::BufferBinding {
                location,
                binding: self.buffer_binding,
            });
        }
        Ok(())
    }

    /// Packs a validated attribute. Never returns 0 for 1..=4 components.
    const fn compress(&self) -> u64 {
        let mut word = ComponentsField::set(0, self.components as u64);
        word = ComponentTypeField::set(word, self.component_type as u64);
        word = NormalizedField::set(word, self.normalized as u64);
        word = IntegerField::set(word, self.integer as u64);
        word = BufferBindingField::set(word, self.buffer_binding as u64);
        word = RelativeOffsetField::set(word, self.relative_offset as u64);
        DivisorField::set(word, self.instance_divisor as u64)
    }

    fn decompress(word: u64) -> Option<Self> {
        let components = ComponentsField::get(word) as u8;
        if components == 0 {
            return None;
        }
        Some(Self {
            components,
            component_type: ComponentType::ALL[ComponentTypeField::get(word) as usize],
            normalized: NormalizedField::flag(word),
            integer: IntegerField::flag(word),
            buffer_binding: BufferBindingField::get(word) as u8,
            relative_offset: RelativeOffsetField::get(word) as u16,
            instance_divisor: DivisorField::get(word) as u32,
        })
    }
}

/// Attribute layout of a vertex-array object. Attribute `i` lives at shader
/// location `i`; unused locations are 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VertexFormatDesc {
    attributes: [u64; MAX_VERTEX_ATTRIBUTES],
}

impl VertexFormatDesc {
    /// The attribute-less format used for vertex-pulling and full-screen draws.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            attributes: [0; MAX_VERTEX_ATTRIBUTES],
        }
    }

    /// Builds a format from attributes at consecutive locations starting at 0.
    pub fn from_attributes(attributes: &[VertexAttribute]) -> Result<Self, VertexFormatError> {
        if attributes.len() > MAX_VERTEX_ATTRIBUTES {
            return Err(VertexFormatError::TooManyAttributes {
                count: attributes.len(),
            });
        }
        let mut desc = Self::empty();
        for (location, attribute) in attributes.iter().enumerate() {
            attribute.validate(location)?;
            desc.attributes[location] = attribute.compress();
        }
        Ok(desc)
    }

    /// vec3 position.
    #[must_use]
    pub const fn position() -> Self {
        Self::from_trusted(&[VertexAttribute::float(3, 0)])
    }

    /// vec2 position.
    #[must_use]
    pub const fn position_2d() -> Self {
        Self::from_trusted(&[VertexAttribute::float(2, 0)])
    }

    /// Interleaved vec3 position, vec3 normal, vec2 texture coordinate.
    #[must_use]
    pub const fn position_normal_uv() -> Self {
        Self::from_trusted(&[
            VertexAttribute::float(3, 0),
            VertexAttribute::float(3, 12),
            VertexAttribute::float(2, 24),
        ])
    }

    const fn from_trusted(attributes: &[VertexAttribute]) -> Self {
        let mut desc = Self::empty();
        let mut location = 0;
        while location < attributes.len() {
            desc.attributes[location] = attributes[location].compress();
            location += 1;
        }
        desc
    }

    #[must_use]
    pub fn attribute(&self, location: usize) -> Option<VertexAttribute> {
        self.attributes
            .get(location)
            .copied()
            .and_then(VertexAttribute::decompress)
    }

    /// Used attributes with their locations.
    pub fn attributes(&self) -> impl Iterator<Item = (usize, VertexAttribute)> + '_ {
        self.attributes
            .iter()
            .enumerate()
            .filter_map(|(location, &word)| Some((location, VertexAttribute::decompress(word)?)))
    }

    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.attributes.iter().filter(|&&word| word != 0).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attribute_count() == 0
    }
}
