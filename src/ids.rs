//! Typed indices into the rasterizer, depth/stencil and blend state caches.
//!
//! State objects do not get resource ids: they never outlive the manager and
//! are selected by position, which is also what snapshots store.

use std::fmt;

use bindery_core::NativeHandle;

macro_rules! define_state_ids {
    ($($name:ident => $label:literal),* $(,)?) => {
        $(
            paste::paste! {
                #[doc = "Position of a cached " $label " state, in creation order."]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
                pub struct [<$name StateId>](pub(crate) u32);

                impl [<$name StateId>] {
                    #[inline]
                    #[must_use]
                    pub const fn index(self) -> u32 {
                        self.0
                    }
                }

                impl fmt::Display for [<$name StateId>] {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "{}#{}", $label, self.0)
                    }
                }
            }
        )*
    };
}

define_state_ids! {
    Rasterizer => "rasterizer",
    DepthStencil => "depth_stencil",
    Blend => "blend",
}

/// A cached state object: its typed index and the device object behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateObject<I> {
    pub id: I,
    pub native: NativeHandle,
}
