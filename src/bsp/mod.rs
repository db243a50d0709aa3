// src/bsp/mod.rs
pub mod bsp_mesh;
pub mod bsp_pick;
pub mod lightmap;
pub mod map_renderer;

pub use bsp_mesh::{build_batches, triangulate_fan, BuildOptions, FaceSpan, MapBatches, RenderBatch};
pub use bsp_pick::{pick, pick_ray, pick_with_ray, PickResult, PICK_SENTINEL_DIST};
pub use lightmap::{AtlasRect, LightmapAtlas, LightmapExtents};
pub use map_renderer::MapRenderer;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// World units per lightmap sample.
pub const LIGHTMAP_SCALE: f32 = 16.0;

/// Default atlas page edge, in samples.
pub const LIGHTMAP_PAGE_SIZE: u32 = 512;

bitflags! {
    /// What the viewer draws. Visibility classes also decide what can be picked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RenderFlags: u32 {
        const TEXTURES = 1 << 0;
        const LIGHTMAPS = 1 << 1;
        const WIREFRAME = 1 << 2;
        const ENTITIES = 1 << 3;
        const SPECIAL = 1 << 4;
        const SPECIAL_ENTITIES = 1 << 5;
        const POINT_ENTITIES = 1 << 6;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        RenderFlags::TEXTURES
            | RenderFlags::LIGHTMAPS
            | RenderFlags::SPECIAL
            | RenderFlags::ENTITIES
            | RenderFlags::SPECIAL_ENTITIES
            | RenderFlags::POINT_ENTITIES
    }
}

impl RenderFlags {
    /// Flags that change which geometry exists in the batches, as opposed to
    /// how it is drawn. Toggling one of these requires a rebuild.
    pub fn geometry_mask() -> RenderFlags {
        RenderFlags::LIGHTMAPS
            | RenderFlags::ENTITIES
            | RenderFlags::SPECIAL
            | RenderFlags::SPECIAL_ENTITIES
            | RenderFlags::POINT_ENTITIES
    }
}

/// Which visibility class a piece of geometry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeometryClass {
    World,
    /// Sky, trigger and clip textured faces of the world.
    Special,
    Entity,
    /// Trigger-like brush entities.
    SpecialEntity,
    PointEntity,
}

impl GeometryClass {
    pub fn is_visible(self, flags: RenderFlags) -> bool {
        match self {
            GeometryClass::World => true,
            GeometryClass::Special => flags.contains(RenderFlags::SPECIAL),
            GeometryClass::Entity => flags.contains(RenderFlags::ENTITIES),
            GeometryClass::SpecialEntity => flags.contains(RenderFlags::SPECIAL_ENTITIES),
            GeometryClass::PointEntity => flags.contains(RenderFlags::POINT_ENTITIES),
        }
    }
}

/// Batches are keyed (and drawn) in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialKey {
    pub class: GeometryClass,
    pub texture: Option<usize>,
    pub lightmap_page: Option<usize>,
}

impl MaterialKey {
    pub fn new(class: GeometryClass, texture: Option<usize>, lightmap_page: Option<usize>) -> Self {
        MaterialKey {
            class,
            texture,
            lightmap_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = RenderFlags::default();
        assert!(flags.contains(RenderFlags::TEXTURES | RenderFlags::LIGHTMAPS));
        assert!(!flags.contains(RenderFlags::WIREFRAME));
    }

    #[test]
    fn test_class_visibility() {
        let none = RenderFlags::empty();
        assert!(GeometryClass::World.is_visible(none));
        assert!(!GeometryClass::Entity.is_visible(none));
        assert!(GeometryClass::PointEntity.is_visible(RenderFlags::POINT_ENTITIES));
        assert!(!GeometryClass::Special.is_visible(RenderFlags::SPECIAL_ENTITIES));
    }

    #[test]
    fn test_wireframe_is_not_geometry() {
        assert!(!RenderFlags::geometry_mask().contains(RenderFlags::WIREFRAME));
        assert!(!RenderFlags::geometry_mask().contains(RenderFlags::TEXTURES));
    }

    #[test]
    fn test_material_key_order() {
        let world = MaterialKey::new(GeometryClass::World, Some(3), None);
        let ent = MaterialKey::new(GeometryClass::Entity, Some(0), None);
        let lit = MaterialKey::new(GeometryClass::World, Some(3), Some(0));
        assert!(world < ent);
        assert!(world < lit);
    }
}
