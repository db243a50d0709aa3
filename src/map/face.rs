// src/map/face.rs
use serde::{Deserialize, Serialize};

/// Number of light style slots per face.
pub const MAX_LIGHTMAPS: usize = 4;

/// Style value marking an unused light style slot.
pub const NO_LIGHT_STYLE: u8 = 255;

/// A convex planar polygon of the level.
///
/// Layout mirrors the compiled `dface_t` record:
///
/// ```text
/// field        meaning
/// -----------  ---------------------------------------------------------
/// plane        index into the plane list
/// side         0 = face points along the plane normal, otherwise opposite
/// first_edge   index of the first surfedge of this face's edge loop
/// num_edges    number of surfedges (= number of polygon vertices)
/// texinfo      index into the texinfo list
/// styles       light styles; only style 0 is rendered
/// light_offset byte offset into the lighting lump, negative when unlit
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub plane: usize,

    #[serde(default)]
    pub side: u16,

    pub first_edge: usize,

    pub num_edges: usize,

    pub texinfo: usize,

    #[serde(default = "unlit_styles")]
    pub styles: [u8; MAX_LIGHTMAPS],

    #[serde(default = "unlit_offset")]
    pub light_offset: i32,
}

fn unlit_styles() -> [u8; MAX_LIGHTMAPS] {
    [0, NO_LIGHT_STYLE, NO_LIGHT_STYLE, NO_LIGHT_STYLE]
}

fn unlit_offset() -> i32 {
    -1
}

impl Face {
    pub fn new(plane: usize, side: u16, first_edge: usize, num_edges: usize, texinfo: usize) -> Self {
        Face {
            plane,
            side,
            first_edge,
            num_edges,
            texinfo,
            styles: unlit_styles(),
            light_offset: unlit_offset(),
        }
    }

    /// Whether the face is drawn on the back side of its plane.
    pub fn is_back_side(&self) -> bool {
        self.side != 0
    }

    /// Whether the face carries baked lighting for style 0.
    pub fn has_lightmap(&self) -> bool {
        self.light_offset >= 0 && self.styles[0] != NO_LIGHT_STYLE
    }
}
