// src/map/level.rs

use std::fs;
use std::path::Path;

use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::map::{BrushModel, Entity, Face, MipTexture, Plane, TexInfo};
use crate::utils::util::safe_normalize;

/// A loaded level, as handed over by the lump parser.
///
/// All cross references are plain indices that stay valid for the lifetime of
/// the level. The scene builder and picker still bounds-check every lookup,
/// since entity edits can leave references dangling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub planes: Vec<Plane>,
    pub vertices: Vec<Vec3>,
    pub edges: Vec<[u32; 2]>,
    /// Signed edge references; negative values walk the edge end → start.
    pub surfedges: Vec<i32>,
    pub faces: Vec<Face>,
    pub texinfos: Vec<TexInfo>,
    pub textures: Vec<MipTexture>,
    /// RGB samples, three bytes each.
    #[serde(default)]
    pub lighting: Vec<u8>,
    pub models: Vec<BrushModel>,
    pub entities: Vec<Entity>,
}

impl Level {
    pub fn new(name: &str) -> Self {
        Level {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Reads a level from its JSON interchange form and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let level = Self::from_json(&text)?;
        info!(
            "Loaded level '{}' ({} faces, {} models, {} entities)",
            level.name,
            level.faces.len(),
            level.models.len(),
            level.entities.len()
        );
        Ok(level)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let level: Level = serde_json::from_str(text)?;
        level.validate()?;
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Vertex positions of a face's edge loop, in winding order.
    ///
    /// Returns `None` when any index along the way is out of range.
    pub fn face_vertices(&self, face_index: usize) -> Option<Vec<Vec3>> {
        let face = self.faces.get(face_index)?;
        let end = face.first_edge.checked_add(face.num_edges)?;
        let surfedges = self.surfedges.get(face.first_edge..end)?;

        let mut points = Vec::with_capacity(surfedges.len());
        for &surfedge in surfedges {
            let vertex = if surfedge >= 0 {
                self.edges.get(surfedge as usize)?[0]
            } else {
                self.edges.get(surfedge.unsigned_abs() as usize)?[1]
            };
            points.push(*self.vertices.get(vertex as usize)?);
        }
        Some(points)
    }

    /// The face's plane, flipped when the face lies on its back side.
    pub fn face_plane(&self, face_index: usize) -> Option<Plane> {
        let face = self.faces.get(face_index)?;
        let plane = self.planes.get(face.plane)?;
        Some(if face.is_back_side() { plane.flipped() } else { *plane })
    }

    pub fn face_texinfo(&self, face_index: usize) -> Option<&TexInfo> {
        let face = self.faces.get(face_index)?;
        self.texinfos.get(face.texinfo)
    }

    pub fn face_texture(&self, face_index: usize) -> Option<&MipTexture> {
        let texinfo = self.face_texinfo(face_index)?;
        self.textures.get(texinfo.texture)
    }

    /// The first entity drawing `model_index`.
    pub fn entity_for_model(&self, model_index: usize) -> Option<usize> {
        self.entities
            .iter()
            .position(|ent| ent.bsp_model_index() == Some(model_index))
    }

    /// The model that owns `face_index`.
    pub fn model_for_face(&self, face_index: usize) -> Option<usize> {
        self.models
            .iter()
            .position(|model| model.faces().contains(&face_index))
    }

    /// Checks every cross reference. Loading rejects levels that fail this.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ViewerError::InvalidLevel {
            level: self.name.clone(),
            reason,
        };

        for (i, edge) in self.edges.iter().enumerate() {
            if edge.iter().any(|&v| v as usize >= self.vertices.len()) {
                return Err(invalid(format!("edge {} references a missing vertex", i)));
            }
        }
        for (i, &surfedge) in self.surfedges.iter().enumerate() {
            if surfedge.unsigned_abs() as usize >= self.edges.len() {
                return Err(invalid(format!("surfedge {} references a missing edge", i)));
            }
        }
        for (i, face) in self.faces.iter().enumerate() {
            if face.plane >= self.planes.len() {
                return Err(invalid(format!("face {} references plane {}", i, face.plane)));
            }
            if face.texinfo >= self.texinfos.len() {
                return Err(invalid(format!("face {} references texinfo {}", i, face.texinfo)));
            }
            let edges_end = face.first_edge.checked_add(face.num_edges);
            if edges_end.map_or(true, |end| end > self.surfedges.len()) {
                return Err(invalid(format!("face {} edge range is out of bounds", i)));
            }
        }
        for (i, texinfo) in self.texinfos.iter().enumerate() {
            if texinfo.texture >= self.textures.len() {
                return Err(invalid(format!("texinfo {} references texture {}", i, texinfo.texture)));
            }
        }
        for (i, model) in self.models.iter().enumerate() {
            let faces_end = model.first_face.checked_add(model.num_faces);
            if faces_end.map_or(true, |end| end > self.faces.len()) {
                return Err(invalid(format!("model {} face range is out of bounds", i)));
            }
        }
        if self.lighting.len() % 3 != 0 {
            return Err(invalid("lighting lump is not a whole number of RGB samples".into()));
        }
        Ok(())
    }

    // --- Construction helpers (used by tools and tests) ---

    /// Appends a texture and a texinfo projecting onto the plane most aligned
    /// with `normal`, returning the texinfo index.
    pub fn add_texture(&mut self, name: &str, width: u32, height: u32, normal: Vec3) -> usize {
        self.textures.push(MipTexture::new(name, width, height));
        let (s_axis, t_axis) = texture_axes(normal);
        self.texinfos.push(TexInfo {
            s_axis,
            s_offset: 0.0,
            t_axis,
            t_offset: 0.0,
            texture: self.textures.len() - 1,
            flags: 0,
        });
        self.texinfos.len() - 1
    }

    /// Appends a convex polygon as a new face with its own plane, edges and
    /// surfedges. The plane normal follows the counter-clockwise winding.
    pub fn add_polygon(&mut self, points: &[Vec3], texinfo: usize) -> usize {
        let normal = if points.len() >= 3 {
            safe_normalize((points[1] - points[0]).cross(points[2] - points[0]), Vec3::Z)
        } else {
            Vec3::Z
        };
        let dist = points.first().map_or(0.0, |p| normal.dot(*p));
        self.planes.push(Plane::new(normal, dist));

        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(points);
        let first_edge = self.surfedges.len();
        for i in 0..points.len() as u32 {
            let next = (i + 1) % points.len() as u32;
            self.edges.push([base + i, base + next]);
            self.surfedges.push((self.edges.len() - 1) as i32);
        }

        self.faces.push(Face::new(
            self.planes.len() - 1,
            0,
            first_edge,
            points.len(),
            texinfo,
        ));
        self.faces.len() - 1
    }

    /// Appends a brush model covering `faces` and returns its index.
    pub fn add_model(&mut self, faces: std::ops::Range<usize>) -> usize {
        let mut mins = Vec3::splat(f32::MAX);
        let mut maxs = Vec3::splat(f32::MIN);
        for face in faces.clone() {
            for p in self.face_vertices(face).unwrap_or_default() {
                mins = mins.min(p);
                maxs = maxs.max(p);
            }
        }
        if faces.is_empty() {
            mins = Vec3::ZERO;
            maxs = Vec3::ZERO;
        }
        self.models
            .push(BrushModel::new(mins, maxs, faces.start, faces.len()));
        self.models.len() - 1
    }
}

/// Quake-style axis-aligned texture projection for a surface normal.
fn texture_axes(normal: Vec3) -> (Vec3, Vec3) {
    let a = normal.abs();
    if a.z >= a.x && a.z >= a.y {
        (Vec3::X, Vec3::NEG_Y)
    } else if a.x >= a.y {
        (Vec3::Y, Vec3::NEG_Z)
    } else {
        (Vec3::X, Vec3::NEG_Z)
    }
}
