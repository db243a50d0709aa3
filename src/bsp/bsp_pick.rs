// src/bsp/bsp_pick.rs
//! Resolves a screen click to the nearest visible face or point entity.
//!
//! The cursor is unprojected onto the near plane, then every triangle of every
//! visible batch is tested. There is no acceleration structure; each map is
//! scanned linearly, maps in parallel.

use glam::Vec2;
use log::debug;
use rayon::prelude::*;

use crate::bsp::bsp_mesh::MapBatches;
use crate::bsp::map_renderer::MapRenderer;
use crate::bsp::{GeometryClass, RenderFlags};
use crate::render::camera::Camera;
use crate::render::transform::Viewport;
use crate::utils::geometry::{ray_triangle_intersection, Ray};
use crate::utils::util::try_normalize;

/// Distance stored in a pick that hit nothing.
pub const PICK_SENTINEL_DIST: f32 = f32::MAX;

/// The last selection. Indices are `None` unless `valid`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub valid: bool,
    pub best_dist: f32,
    pub map_index: Option<usize>,
    pub model_index: Option<usize>,
    pub entity_index: Option<usize>,
    /// `None` for point entities.
    pub face_index: Option<usize>,
    pub plane_index: Option<usize>,
}

impl Default for PickResult {
    fn default() -> Self {
        PickResult {
            valid: false,
            best_dist: PICK_SENTINEL_DIST,
            map_index: None,
            model_index: None,
            entity_index: None,
            face_index: None,
            plane_index: None,
        }
    }
}

impl PickResult {
    pub fn reset(&mut self) {
        *self = PickResult::default();
    }

    /// Point where the picking ray met the selection.
    pub fn hit_point(&self, ray: &Ray) -> Option<glam::Vec3> {
        if self.valid {
            Some(ray.at(self.best_dist))
        } else {
            None
        }
    }

    /// Clears the pick if any index no longer addresses something in `maps`,
    /// or the picked entity stopped drawing the picked model. Returns whether
    /// the pick is still valid.
    pub fn validate(&mut self, maps: &[MapRenderer]) -> bool {
        if !self.valid {
            return false;
        }
        let still_valid = self.map_index.and_then(|i| maps.get(i)).map_or(false, |map| {
            let level = map.level().read();
            let entity = match self.entity_index.and_then(|e| level.entities.get(e)) {
                Some(entity) => entity,
                None => return false,
            };
            let model_ok = match self.model_index {
                Some(model) => model < level.models.len() && entity.bsp_model_index() == Some(model),
                None => entity.bsp_model_index().is_none(),
            };
            let face_ok = self.face_index.map_or(true, |f| f < level.faces.len());
            model_ok && face_ok
        });
        if !still_valid {
            debug!("Clearing stale selection {:?}", self);
            self.reset();
        }
        still_valid
    }
}

/// Builds the world-space ray under `cursor` (pixels, origin top-left).
///
/// The ray starts on the near plane. Returns `None` for an empty viewport or
/// when the direction degenerates.
pub fn pick_ray(cursor: Vec2, viewport: Viewport, camera: &Camera) -> Option<Ray> {
    if viewport.width == 0 || viewport.height == 0 {
        return None;
    }
    let basis = camera.basis();

    let ndc_x = cursor.x / viewport.width as f32 * 2.0 - 1.0;
    let ndc_y = 1.0 - cursor.y / viewport.height as f32 * 2.0;

    let v_len = (camera.fov.to_radians() / 2.0).tan() * camera.z_near;
    let h_len = v_len * viewport.aspect();

    let start = camera.origin
        + basis.forward * camera.z_near
        + basis.right * (h_len * ndc_x)
        + basis.up * (v_len * ndc_y);
    let direction = try_normalize(start - camera.origin)?;
    Some(Ray { origin: start, direction })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit {
    dist: f32,
    map: usize,
    entity: usize,
    model: Option<usize>,
    face: Option<usize>,
}

impl Hit {
    /// Closer wins; exact ties go to the lowest (map, face, entity).
    fn beats(&self, other: &Hit) -> bool {
        if self.dist != other.dist {
            return self.dist < other.dist;
        }
        let order = |h: &Hit| (h.map, h.face.unwrap_or(usize::MAX), h.entity);
        order(self) < order(other)
    }
}

fn closer(best: Option<Hit>, candidate: Hit) -> Option<Hit> {
    match best {
        Some(best) if !candidate.beats(&best) => Some(best),
        _ => Some(candidate),
    }
}

fn pick_batches(map: usize, batches: &MapBatches, ray: &Ray, max_dist: f32, flags: RenderFlags) -> Option<Hit> {
    let mut best = None;
    for batch in batches.faces.values().filter(|b| b.key.class.is_visible(flags)) {
        for (tri, span) in batch.triangles() {
            if let Some(dist) = ray_triangle_intersection(ray, tri[0], tri[1], tri[2]) {
                if dist <= max_dist {
                    best = closer(best, Hit {
                        dist,
                        map,
                        entity: span.entity,
                        model: span.model,
                        face: span.face,
                    });
                }
            }
        }
    }

    if GeometryClass::PointEntity.is_visible(flags) {
        for (tri, span) in batches.point_entities.triangles() {
            if let Some(dist) = ray_triangle_intersection(ray, tri[0], tri[1], tri[2]) {
                if dist <= max_dist {
                    best = closer(best, Hit {
                        dist,
                        map,
                        entity: span.entity,
                        model: None,
                        face: None,
                    });
                }
            }
        }
    }
    best
}

/// Picks along an explicit ray. Hits farther than `max_dist` are ignored.
pub fn pick_with_ray(ray: &Ray, max_dist: f32, maps: &[MapRenderer], flags: RenderFlags) -> PickResult {
    let hits: Vec<Option<Hit>> = maps
        .par_iter()
        .enumerate()
        .map(|(i, map)| pick_batches(i, &map.batches(), ray, max_dist, flags))
        .collect();
    let best = hits.into_iter().flatten().fold(None, closer);

    let mut result = PickResult::default();
    if let Some(hit) = best {
        let plane = hit.face.and_then(|face| {
            let level = maps[hit.map].level().read();
            level.faces.get(face).map(|f| f.plane)
        });
        result = PickResult {
            valid: true,
            best_dist: hit.dist,
            map_index: Some(hit.map),
            model_index: hit.model,
            entity_index: Some(hit.entity),
            face_index: hit.face,
            plane_index: plane,
        };
    }
    result
}

/// Picks whatever is under `cursor`.
pub fn pick(cursor: Vec2, viewport: Viewport, camera: &Camera, maps: &[MapRenderer], flags: RenderFlags) -> PickResult {
    match pick_ray(cursor, viewport, camera) {
        Some(ray) => pick_with_ray(&ray, camera.z_far, maps, flags),
        None => PickResult::default(),
    }
}
