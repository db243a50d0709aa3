// src/bsp/bsp_mesh.rs
//! Turns a level's faces into render batches.
//!
//! Every drawable face is fan-triangulated and appended to the batch for its
//! material key. Batches are rebuilt from scratch whenever geometry, entities
//! or the visible classes change.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bsp::lightmap::{face_extents, face_samples, LightmapAtlas, LightmapExtents};
use crate::bsp::{GeometryClass, MaterialKey, RenderFlags, LIGHTMAP_PAGE_SIZE};
use crate::map::Level;
use crate::render::primitives::{Color3, ColoredCube, ColoredVertex, LightmapVertex};
use crate::render::vertex_buffer::{Vertex, VertexBuffer};

/// Knobs for [`build_batches`] that come from the viewer config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub lightmap_page_size: u32,
    /// Half the edge of a point entity's cube.
    pub point_entity_extent: f32,
    pub point_entity_color: Color3,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            lightmap_page_size: LIGHTMAP_PAGE_SIZE,
            point_entity_extent: 8.0,
            point_entity_color: Color3::new(220, 0, 220),
        }
    }
}

/// The run of vertices a single face (or point entity cube) occupies in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSpan {
    pub entity: usize,
    pub model: Option<usize>,
    /// `None` for point entity cubes.
    pub face: Option<usize>,
    pub first_vertex: usize,
    pub vertex_count: usize,
}

/// Triangles sharing one material key.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch<V: Vertex> {
    pub key: MaterialKey,
    pub vertices: Vec<V>,
    pub spans: Vec<FaceSpan>,
    pub buffer: VertexBuffer,
}

impl<V: Vertex> RenderBatch<V> {
    pub fn new(key: MaterialKey) -> Self {
        RenderBatch {
            key,
            vertices: Vec::new(),
            spans: Vec::new(),
            buffer: VertexBuffer::default(),
        }
    }

    /// Appends already triangulated vertices under one span.
    pub fn push(&mut self, entity: usize, model: Option<usize>, face: Option<usize>, vertices: &[V]) {
        self.spans.push(FaceSpan {
            entity,
            model,
            face,
            first_vertex: self.vertices.len(),
            vertex_count: vertices.len(),
        });
        self.vertices.extend_from_slice(vertices);
    }

    /// Packs the vertices into the upload buffer.
    pub fn finish(&mut self) {
        self.buffer = VertexBuffer::from_vertices(&self.vertices);
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn span_vertices(&self, span: &FaceSpan) -> &[V] {
        self.vertices
            .get(span.first_vertex..span.first_vertex + span.vertex_count)
            .unwrap_or(&[])
    }

    /// Triangles of the batch with the span they belong to.
    pub fn triangles(&self) -> impl Iterator<Item = ([Vec3; 3], &FaceSpan)> + '_ {
        self.spans.iter().flat_map(move |span| {
            self.span_vertices(span)
                .chunks_exact(3)
                .map(move |tri| ([tri[0].position(), tri[1].position(), tri[2].position()], span))
        })
    }
}

/// Everything the renderer and picker need for one map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapBatches {
    /// Flags the batches were built with.
    pub flags: RenderFlags,
    pub faces: BTreeMap<MaterialKey, RenderBatch<LightmapVertex>>,
    pub point_entities: RenderBatch<ColoredVertex>,
    pub lightmaps: LightmapAtlas,
    /// Faces dropped for bad indices or too few vertices.
    pub skipped_faces: usize,
}

impl MapBatches {
    pub fn empty(flags: RenderFlags, options: &BuildOptions) -> Self {
        MapBatches {
            flags,
            faces: BTreeMap::new(),
            point_entities: RenderBatch::new(MaterialKey::new(GeometryClass::PointEntity, None, None)),
            lightmaps: LightmapAtlas::new(options.lightmap_page_size),
            skipped_faces: 0,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.values().map(RenderBatch::triangle_count).sum::<usize>()
            + self.point_entities.triangle_count()
    }

    /// Finds the span drawn for `face` of `entity`.
    pub fn face_span(&self, entity: usize, face: usize) -> Option<(&RenderBatch<LightmapVertex>, &FaceSpan)> {
        self.faces.values().find_map(|batch| {
            batch
                .spans
                .iter()
                .find(|span| span.entity == entity && span.face == Some(face))
                .map(|span| (batch, span))
        })
    }

    pub fn point_entity_span(&self, entity: usize) -> Option<&FaceSpan> {
        self.point_entities.spans.iter().find(|span| span.entity == entity)
    }
}

/// Fan-triangulates a convex polygon around its first vertex:
/// `(p0, p1, p2), (p0, p2, p3), ...`. Fewer than three points yields nothing.
pub fn triangulate_fan<T: Copy>(points: &[T]) -> Vec<T> {
    if points.len() < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((points.len() - 2) * 3);
    for i in 1..points.len() - 1 {
        out.push(points[0]);
        out.push(points[i]);
        out.push(points[i + 1]);
    }
    out
}

/// A brush model scheduled for meshing.
struct ModelJob {
    entity: usize,
    model: usize,
    class: GeometryClass,
    offset: Vec3,
}

/// One face's geometry before lightmap packing.
struct FaceGeometry {
    entity: usize,
    model: usize,
    face: usize,
    class: GeometryClass,
    texture: usize,
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    /// Sample-space lightmap coordinates per vertex, with the grid size.
    lightmap: Option<(LightmapExtents, Vec<Vec2>)>,
}

fn entity_class(level: &Level, entity: usize) -> GeometryClass {
    let ent = &level.entities[entity];
    if ent.is_worldspawn() {
        GeometryClass::World
    } else if ent.is_special() {
        GeometryClass::SpecialEntity
    } else {
        GeometryClass::Entity
    }
}

fn model_jobs(level: &Level, flags: RenderFlags) -> Vec<ModelJob> {
    let mut jobs = Vec::new();
    for (entity, ent) in level.entities.iter().enumerate() {
        let model = match ent.bsp_model_index() {
            Some(model) => model,
            None => continue,
        };
        if model >= level.models.len() {
            debug!("{}: entity {} references missing model {}", level.name, entity, model);
            continue;
        }
        let class = entity_class(level, entity);
        if !class.is_visible(flags) {
            continue;
        }
        let offset = if class == GeometryClass::World {
            Vec3::ZERO
        } else {
            ent.origin()
        };
        jobs.push(ModelJob {
            entity,
            model,
            class,
            offset,
        });
    }
    jobs
}

fn face_geometry(level: &Level, job: &ModelJob, face: usize, flags: RenderFlags) -> Option<FaceGeometry> {
    let points = level.face_vertices(face).filter(|points| points.len() >= 3)?;
    let texinfo = level.face_texinfo(face)?;
    let texture = level.textures.get(texinfo.texture)?;

    let class = if job.class == GeometryClass::World && (texinfo.is_special() || texture.is_special()) {
        GeometryClass::Special
    } else {
        job.class
    };
    if !class.is_visible(flags) {
        return None;
    }

    let (width, height) = (texture.width.max(1) as f32, texture.height.max(1) as f32);
    let texels: Vec<(f32, f32)> = points.iter().map(|p| texinfo.texel(*p)).collect();
    let uvs = texels.iter().map(|&(s, t)| Vec2::new(s / width, t / height)).collect();

    let lightmap = if flags.contains(RenderFlags::LIGHTMAPS) && !texinfo.is_special() {
        face_extents(level, face).map(|extents| {
            let coords = texels
                .iter()
                .map(|&(s, t)| extents.sample_coord(s, t))
                .collect();
            (extents, coords)
        })
    } else {
        None
    };

    Some(FaceGeometry {
        entity: job.entity,
        model: job.model,
        face,
        class,
        texture: texinfo.texture,
        positions: points.iter().map(|p| *p + job.offset).collect(),
        uvs,
        lightmap,
    })
}

/// Meshes one model. `None` entries mark skipped faces.
fn model_geometry(level: &Level, job: &ModelJob, flags: RenderFlags) -> Vec<Option<FaceGeometry>> {
    level.models[job.model]
        .faces()
        .map(|face| {
            let geometry = face_geometry(level, job, face, flags);
            if geometry.is_none() && !face_is_hidden(level, job, face, flags) {
                debug!("{}: skipping malformed face {}", level.name, face);
            }
            geometry
        })
        .collect()
}

/// Whether a face was dropped by visibility rather than for being malformed.
fn face_is_hidden(level: &Level, job: &ModelJob, face: usize, flags: RenderFlags) -> bool {
    let special = level.face_texinfo(face).map_or(false, |t| t.is_special())
        || level.face_texture(face).map_or(false, |t| t.is_special());
    job.class == GeometryClass::World && special && !flags.contains(RenderFlags::SPECIAL)
}

/// Builds the batches for `level` under `flags`.
///
/// Models are meshed in parallel; lightmap packing and batch assembly happen
/// afterwards in entity/face order so the output never depends on scheduling.
pub fn build_batches(level: &Level, flags: RenderFlags, options: &BuildOptions) -> MapBatches {
    let mut out = MapBatches::empty(flags, options);

    let jobs = model_jobs(level, flags);
    let meshed: Vec<Vec<Option<FaceGeometry>>> = jobs
        .par_iter()
        .map(|job| model_geometry(level, job, flags))
        .collect();

    for (job, faces) in jobs.iter().zip(meshed) {
        for (offset, geometry) in faces.into_iter().enumerate() {
            let geometry = match geometry {
                Some(geometry) => geometry,
                None => {
                    let face = level.models[job.model].first_face + offset;
                    if !face_is_hidden(level, job, face, flags) {
                        out.skipped_faces += 1;
                    }
                    continue;
                }
            };
            append_face(level, &mut out, geometry);
        }
    }

    if flags.contains(RenderFlags::POINT_ENTITIES) {
        append_point_entities(level, &mut out, options);
    }

    for batch in out.faces.values_mut() {
        batch.finish();
    }
    out.point_entities.finish();

    debug!(
        "{}: built {} batches, {} triangles, {} lightmap page(s), {} skipped faces",
        level.name,
        out.faces.len(),
        out.triangle_count(),
        out.lightmaps.page_count(),
        out.skipped_faces
    );
    out
}

fn append_face(level: &Level, out: &mut MapBatches, geometry: FaceGeometry) {
    let mut rect = None;
    if let Some((extents, _)) = &geometry.lightmap {
        if let Some(samples) = face_samples(level, geometry.face, extents) {
            rect = out.lightmaps.insert(extents.width, extents.height, samples);
        }
    }

    let vertices: Vec<LightmapVertex> = geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let lightmap_uv = match (&geometry.lightmap, &rect) {
                (Some((_, coords)), Some(rect)) => out.lightmaps.uv(rect, coords[i]),
                _ => Vec2::ZERO,
            };
            LightmapVertex {
                position,
                uv: geometry.uvs[i],
                lightmap_uv,
            }
        })
        .collect();

    let key = MaterialKey::new(geometry.class, Some(geometry.texture), rect.map(|r| r.page));
    out.faces
        .entry(key)
        .or_insert_with(|| RenderBatch::new(key))
        .push(
            geometry.entity,
            Some(geometry.model),
            Some(geometry.face),
            &triangulate_fan(&vertices),
        );
}

fn append_point_entities(level: &Level, out: &mut MapBatches, options: &BuildOptions) {
    let extent = Vec3::splat(options.point_entity_extent);
    for (entity, ent) in level.entities.iter().enumerate() {
        if ent.bsp_model_index().is_some() || ent.classname().is_empty() {
            continue;
        }
        let origin = ent.origin();
        let cube = ColoredCube::new(origin - extent, origin + extent, options.point_entity_color);
        out.point_entities.push(entity, None, None, &cube.vertices());
    }
}
