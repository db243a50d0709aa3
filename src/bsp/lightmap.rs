// src/bsp/lightmap.rs
//! Per-face lightmap extents and atlas packing.
//!
//! Each lit face owns a small grid of RGB samples, one every
//! [`LIGHTMAP_SCALE`] texels. The grids are packed into fixed-size pages with
//! a skyline allocator: every page remembers how tall each column already is
//! and a new block goes where the tallest column it covers is lowest.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use image::{Rgb, RgbImage};
use log::{debug, info};

use crate::bsp::LIGHTMAP_SCALE;
use crate::error::Result;
use crate::map::Level;

/// Largest sample coordinate a face may reach before it is treated as unlit.
const MAX_SAMPLE_COORD: f32 = (1 << 20) as f32;

/// Sample grid of one face, in lightmap samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightmapExtents {
    /// `floor(min_s / 16)`
    pub min_s: i32,
    /// `floor(min_t / 16)`
    pub min_t: i32,
    pub width: u32,
    pub height: u32,
}

impl LightmapExtents {
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Sample-space coordinate of a texel coordinate, relative to the grid.
    pub fn sample_coord(&self, s: f32, t: f32) -> Vec2 {
        Vec2::new(
            s / LIGHTMAP_SCALE - self.min_s as f32,
            t / LIGHTMAP_SCALE - self.min_t as f32,
        )
    }
}

/// Computes the sample grid of `face_index` from its texel bounds.
///
/// Returns `None` for faces with bad indices or no vertices.
pub fn face_extents(level: &Level, face_index: usize) -> Option<LightmapExtents> {
    let points = level.face_vertices(face_index)?;
    let texinfo = level.face_texinfo(face_index)?;
    if points.is_empty() {
        return None;
    }

    let mut min = Vec2::splat(f32::MAX);
    let mut max = Vec2::splat(f32::MIN);
    for p in &points {
        let (s, t) = texinfo.texel(*p);
        min = min.min(Vec2::new(s, t));
        max = max.max(Vec2::new(s, t));
    }

    let bmin = (min / LIGHTMAP_SCALE).floor();
    let bmax = (max / LIGHTMAP_SCALE).ceil();
    if !bmin.is_finite() || !bmax.is_finite() {
        return None;
    }
    if bmin.abs().max_element() > MAX_SAMPLE_COORD || bmax.abs().max_element() > MAX_SAMPLE_COORD {
        debug!("Face {} lightmap extents out of range, drawing fullbright", face_index);
        return None;
    }
    let span = bmax - bmin;
    Some(LightmapExtents {
        min_s: bmin.x as i32,
        min_t: bmin.y as i32,
        width: (span.x as u32).checked_add(1)?,
        height: (span.y as u32).checked_add(1)?,
    })
}

/// The style-0 RGB samples of a face, or `None` when it is unlit or its data
/// runs past the end of the lighting lump.
pub fn face_samples<'a>(level: &'a Level, face_index: usize, extents: &LightmapExtents) -> Option<&'a [u8]> {
    let face = level.faces.get(face_index)?;
    if !face.has_lightmap() {
        return None;
    }
    let start = face.light_offset as usize;
    let end = start.checked_add(extents.sample_count().checked_mul(3)?)?;
    level.lighting.get(start..end)
}

/// Where a block landed in the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    pub page: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct AtlasPage {
    image: RgbImage,
    skyline: Vec<u32>,
}

impl AtlasPage {
    fn new(size: u32) -> Self {
        AtlasPage {
            image: RgbImage::new(size, size),
            skyline: vec![0; size as usize],
        }
    }

    fn allocate(&mut self, width: u32, height: u32, size: u32) -> Option<(u32, u32)> {
        let mut best_y = size;
        let mut best_x = None;

        for x in 0..=(size - width) {
            let mut tallest = 0;
            let mut fits = true;
            for &column in &self.skyline[x as usize..(x + width) as usize] {
                if column >= best_y {
                    fits = false;
                    break;
                }
                tallest = tallest.max(column);
            }
            if fits {
                best_x = Some(x);
                best_y = tallest;
            }
        }

        let x = best_x?;
        if best_y + height > size {
            return None;
        }
        for column in &mut self.skyline[x as usize..(x + width) as usize] {
            *column = best_y + height;
        }
        Some((x, best_y))
    }
}

/// Lightmap pages for one map.
#[derive(Debug, Clone, PartialEq)]
pub struct LightmapAtlas {
    page_size: u32,
    pages: Vec<AtlasPage>,
}

impl LightmapAtlas {
    pub fn new(page_size: u32) -> Self {
        LightmapAtlas {
            page_size: page_size.max(1),
            pages: Vec::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&RgbImage> {
        self.pages.get(index).map(|page| &page.image)
    }

    /// Reserves a `width` × `height` block, opening a new page when no
    /// existing one has room. Blocks larger than a page are refused.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        if width == 0 || height == 0 || width > self.page_size || height > self.page_size {
            return None;
        }

        let size = self.page_size;
        for (index, page) in self.pages.iter_mut().enumerate() {
            if let Some((x, y)) = page.allocate(width, height, size) {
                return Some(AtlasRect { page: index, x, y, width, height });
            }
        }

        let mut page = AtlasPage::new(size);
        let (x, y) = page.allocate(width, height, size)?;
        self.pages.push(page);
        debug!("Opened lightmap page {}", self.pages.len() - 1);
        Some(AtlasRect {
            page: self.pages.len() - 1,
            x,
            y,
            width,
            height,
        })
    }

    /// Allocates a block and copies `rgb` (row-major, 3 bytes per sample) into it.
    pub fn insert(&mut self, width: u32, height: u32, rgb: &[u8]) -> Option<AtlasRect> {
        if rgb.len() < width as usize * height as usize * 3 {
            return None;
        }
        let rect = self.allocate(width, height)?;
        let image = &mut self.pages[rect.page].image;
        for (i, sample) in rgb.chunks_exact(3).take(width as usize * height as usize).enumerate() {
            let (col, row) = (i as u32 % width, i as u32 / width);
            image.put_pixel(rect.x + col, rect.y + row, Rgb([sample[0], sample[1], sample[2]]));
        }
        Some(rect)
    }

    /// Atlas UV for a point `sample` samples into `rect`, at texel centres.
    pub fn uv(&self, rect: &AtlasRect, sample: Vec2) -> Vec2 {
        let size = self.page_size as f32;
        Vec2::new(
            (rect.x as f32 + sample.x + 0.5) / size,
            (rect.y as f32 + sample.y + 0.5) / size,
        )
    }

    /// Writes every page as `<prefix>_lightmap_<n>.png` into `dir`.
    pub fn save_pages<P: AsRef<Path>>(&self, dir: P, prefix: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.pages.len());
        for (i, page) in self.pages.iter().enumerate() {
            let path = dir.join(format!("{}_lightmap_{}.png", prefix, i));
            page.image.save(&path)?;
            written.push(path);
        }
        info!("Wrote {} lightmap page(s) to {}", written.len(), dir.display());
        Ok(written)
    }
}

impl Default for LightmapAtlas {
    fn default() -> Self {
        LightmapAtlas::new(crate::bsp::LIGHTMAP_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn overlaps(a: &AtlasRect, b: &AtlasRect) -> bool {
        a.page == b.page
            && a.x < b.x + b.width
            && b.x < a.x + a.width
            && a.y < b.y + b.height
            && b.y < a.y + a.height
    }

    #[test]
    fn test_extents_of_square_face() {
        let mut level = Level::new("lm");
        let tex = level.add_texture("floor", 64, 64, Vec3::Z);
        let face = level.add_polygon(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(64.0, 0.0, 0.0),
                Vec3::new(64.0, 64.0, 0.0),
                Vec3::new(0.0, 64.0, 0.0),
            ],
            tex,
        );
        let extents = face_extents(&level, face).unwrap();
        // s in [0, 64], t in [-64, 0]
        assert_eq!(extents.min_s, 0);
        assert_eq!(extents.min_t, -4);
        assert_eq!((extents.width, extents.height), (5, 5));
        assert_eq!(extents.sample_count(), 25);
    }

    #[test]
    fn test_huge_texel_span_has_no_extents() {
        let mut level = Level::new("lm");
        let tex = level.add_texture("floor", 64, 64, Vec3::Z);
        let face = level.add_polygon(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(64.0, 0.0, 0.0),
                Vec3::new(64.0, 64.0, 0.0),
                Vec3::new(0.0, 64.0, 0.0),
            ],
            tex,
        );
        let texinfo = level.faces[face].texinfo;
        level.texinfos[texinfo].s_axis = Vec3::new(1e30, 0.0, 0.0);
        assert!(level.validate().is_ok());
        assert!(face_extents(&level, face).is_none());

        level.texinfos[texinfo].s_axis = Vec3::new(f32::INFINITY, 0.0, 0.0);
        assert!(face_extents(&level, face).is_none());
    }

    #[test]
    fn test_unlit_face_has_no_samples() {
        let mut level = Level::new("lm");
        let tex = level.add_texture("floor", 64, 64, Vec3::Z);
        let face = level.add_polygon(&[Vec3::ZERO, Vec3::X * 16.0, Vec3::Y * 16.0], tex);
        let extents = face_extents(&level, face).unwrap();
        assert!(face_samples(&level, face, &extents).is_none());

        level.faces[face].light_offset = 0;
        level.faces[face].styles[0] = 0;
        assert!(face_samples(&level, face, &extents).is_none());
        level.lighting = vec![128; extents.sample_count() * 3];
        assert_eq!(face_samples(&level, face, &extents).unwrap().len(), extents.sample_count() * 3);
    }

    #[test]
    fn test_packing_does_not_overlap() {
        let mut atlas = LightmapAtlas::new(64);
        let mut rects = Vec::new();
        for i in 0..40u32 {
            let (w, h) = (3 + i % 7, 2 + (i * 5) % 11);
            let rect = atlas.allocate(w, h).unwrap();
            assert!(rect.x + rect.width <= 64);
            assert!(rect.y + rect.height <= 64);
            rects.push(rect);
        }
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_full_page_opens_another() {
        let mut atlas = LightmapAtlas::new(16);
        let first = atlas.allocate(16, 16).unwrap();
        let second = atlas.allocate(4, 4).unwrap();
        assert_eq!(first.page, 0);
        assert_eq!(second.page, 1);
        assert_eq!(atlas.page_count(), 2);
        assert!(atlas.allocate(17, 1).is_none());
    }

    #[test]
    fn test_insert_copies_samples() {
        let mut atlas = LightmapAtlas::new(8);
        let rgb = [10, 20, 30, 40, 50, 60];
        let rect = atlas.insert(2, 1, &rgb).unwrap();
        let page = atlas.page(rect.page).unwrap();
        assert_eq!(page.get_pixel(rect.x, rect.y), &Rgb([10, 20, 30]));
        assert_eq!(page.get_pixel(rect.x + 1, rect.y), &Rgb([40, 50, 60]));
        assert!(atlas.insert(4, 4, &rgb).is_none());
    }

    #[test]
    fn test_uv_at_texel_centre() {
        let atlas = LightmapAtlas::new(16);
        let rect = AtlasRect { page: 0, x: 2, y: 4, width: 3, height: 3 };
        let uv = atlas.uv(&rect, Vec2::ZERO);
        assert_eq!(uv, Vec2::new(2.5 / 16.0, 4.5 / 16.0));
    }

    #[test]
    fn test_save_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut atlas = LightmapAtlas::new(8);
        atlas.insert(1, 1, &[255, 0, 0]).unwrap();
        let written = atlas.save_pages(dir.path(), "test").unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].exists());
    }
}
