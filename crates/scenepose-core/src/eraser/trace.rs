//! Connected-component labelling and boundary tracing over alpha masks.
//!
//! Works on the single-channel coverage masks produced by
//! [`super::raster`]: find the 4-connected islands of pixels that survive
//! an erase, then walk each island's outline so it can be re-vectorized
//! as a polygon.

use image::GrayImage;

/// One surviving connected component of the mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Island {
    /// Label value in the label map (1-based; 0 is background).
    pub label: u32,
    pub pixel_count: usize,
    /// Topmost-then-leftmost pixel, where tracing starts.
    pub start: (u32, u32),
    /// Inclusive pixel bounding box.
    pub min: (u32, u32),
    pub max: (u32, u32),
}

impl Island {
    pub fn width(&self) -> u32 {
        self.max.0 - self.min.0 + 1
    }

    pub fn height(&self) -> u32 {
        self.max.1 - self.min.1 + 1
    }

    /// Center of the pixel bounding box, in mask coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min.0 + self.max.0 + 1) as f64 / 2.0,
            (self.min.1 + self.max.1 + 1) as f64 / 2.0,
        )
    }
}

/// Label every 4-connected island of pixels with alpha above `threshold`.
///
/// Iterative: an explicit work stack and a label map double as the
/// visited set, so arbitrarily large islands cannot blow the call stack.
/// Islands smaller than `min_pixels` are dropped from the returned list
/// (they keep their labels in the map, they just aren't traced).
pub(crate) fn find_islands(
    mask: &GrayImage,
    threshold: u8,
    min_pixels: usize,
) -> (Vec<u32>, Vec<Island>) {
    let (w, h) = mask.dimensions();
    let mut labels = vec![0u32; (w as usize) * (h as usize)];
    let mut islands = Vec::new();
    let mut next_label = 1u32;
    let mut stack: Vec<(u32, u32)> = Vec::new();

    let idx = |x: u32, y: u32| (y as usize) * (w as usize) + x as usize;
    let fg = |x: u32, y: u32| mask.get_pixel(x, y).0[0] > threshold;

    for y in 0..h {
        for x in 0..w {
            if !fg(x, y) || labels[idx(x, y)] != 0 {
                continue;
            }
            // Row-major scan order makes this seed the topmost-leftmost
            // pixel of the new island.
            let label = next_label;
            next_label += 1;
            let mut island = Island {
                label,
                pixel_count: 0,
                start: (x, y),
                min: (x, y),
                max: (x, y),
            };
            stack.push((x, y));
            labels[idx(x, y)] = label;
            while let Some((px, py)) = stack.pop() {
                island.pixel_count += 1;
                island.min.0 = island.min.0.min(px);
                island.min.1 = island.min.1.min(py);
                island.max.0 = island.max.0.max(px);
                island.max.1 = island.max.1.max(py);
                let mut visit = |nx: u32, ny: u32, labels: &mut Vec<u32>| {
                    if fg(nx, ny) && labels[idx(nx, ny)] == 0 {
                        labels[idx(nx, ny)] = label;
                        stack.push((nx, ny));
                    }
                };
                if px > 0 {
                    visit(px - 1, py, &mut labels);
                }
                if px + 1 < w {
                    visit(px + 1, py, &mut labels);
                }
                if py > 0 {
                    visit(px, py - 1, &mut labels);
                }
                if py + 1 < h {
                    visit(px, py + 1, &mut labels);
                }
            }
            if island.pixel_count >= min_pixels {
                islands.push(island);
            }
        }
    }
    (labels, islands)
}

/// Moore-neighbor offsets in a fixed rotational order. Consecutive
/// entries are themselves adjacent pixels, which the backtrack update in
/// [`trace_boundary`] relies on.
const MOORE: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Trace the outer boundary of an island with Moore-neighbor tracing.
///
/// Starts at the island's topmost-leftmost pixel with the backtrack to
/// its west (guaranteed background by the scan order) and walks the
/// 8-neighborhood until it returns to the start. A hard iteration
/// ceiling proportional to the island size turns pathological masks into
/// a partial outline instead of a hang. Returns pixel-center coordinates.
pub(crate) fn trace_boundary(
    labels: &[u32],
    width: u32,
    height: u32,
    island: &Island,
) -> Vec<(f64, f64)> {
    let on_island = |x: i32, y: i32| -> bool {
        x >= 0
            && y >= 0
            && (x as u32) < width
            && (y as u32) < height
            && labels[(y as usize) * (width as usize) + x as usize] == island.label
    };

    let start = (island.start.0 as i32, island.start.1 as i32);
    let mut boundary = vec![start];
    let mut current = start;
    // Direction index (into MOORE) pointing from `current` at its last
    // known background neighbor; the west seed is index 0.
    let mut backtrack = 0usize;

    let max_steps = island.pixel_count * 10 + 100;
    for _ in 0..max_steps {
        let mut advanced = false;
        for k in 1..=8 {
            let dir = (backtrack + k) % 8;
            let next = (current.0 + MOORE[dir].0, current.1 + MOORE[dir].1);
            if !on_island(next.0, next.1) {
                continue;
            }
            if next == start {
                // Closed the loop.
                return to_centers(boundary);
            }
            boundary.push(next);
            // New backtrack: the background neighbor examined just
            // before `next`, re-expressed as a direction from `next`.
            let prev_dir = (backtrack + k - 1) % 8;
            let prev = (current.0 + MOORE[prev_dir].0, current.1 + MOORE[prev_dir].1);
            let delta = (prev.0 - next.0, prev.1 - next.1);
            backtrack = MOORE
                .iter()
                .position(|&o| o == delta)
                .unwrap_or(0);
            current = next;
            advanced = true;
            break;
        }
        if !advanced {
            // Single isolated pixel: its outline is itself.
            break;
        }
    }
    to_centers(boundary)
}

fn to_centers(boundary: Vec<(i32, i32)>) -> Vec<(f64, f64)> {
    boundary
        .into_iter()
        .map(|(x, y)| (x as f64 + 0.5, y as f64 + 0.5))
        .collect()
}

/// Keep every `factor`-th boundary vertex. Falls back to the full
/// boundary when thinning would leave fewer than three vertices.
pub(crate) fn downsample_boundary(boundary: &[(f64, f64)], factor: usize) -> Vec<(f64, f64)> {
    if factor <= 1 {
        return boundary.to_vec();
    }
    let thinned: Vec<(f64, f64)> = boundary.iter().step_by(factor).copied().collect();
    if thinned.len() >= 3 {
        thinned
    } else {
        boundary.to_vec()
    }
}
