// src/watershed.rs - Marker-controlled flooding over the image gradient

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use image::RgbImage;

/// Pixel where two seed regions met; belongs to neither
pub const BOUNDARY: i32 = -1;
/// Not yet claimed by any marker
pub const UNKNOWN: i32 = 0;
/// Marker id of the background
pub const BACKGROUND_LABEL: i32 = 1;
/// Smallest id given to a seed
pub const FIRST_SEED_LABEL: i32 = 2;

/// Queue sentinel: the pixel has not been queued yet
const NOT_QUEUED: u16 = 256;

const NEIGHBOURS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Label grid shared by the separator and the flood
#[derive(Debug, Clone)]
pub struct MarkerImage {
    pub width: u32,
    pub height: u32,
    pub labels: Vec<i32>,
}

impl MarkerImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            labels: vec![UNKNOWN; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.labels[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, label: i32) {
        let idx = self.index(x, y);
        self.labels[idx] = label;
    }

    /// Distinct seed ids present in the grid, ascending
    pub fn seed_labels(&self) -> Vec<i32> {
        let mut seeds: Vec<i32> = self.labels.iter().cloned().filter(|&l| l >= FIRST_SEED_LABEL).collect();
        seeds.sort_unstable();
        seeds.dedup();
        seeds
    }

    fn neighbours(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let x = (idx % self.width as usize) as i32;
        let y = (idx / self.width as usize) as i32;
        NEIGHBOURS_4.iter().filter_map(move |&(dx, dy)| {
            let nx = x + dx;
            let ny = y + dy;
            if nx >= 0 && ny >= 0 && (nx as u32) < self.width && (ny as u32) < self.height {
                Some(ny as usize * self.width as usize + nx as usize)
            } else {
                None
            }
        })
    }
}

/// Largest per-channel absolute difference between two pixels
#[inline]
fn color_step(source: &RgbImage, a: usize, b: usize) -> u8 {
    let width = source.width() as usize;
    let pa = source.get_pixel((a % width) as u32, (a / width) as u32);
    let pb = source.get_pixel((b % width) as u32, (b / width) as u32);
    (0..3).map(|c| pa[c].abs_diff(pb[c])).max().unwrap_or(0)
}

struct FloodQueue {
    heap: BinaryHeap<Reverse<(u8, u64, usize, i32)>>,
    best: Vec<u16>,
    sequence: u64,
}

impl FloodQueue {
    fn new(len: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            best: vec![NOT_QUEUED; len],
            sequence: 0,
        }
    }

    /// Queue `idx` for `label` unless it is already queued at an equal or lower level
    fn push(&mut self, idx: usize, priority: u8, label: i32) {
        if (priority as u16) < self.best[idx] {
            self.best[idx] = priority as u16;
            self.heap.push(Reverse((priority, self.sequence, idx, label)));
            self.sequence += 1;
        }
    }

    fn pop(&mut self) -> Option<(usize, i32)> {
        self.heap.pop().map(|Reverse((_, _, idx, label))| (idx, label))
    }
}

/// Grow every marker through the unknown pixels, lowest color step first.
///
/// Within one priority level pixels are handled in the order they were
/// queued. A pixel claimed by a seed that already touches a different seed
/// becomes [`BOUNDARY`]; background and seeds meet without a line.
pub fn flood(markers: &mut MarkerImage, source: &RgbImage) {
    let len = markers.labels.len();
    let mut queue = FloodQueue::new(len);

    for idx in 0..len {
        let label = markers.labels[idx];
        if label <= UNKNOWN {
            continue;
        }
        for n in markers.neighbours(idx).collect::<Vec<_>>() {
            if markers.labels[n] == UNKNOWN {
                queue.push(n, color_step(source, n, idx), label);
            }
        }
    }

    while let Some((idx, label)) = queue.pop() {
        if markers.labels[idx] != UNKNOWN {
            continue;
        }

        if label >= FIRST_SEED_LABEL {
            let touches_other_seed = markers
                .neighbours(idx)
                .any(|n| markers.labels[n] >= FIRST_SEED_LABEL && markers.labels[n] != label);
            if touches_other_seed {
                markers.labels[idx] = BOUNDARY;
                continue;
            }
        }

        markers.labels[idx] = label;

        let unclaimed: Vec<usize> = markers
            .neighbours(idx)
            .filter(|&n| markers.labels[n] == UNKNOWN)
            .collect();
        for n in unclaimed {
            queue.push(n, color_step(source, n, idx), label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn two_seeds_meet_with_a_boundary() {
        let source = RgbImage::from_pixel(7, 1, Rgb([100, 100, 100]));
        let mut markers = MarkerImage::new(7, 1);
        markers.set(0, 0, 2);
        markers.set(6, 0, 3);

        flood(&mut markers, &source);
        assert_eq!(markers.labels, vec![2, 2, 2, BOUNDARY, 3, 3, 3]);
    }

    #[test]
    fn seed_stops_at_intensity_edge() {
        // Bright object on x < 5, dark floor from x = 5; the seed sits in the
        // object, background marker at the far right
        let source = RgbImage::from_fn(10, 3, |x, _| {
            if x < 5 { Rgb([220, 220, 220]) } else { Rgb([20, 20, 20]) }
        });
        let mut markers = MarkerImage::new(10, 3);
        for y in 0..3 {
            markers.set(0, y, 2);
            markers.set(9, y, BACKGROUND_LABEL);
        }

        flood(&mut markers, &source);
        for y in 0..3 {
            for x in 0..10 {
                let expected = if x < 5 { 2 } else { BACKGROUND_LABEL };
                assert_eq!(markers.get(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn flood_is_deterministic() {
        let source = RgbImage::from_fn(12, 12, |x, y| Rgb([(x * 13 + y * 7) as u8, 90, 40]));
        let mut first = MarkerImage::new(12, 12);
        first.set(1, 1, 2);
        first.set(10, 10, 3);
        first.set(10, 1, BACKGROUND_LABEL);
        let mut second = first.clone();

        flood(&mut first, &source);
        flood(&mut second, &source);
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.seed_labels(), vec![2, 3]);
    }
}
