//! Per-column raycasting: one ray per screen column marched through the tile
//! grid, rasterized into wall/floor glyph bands plus a depth column used for
//! sprite occlusion.

use crate::game::constants::render;
use crate::game::frame::Frame;
use crate::game::map::TileGrid;
use crate::game::player::Pose;

/// Result of casting a single ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance to the nearest wall, always in (0, MAX_DEPTH].
    pub distance: f32,
    /// Whether the ray grazed a cell corner (rendered as a seam).
    pub boundary: bool,
}

/// Cast the ray for `column` of a `screen_width`-wide viewport. Leaving the
/// grid counts as a capped-depth wall hit.
pub fn cast_column(grid: &TileGrid, pose: &Pose, column: usize, screen_width: usize) -> RayHit {
    let ray_angle = pose.a - render::FIELD_OF_VIEW / 2.0
        + column as f32 / screen_width as f32 * render::FIELD_OF_VIEW;

    let eye_x = ray_angle.cos();
    let eye_y = ray_angle.sin();

    let mut distance = 0.0f32;
    let mut boundary = false;
    let mut hit = false;

    while !hit && distance < render::MAX_DEPTH {
        distance += render::RAY_STEP;
        let test_x = (pose.x + eye_x * distance) as i32;
        let test_y = (pose.y + eye_y * distance) as i32;

        if !grid.in_bounds(test_x, test_y) {
            hit = true;
            distance = render::MAX_DEPTH;
        } else if grid.is_wall(test_x, test_y) {
            hit = true;
            boundary = corner_boundary(pose, eye_x, eye_y, test_x, test_y);
        }
    }

    RayHit {
        distance: distance.min(render::MAX_DEPTH),
        boundary,
    }
}

/// Sample the hit cell's four integer corners; the seam flag is set when the
/// ray direction passes within the threshold angle of one of the three
/// nearest corners.
fn corner_boundary(pose: &Pose, eye_x: f32, eye_y: f32, cell_x: i32, cell_y: i32) -> bool {
    let mut corners: Vec<(f32, f32)> = Vec::with_capacity(4);
    for tx in 0..2 {
        for ty in 0..2 {
            let vx = (cell_x + tx) as f32 - pose.x;
            let vy = (cell_y + ty) as f32 - pose.y;
            let d = (vx * vx + vy * vy).sqrt();
            let dot = (eye_x * vx + eye_y * vy) / d;
            corners.push((d, dot));
        }
    }
    corners.sort_by(|a, b| a.0.total_cmp(&b.0));
    corners
        .iter()
        .take(3)
        .any(|&(_, dot)| dot.clamp(-1.0, 1.0).acos() < render::BOUNDARY_THRESHOLD)
}

/// Owns a frame buffer plus its depth columns and redraws both from a pose.
#[derive(Debug)]
pub struct Renderer {
    frame: Frame,
    depth: Vec<f32>,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: Frame::new(width, height),
            depth: vec![render::MAX_DEPTH; width],
        }
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Split borrow for overlay passes that depth-test against the raster.
    pub fn frame_and_depth(&mut self) -> (&mut Frame, &[f32]) {
        (&mut self.frame, &self.depth)
    }

    /// Raycast every column and rasterize walls and floor into the frame,
    /// refreshing the depth columns.
    pub fn render(&mut self, grid: &TileGrid, pose: &Pose) {
        let width = self.frame.width();
        let height = self.frame.height();

        for x in 0..width {
            let hit = cast_column(grid, pose, x, width);
            self.depth[x] = hit.distance;

            let ceiling = (height as f32 / 2.0 - height as f32 / hit.distance) as i32;
            let floor = height as i32 - ceiling;

            for y in 0..height as i32 {
                let ch = if y <= ceiling {
                    ' '
                } else if y <= floor {
                    wall_glyph(hit.distance, hit.boundary)
                } else {
                    floor_glyph(y, height)
                };
                self.frame.set(x as i32, y, ch);
            }
        }
    }
}

fn wall_glyph(distance: f32, boundary: bool) -> char {
    if boundary {
        ' '
    } else if distance < render::MAX_DEPTH / 3.0 {
        '█'
    } else if distance < render::MAX_DEPTH / 1.75 {
        '■'
    } else if distance < render::MAX_DEPTH {
        '▪'
    } else {
        ' '
    }
}

fn floor_glyph(y: i32, height: usize) -> char {
    let half = height as f32 / 2.0;
    let b = 1.0 - (y as f32 - half) / half;
    if b < 0.20 {
        '●'
    } else if b < 0.40 {
        '•'
    } else if b < 0.60 {
        '·'
    } else {
        ' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_distance_always_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let grid = map::generate(20, 10, &mut rng);
        let pose = Pose::new(3.5, 3.5, 0.7);
        for x in 0..120 {
            let hit = cast_column(&grid, &pose, x, 120);
            assert!(hit.distance > 0.0);
            assert!(hit.distance <= crate::game::constants::render::MAX_DEPTH);
        }
    }

    #[test]
    fn test_out_of_grid_caps_at_max_depth() {
        let grid = TileGrid::open(20, 10);
        // Starting beyond the grid the first step is already out of bounds
        let pose = Pose::new(40.0, 5.0, 0.0);
        let hit = cast_column(&grid, &pose, 60, 120);
        assert_eq!(hit.distance, crate::game::constants::render::MAX_DEPTH);
    }

    #[test]
    fn test_center_column_hits_facing_wall() {
        let grid = TileGrid::open(20, 10);
        // Facing the right border wall (x = 19) from (3.5, 5.5)
        let pose = Pose::new(3.5, 5.5, 0.0);
        let hit = cast_column(&grid, &pose, 60, 120);
        assert!((hit.distance - 15.5).abs() < 0.2, "distance {}", hit.distance);
    }

    #[test]
    fn test_render_fills_depth_per_column() {
        let grid = TileGrid::open(20, 10);
        let pose = Pose::new(3.5, 5.5, 0.0);
        let mut renderer = Renderer::new(80, 24);
        renderer.render(&grid, &pose);
        assert_eq!(renderer.depth().len(), 80);
        assert!(renderer
            .depth()
            .iter()
            .all(|&d| d > 0.0 && d <= crate::game::constants::render::MAX_DEPTH));
    }

    #[test]
    fn test_near_wall_renders_solid_band() {
        let grid = TileGrid::open(20, 10);
        // One unit from the left border, looking straight at it; off-center
        // in the cell so the ray does not graze a corner seam
        let pose = Pose::new(2.0, 5.3, std::f32::consts::PI);
        let mut renderer = Renderer::new(40, 20);
        renderer.render(&grid, &pose);
        // Mid-screen center column should be solid wall glyph
        assert_eq!(renderer.frame().get(20, 10), '█');
    }

    #[test]
    fn test_floor_gradient_rows() {
        assert_eq!(floor_glyph(39, 40), '●');
        assert_eq!(floor_glyph(21, 40), ' ');
        assert_eq!(wall_glyph(2.0, true), ' ');
        assert_eq!(wall_glyph(2.0, false), '█');
        assert_eq!(wall_glyph(15.9, false), '▪');
    }
}
