//! Character frame buffer and the overlay passes applied after raycasting:
//! minimap inset, sprites with per-column depth testing, name labels, and the
//! help box. `to_text` turns the grid into the wire frame.

use crate::game::map::{direction_marker, TileGrid};
use crate::game::player::Pose;
use crate::game::sprites::Sprite;

/// Mutable character grid, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x]
    }

    /// Bounds-checked write; out-of-frame cells are dropped.
    pub fn set(&mut self, x: i32, y: i32, ch: char) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = ch;
        }
    }

    /// Serialize row-major, rows top-to-bottom joined by newlines, no
    /// trailing newline.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.height * (self.width + 1));
        for y in 0..self.height {
            if y > 0 {
                out.push('\n');
            }
            for x in 0..self.width {
                out.push(self.cells[y * self.width + x]);
            }
        }
        out
    }
}

/// Draw the tile grid into the top-left corner, then direction markers for
/// the other players and finally the viewer (the viewer's glyph wins a cell).
pub fn overlay_minimap(
    frame: &mut Frame,
    grid: &TileGrid,
    viewer: Option<&Pose>,
    others: &[(f32, f32, f32)],
) {
    for y in 0..grid.height().min(frame.height) {
        for x in 0..grid.width().min(frame.width) {
            let ch = if grid.is_wall(x as i32, y as i32) {
                '#'
            } else {
                ' '
            };
            frame.set(x as i32, y as i32, ch);
        }
    }

    for &(x, y, a) in others {
        if grid.is_walkable(x, y) {
            frame.set(x as i32, y as i32, direction_marker(a));
        }
    }

    if let Some(pose) = viewer {
        if grid.is_walkable(pose.x, pose.y) {
            frame.set(pose.x as i32, pose.y as i32, direction_marker(pose.a));
        }
    }
}

/// Draw a sprite with its bottom row just above `anchor_y`, horizontally
/// centered per row on `anchor_x`. `!` cells are transparent. No depth test;
/// used for the viewer's own weapon.
pub fn draw_sprite(frame: &mut Frame, sprite: Sprite, anchor_x: i32, anchor_y: i32) {
    for (row_idx, row) in sprite.iter().enumerate() {
        let row_w = row.chars().count() as i32;
        for (col_idx, ch) in row.chars().enumerate() {
            if ch == '!' {
                continue;
            }
            let x = col_idx as i32 - row_w / 2 + anchor_x;
            let y = row_idx as i32 - sprite.len() as i32 + anchor_y;
            frame.set(x, y, ch);
        }
    }
}

/// Draw an enemy sprite like [`draw_sprite`], but each cell is depth-tested
/// against the wall raster so enemies behind walls are culled per column.
pub fn draw_occluded_sprite(
    frame: &mut Frame,
    depth: &[f32],
    sprite: Sprite,
    anchor_x: i32,
    anchor_y: i32,
    distance: f32,
) {
    for (row_idx, row) in sprite.iter().enumerate() {
        let row_w = row.chars().count() as i32;
        for (col_idx, ch) in row.chars().enumerate() {
            if ch == '!' {
                continue;
            }
            let x = col_idx as i32 - row_w / 2 + anchor_x;
            let y = row_idx as i32 - sprite.len() as i32 + anchor_y;
            if x < 0 || y < 0 || x as usize >= frame.width || y as usize >= frame.height {
                continue;
            }
            if (x as usize) < depth.len() && distance < depth[x as usize] {
                frame.set(x, y, ch);
            }
        }
    }
}

/// Draw a nickname centered on `center_x`, clipped per column where a wall is
/// nearer than the label's owner.
pub fn draw_name(
    frame: &mut Frame,
    depth: &[f32],
    name: &str,
    center_x: i32,
    y: i32,
    distance: f32,
) {
    if y < 0 || y as usize >= frame.height {
        return;
    }
    let len = name.chars().count() as i32;
    let start_x = center_x - len / 2;
    for (i, ch) in name.chars().enumerate() {
        let x = start_x + i as i32;
        if x < 0 || x as usize >= frame.width {
            continue;
        }
        if (x as usize) < depth.len() && distance < depth[x as usize] {
            frame.set(x, y, ch);
        }
    }
}

const HELP_BOX: [&str; 5] = [
    "╭────────────────────╮",
    "│ W/S move  A/D turn │",
    "│ M map  1/2 weapon  │",
    "│ Space fire Esc quit│",
    "╰────────────────────╯",
];

/// Key-binding box anchored to the top-right corner.
pub fn draw_help_overlay(frame: &mut Frame) {
    let box_w = HELP_BOX[0].chars().count() as i32;
    let origin_x = frame.width as i32 - box_w;
    if origin_x < 0 {
        return;
    }
    for (row_idx, row) in HELP_BOX.iter().enumerate() {
        for (col_idx, ch) in row.chars().enumerate() {
            frame.set(origin_x + col_idx as i32, row_idx as i32, ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_shape() {
        let mut frame = Frame::new(4, 3);
        frame.set(0, 0, 'a');
        frame.set(3, 2, 'z');
        let text = frame.to_text();
        let rows: Vec<&str> = text.split('\n').collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.chars().count() == 4));
        assert!(text.starts_with('a'));
        assert!(text.ends_with('z'));
    }

    #[test]
    fn test_set_ignores_out_of_bounds() {
        let mut frame = Frame::new(4, 3);
        frame.set(-1, 0, 'x');
        frame.set(4, 0, 'x');
        frame.set(0, 3, 'x');
        assert!(frame.to_text().chars().all(|c| c == ' ' || c == '\n'));
    }

    #[test]
    fn test_minimap_inset_and_markers() {
        let grid = TileGrid::open(6, 4);
        let mut frame = Frame::new(20, 10);
        let pose = Pose::new(2.5, 1.5, 0.0);
        overlay_minimap(&mut frame, &grid, Some(&pose), &[(3.5, 2.5, std::f32::consts::PI)]);

        assert_eq!(frame.get(0, 0), '#');
        assert_eq!(frame.get(5, 3), '#');
        assert_eq!(frame.get(2, 1), '>');
        assert_eq!(frame.get(3, 2), '<');
    }

    #[test]
    fn test_viewer_marker_wins_cell() {
        let grid = TileGrid::open(6, 4);
        let mut frame = Frame::new(20, 10);
        let pose = Pose::new(2.5, 1.5, 0.0);
        overlay_minimap(&mut frame, &grid, Some(&pose), &[(2.5, 1.5, std::f32::consts::PI)]);
        assert_eq!(frame.get(2, 1), '>');
    }

    #[test]
    fn test_occluded_sprite_respects_depth() {
        let mut frame = Frame::new(9, 6);
        // Wall at distance 2.0 everywhere except column 4
        let mut depth = vec![2.0f32; 9];
        depth[4] = 10.0;

        draw_occluded_sprite(&mut frame, &depth, &["ooo"], 4, 5, 5.0);
        assert_eq!(frame.get(4, 4), 'o');
        assert_eq!(frame.get(3, 4), ' ');
        assert_eq!(frame.get(5, 4), ' ');
    }

    #[test]
    fn test_transparent_cells_skipped() {
        let mut frame = Frame::new(9, 6);
        let depth = vec![10.0f32; 9];
        frame.set(4, 4, '█');
        draw_occluded_sprite(&mut frame, &depth, &["!x!"], 4, 5, 5.0);
        assert_eq!(frame.get(4, 4), '█', "transparent cell must not overwrite");
    }

    #[test]
    fn test_name_clipped_by_walls() {
        let mut frame = Frame::new(10, 4);
        let mut depth = vec![10.0f32; 10];
        depth[6] = 1.0;
        draw_name(&mut frame, &depth, "bob", 5, 1, 4.0);
        assert_eq!(frame.get(4, 1), 'b');
        assert_eq!(frame.get(5, 1), 'o');
        assert_eq!(frame.get(6, 1), ' ', "occluded column must stay clear");
    }

    #[test]
    fn test_help_overlay_top_right() {
        let mut frame = Frame::new(60, 20);
        draw_help_overlay(&mut frame);
        assert_eq!(frame.get(59, 0), '╮');
        assert_eq!(frame.get(59 - HELP_BOX[0].chars().count() + 1, 0), '╭');
    }
}
