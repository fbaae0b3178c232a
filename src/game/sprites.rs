//! Sprite assets and projection metrics. `!` cells are transparent. Enemy
//! silhouettes come in eight sizes selected by scale-adjusted distance.

use crate::game::constants::render;

pub type Sprite = &'static [&'static str];

pub const PISTOL_IDLE: Sprite = &[
    "!!!╔═╗!!!",
    "!!!║ ║!!!",
    "!!!║ ║!!!",
    "╭─╮╠═╣!!!",
    "│ ╰─╮ ╭─╮",
    "│   │ │ │",
    "│   ╰─╯ │",
    "╰╮     ╭╯",
];

pub const PISTOL_FIRE: Sprite = &[
    r"!!!\V/!!!",
    "!!!╔═╗!!!",
    "!!!║ ║!!!",
    "!!!║ ║!!!",
    "╭─╮╠═╣!!!",
    "│ ╰─╮ ╭─╮",
    "│   │ │ │",
    "│   ╰─╯ │",
];

pub const SHOTGUN_IDLE: Sprite = &[
    "!!!!╔═╦═╗!!!",
    "!!!!║ ║ ║!!!",
    "!!!!║ ║ ║!!!",
    "!!!╭║ ║ ║╮!!",
    "!!!│║ ║ ║│!!",
    "!!╱!║ ║ ║╰─╮",
    "!╱!!╠═╩═╣!!│",
    "╱!!!│   │!!│",
    "!!!!╰╮!╭╯!!!",
    "!!!!!│!│!!!!",
];

pub const SHOTGUN_FIRE: Sprite = &[
    r"!!!\\V|V//!!",
    r"!!!!\V|V/!!!",
    "!!!!╔═╦═╗!!!",
    "!!!!║ ║ ║!!!",
    "!!!!║ ║ ║!!!",
    "!!!╭║ ║ ║╮!!",
    "!!!│║ ║ ║│!!",
    "!!╱!║ ║ ║╰─╮",
    "!╱!!╠═╩═╣!!│",
    "╱!!!│   │!!│",
];

const ENEMY_1: Sprite = &["▪"];

const ENEMY_2: Sprite = &["o", "│"];

const ENEMY_3: Sprite = &["!o!", r"/│\", "!│!"];

const ENEMY_4: Sprite = &["!o!", r"/│\", "!│!", r"/!\"];

const ENEMY_5: Sprite = &["!(o)!", r"!/│\!", "!!│!!", r"!/!\!", r"/!!!\"];

const ENEMY_6: Sprite = &[
    "!!(o)!!",
    r"!!/│\!!",
    r"!/!│!\!",
    "!!!│!!!",
    r"!!/!\!!",
    r"!/!!!\!",
];

const ENEMY_7: Sprite = &[
    "!!!(o)!!!",
    r"!!!/│\!!!",
    r"!!/!│!\!!",
    r"!/!!│!!\!",
    r"!!!/!\!!!",
    r"!!/!!!\!!",
];

const ENEMY_8: Sprite = &[
    "!!!!(o)!!!!",
    r"!!!!/│\!!!!",
    r"!!!/!│!\!!!",
    r"!!/!!│!!\!!",
    r"!/!!!│!!!\!",
    r"!!!!/!\!!!!",
    r"!!!/!!!\!!!",
];

/// Factor applied to real distance before sprite selection, so a resized or
/// rescaled viewport keeps the same apparent enemy size progression as the
/// default frame.
pub fn distance_scale(screen_width: usize, screen_height: usize, view_scale: f32) -> f32 {
    let base_area = (render::DEFAULT_COLS * render::DEFAULT_ROWS) as f32;
    let current_area = (screen_width.max(1) * screen_height.max(1)) as f32;
    let effective_area = current_area * (view_scale * view_scale).max(0.1);
    (base_area / effective_area).sqrt()
}

/// Pick one of the eight silhouettes by scaled apparent distance; nearest
/// targets get the largest frame.
pub fn select_enemy_sprite(distance: f32) -> Sprite {
    if distance <= 1.0 {
        ENEMY_8
    } else if distance <= 2.0 {
        ENEMY_7
    } else if distance <= 3.0 {
        ENEMY_6
    } else if distance <= 4.0 {
        ENEMY_5
    } else if distance <= 5.0 {
        ENEMY_4
    } else if distance <= 6.0 {
        ENEMY_3
    } else if distance <= 7.0 {
        ENEMY_2
    } else {
        ENEMY_1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_uniform_width(sprite: Sprite) {
        let w = sprite[0].chars().count();
        assert!(sprite.iter().all(|row| row.chars().count() == w));
    }

    #[test]
    fn test_sprites_have_uniform_row_widths() {
        for sprite in [
            PISTOL_IDLE,
            PISTOL_FIRE,
            SHOTGUN_IDLE,
            SHOTGUN_FIRE,
            ENEMY_1,
            ENEMY_2,
            ENEMY_3,
            ENEMY_4,
            ENEMY_5,
            ENEMY_6,
            ENEMY_7,
            ENEMY_8,
        ] {
            assert_uniform_width(sprite);
        }
    }

    #[test]
    fn test_enemy_sprites_grow_toward_viewer() {
        let mut last_height = 0usize;
        for d in [8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0] {
            let height = select_enemy_sprite(d).len();
            assert!(height >= last_height, "sprite shrank as distance closed");
            last_height = height;
        }
    }

    #[test]
    fn test_sprite_selection_thresholds() {
        assert_eq!(select_enemy_sprite(0.5).len(), ENEMY_8.len());
        assert_eq!(select_enemy_sprite(1.0).len(), ENEMY_8.len());
        assert_eq!(select_enemy_sprite(1.01).len(), ENEMY_7.len());
        assert_eq!(select_enemy_sprite(7.5).len(), ENEMY_1.len());
        assert_eq!(select_enemy_sprite(100.0).len(), ENEMY_1.len());
    }

    #[test]
    fn test_distance_scale_identity_at_base() {
        let scale = distance_scale(render::DEFAULT_COLS, render::DEFAULT_ROWS, 1.0);
        assert!((scale - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_distance_scale_shrinks_with_area() {
        // Quadruple the area: apparent distances halve
        let scale = distance_scale(render::DEFAULT_COLS * 2, render::DEFAULT_ROWS * 2, 1.0);
        assert!((scale - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_distance_scale_view_scale_floor() {
        // Tiny view scales are floored so the factor stays finite
        let floored = distance_scale(render::DEFAULT_COLS, render::DEFAULT_ROWS, 0.01);
        let at_floor = distance_scale(render::DEFAULT_COLS, render::DEFAULT_ROWS, 0.1f32.sqrt());
        assert!((floored - at_floor).abs() < 1e-4);
    }
}
