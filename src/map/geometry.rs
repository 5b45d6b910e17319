use crate::braille::BrailleCanvas;

/// Bresenham line between two dot positions.
pub fn draw_line(canvas: &mut BrailleCanvas, (x0, y0): (i32, i32), (x1, y1): (i32, i32)) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Filled disc; radius 0 sets a single dot.
pub fn draw_disc(canvas: &mut BrailleCanvas, (cx, cy): (i32, i32), radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel(cx + dx, cy + dy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_fills_top_row() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, (0, 0), (9, 0));
        // every cell gets both top dots
        assert!((0..5).all(|c| canvas.glyph(c, 0) == Some('⠉')));
    }

    #[test]
    fn vertical_line_spans_cells() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, (0, 0), (0, 7));
        assert_eq!(canvas.glyph(0, 0), Some('⡇'));
        assert_eq!(canvas.glyph(0, 1), Some('⡇'));
    }

    #[test]
    fn disc_sizes() {
        let mut dot = BrailleCanvas::new(4, 2);
        draw_disc(&mut dot, (3, 3), 0);
        assert_eq!(dot.glyphs().count(), 1);

        let mut disc = BrailleCanvas::new(4, 2);
        draw_disc(&mut disc, (3, 3), 2);
        assert!(disc.glyphs().count() > 1);
    }
}
