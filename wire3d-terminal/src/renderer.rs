/// ASCII wireframe renderer for terminal output
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use wire3d_core::{DisplayConfig, Mesh, ObjectFrame};

/// Draws the visible faces of pipeline output as character-cell line art
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::White; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::White);
    }

    /// Character at a cell, `None` outside the buffer
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Outline every visible face of `mesh` using the points in `frame`.
    ///
    /// Edges take the color of the vertex they start from.
    pub fn render_object(&mut self, mesh: &Mesh, frame: &ObjectFrame, display: &DisplayConfig) {
        let to_cell = |(x, y): (f32, f32)| {
            (
                x / display.units_per_cell_x as f32,
                y / display.units_per_cell_y as f32,
            )
        };

        for (face, &visible) in mesh.polygons().faces().zip(&frame.visible_faces) {
            if !visible {
                continue;
            }
            for (i, &start) in face.iter().enumerate() {
                let end = face[(i + 1) % face.len()];
                let (Some(&a), Some(&b)) = (frame.points.get(start - 1), frame.points.get(end - 1))
                else {
                    continue;
                };
                let color = frame
                    .colors
                    .get(start - 1)
                    .map(|c| Color::Rgb { r: c.r, g: c.g, b: c.b })
                    .unwrap_or(Color::White);
                self.draw_line(to_cell(a), to_cell(b), color);
            }
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color) {
        let glyph = edge_glyph(to.0 - from.0, to.1 - from.1);
        let max_x = self.width as f32 - 1.0;
        let max_y = self.height as f32 - 1.0;
        let Some((from, to)) = clip_segment(from, to, max_x, max_y) else {
            return;
        };

        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (from.0 + dx * t).round() as i64;
            let y = (from.1 + dy * t).round() as i64;
            self.plot(x, y, glyph, color);
        }
    }

    fn plot(&mut self, x: i64, y: i64, glyph: char, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.char_buffer[idx] = glyph;
        self.color_buffer[idx] = color;
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                writer.queue(SetForegroundColor(self.color_buffer[idx]))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Liang–Barsky clip of a segment to `[0, max_x] x [0, max_y]`.
///
/// `None` when the segment misses the box, the box is empty, or any
/// coordinate is not finite.
fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    max_x: f32,
    max_y: f32,
) -> Option<((f32, f32), (f32, f32))> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if max_x < 0.0 || max_y < 0.0 || ![from.0, from.1, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [(-dx, from.0), (dx, max_x - from.0), (-dy, from.1), (dy, max_y - from.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

/// Pick a line character from the edge direction (rows grow downward)
fn edge_glyph(dx: f32, dy: f32) -> char {
    if dx == 0.0 && dy == 0.0 {
        '*'
    } else if dx.abs() > 2.0 * dy.abs() {
        '-'
    } else if dy.abs() > 2.0 * dx.abs() {
        '|'
    } else if dx * dy > 0.0 {
        '\\'
    } else {
        '/'
    }
}
