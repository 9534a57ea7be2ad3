//! Headless painter that only counts primitives.

use fb_runtime::Painter;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingPainter {
    pub lines: usize,
    pub circles: usize,
    pub rects: usize,
}

impl CountingPainter {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.lines + self.circles + self.rects
    }
}

impl Painter for CountingPainter {
    fn draw_line(&mut self, _from: [f32; 3], _to: [f32; 3], _color: u32, _width: f32) {
        self.lines += 1;
    }

    fn draw_circle(&mut self, _center: [f32; 3], _radius: f32, _color: u32, _segments: u32) {
        self.circles += 1;
    }

    fn draw_rect(&mut self, _min: [f32; 2], _max: [f32; 2], _depth: f32, _color: u32, _width: f32) {
        self.rects += 1;
    }
}
