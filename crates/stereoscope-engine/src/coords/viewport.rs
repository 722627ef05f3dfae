/// Viewport rectangle in physical pixels, GL bottom-left origin.
///
/// Eye passes carry one of these; the render path applies it before invoking
/// the application's render callback.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Full-size viewport anchored at the origin.
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width: width as i32, height: height as i32 }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height; 1.0 when the rectangle is degenerate.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.height <= 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
