use std::fmt;

/// Handle to a managed X window. The X server owns the surface; columns only
/// reference it by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && i64::from(px) < i64::from(self.x) + i64::from(self.width)
            && i64::from(py) < i64::from(self.y) + i64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(100, 0, 50, 20);
        assert!(r.contains(100, 0));
        assert!(r.contains(149, 19));
        assert!(!r.contains(150, 10));
        assert!(!r.contains(99, 10));
        assert!(!r.contains(120, 20));
    }

    #[test]
    fn window_id_displays_as_hex() {
        assert_eq!(WindowId(0x1e00007).to_string(), "0x1e00007");
    }
}
