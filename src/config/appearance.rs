use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Appearance {
    /// Border of tiled windows. Maximized windows drop it.
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_focused_border_color")]
    pub focused_border_color: String,
    /// New windows open a fresh column until this many exist.
    #[serde(default = "default_columns")]
    pub columns: usize,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            border_width: default_border_width(),
            border_color: default_border_color(),
            focused_border_color: default_focused_border_color(),
            columns: default_columns(),
        }
    }
}

fn default_border_width() -> u32 {
    2
}

fn default_border_color() -> String {
    String::from("#7A8478")
}

fn default_focused_border_color() -> String {
    String::from("#A7C080")
}

fn default_columns() -> usize {
    2
}

fn parse_color(color: &str, fallback: u64) -> u64 {
    let color = color.trim_start_matches('#');
    u64::from_str_radix(color, 16).unwrap_or(fallback)
}

impl Appearance {
    pub fn get_border_color(&self) -> u64 {
        parse_color(&self.border_color, 0x7A8478)
    }

    pub fn get_focused_border_color(&self) -> u64 {
        parse_color(&self.focused_border_color, 0xA7C080)
    }
}
