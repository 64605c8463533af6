//! Keyword color palette.
//!
//! Keywords are highlighted in the bot's e-mail digest with one of these
//! colors. New keywords cycle through the palette in order.

/// Color used when nothing else is specified.
pub const DEFAULT_COLOR: &str = "#3498db";

/// All colors a keyword may carry.
pub const COLOR_PALETTE: [&str; 18] = [
    "#3498db", "#e67e22", "#2ecc71", "#9b59b6", "#e74c3c", "#1abc9c", "#f39c12", "#34495e",
    "#16a085", "#d35400", "#8e44ad", "#c0392b", "#27ae60", "#2980b9", "#f1c40f", "#7f8c8d",
    "#2c3e50", "#95a5a6",
];

/// Color for the keyword at `index` (wraps around the palette).
pub fn color_for_index(index: usize) -> &'static str {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

/// Look up a palette color, ignoring case.
///
/// Returns the canonical (lowercase) palette entry so stored colors stay
/// consistent with what the dashboard writes.
pub fn find_color(color: &str) -> Option<&'static str> {
    let color = color.trim();
    COLOR_PALETTE
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(color))
}
