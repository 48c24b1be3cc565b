//! Compact output rendering helpers for CLI surfaces.
//!
//! Keeps command result output bounded and readable while preserving signal.

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Render a `occupied/capacity` pair for room listings.
pub fn occupancy_cell(occupied: i64, capacity: i64) -> String {
    format!("{}/{}", occupied, capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_line_collapses_whitespace() {
        assert_eq!(compact_line("a\n  b\tc", 80), "a b c");
    }

    #[test]
    fn test_compact_line_bounds_length() {
        assert_eq!(compact_line("abcdefgh", 4), "abcd...");
        assert_eq!(compact_line("abcd", 4), "abcd");
    }

    #[test]
    fn test_occupancy_cell() {
        assert_eq!(occupancy_cell(2, 4), "2/4");
    }
}
