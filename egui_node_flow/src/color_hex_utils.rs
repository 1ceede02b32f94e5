use egui::Color32;

/// Parses `#rrggbb` or `#rrggbbaa` (the leading `#` is optional). Returns
/// `None` on malformed input.
pub fn color_from_hex(hex: &str) -> Option<Color32> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            channel(6)?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_and_rgba() {
        assert_eq!(color_from_hex("#ff8000"), Some(Color32::from_rgb(255, 128, 0)));
        assert_eq!(color_from_hex("ffffffff"), Some(Color32::WHITE));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(color_from_hex("#12"), None);
        assert_eq!(color_from_hex("#gg0000"), None);
    }
}
