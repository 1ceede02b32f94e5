use egui::Pos2;

pub trait ColorUtils {
    /// Multiplies the color rgb values by `factor`, keeping alpha untouched.
    fn lighten(&self, factor: f32) -> Self;
}

impl ColorUtils for egui::Color32 {
    fn lighten(&self, factor: f32) -> Self {
        egui::Color32::from_rgba_premultiplied(
            (self.r() as f32 * factor) as u8,
            (self.g() as f32 * factor) as u8,
            (self.b() as f32 * factor) as u8,
            self.a(),
        )
    }
}

fn snap_axis(value: f32, step: f32) -> f32 {
    let cells = value / step;
    // Values already on the grid may land a hair below the line after the
    // division; treat those as on the line so snapping is idempotent.
    let rounded = cells.round();
    let cells = if (cells - rounded).abs() < 1e-4 {
        rounded
    } else {
        cells.floor()
    };
    cells * step
}

/// Quantizes `pos` down onto the grid with spacing `step` on both axes.
/// A non-positive `step` disables snapping.
pub fn snap_to_grid(pos: Pos2, step: f32) -> Pos2 {
    if step <= 0.0 || !step.is_finite() {
        return pos;
    }
    Pos2::new(snap_axis(pos.x, step), snap_axis(pos.y, step))
}
