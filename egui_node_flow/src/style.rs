use egui::{Color32, Stroke};

use crate::color_hex_utils::color_from_hex;
use crate::NodePadding;

#[cfg(feature = "persistence")]
use serde::{Deserialize, Serialize};

fn hex(code: &str) -> Color32 {
    color_from_hex(code).unwrap_or(Color32::RED)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct FlowColors {
    pub background: Color32,
    pub grid: Color32,
    pub sub_grid: Color32,
    pub link: Color32,
    pub link_selected_outline: Color32,
    pub drag_out_link: Color32,
    pub node_background: Color32,
    pub node_header: Color32,
    pub node_header_title: Color32,
    pub node_border: Color32,
    pub node_selected_border: Color32,
    pub pin: Color32,
    pub pin_hovered: Color32,
    pub pin_label: Color32,
}

impl Default for FlowColors {
    fn default() -> Self {
        Self {
            background: hex("#2c2c34"),
            grid: hex("#c8c8c828"),
            sub_grid: hex("#c8c8c80a"),
            link: hex("#e6e6e6"),
            link_selected_outline: hex("#ff8000"),
            drag_out_link: hex("#e6e6e6"),
            node_background: hex("#5d5d5de6"),
            node_header: hex("#2b2b2b"),
            node_header_title: hex("#fefefe"),
            node_border: hex("#1e1e1e"),
            node_selected_border: hex("#ffbf00"),
            pin: hex("#8c8c8c"),
            pin_hovered: hex("#f0f0f0"),
            pin_label: hex("#dcdcdc"),
        }
    }
}

/// Visual configuration of a graph editor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct FlowStyle {
    pub colors: FlowColors,
    /// Spacing of the main grid lines, in canvas units.
    pub grid_size: f32,
    /// Number of sub-grid cells per grid cell. Dragged nodes snap to
    /// `grid_size / grid_subdivisions`.
    pub grid_subdivisions: f32,
    pub node_radius: f32,
    pub node_padding: NodePadding,
    pub node_border_thickness: f32,
    pub node_border_selected_thickness: f32,
    pub link_thickness: f32,
    pub link_hovered_thickness: f32,
    pub link_selected_outline_thickness: f32,
    /// Pointer distance, in pixels, under which a link counts as hovered.
    pub link_hover_tolerance: f32,
    /// Minimum horizontal reach of the link curve control points.
    pub link_min_bend: f32,
    pub drag_out_link_thickness: f32,
    pub pin_radius: f32,
    pub pin_hit_radius: f32,
    /// Gap between a pin glyph and its label.
    pub pin_spacing: f32,
}

impl Default for FlowStyle {
    fn default() -> Self {
        Self {
            colors: FlowColors::default(),
            grid_size: 50.0,
            grid_subdivisions: 5.0,
            node_radius: 8.0,
            node_padding: NodePadding::default(),
            node_border_thickness: 1.0,
            node_border_selected_thickness: 2.0,
            link_thickness: 2.6,
            link_hovered_thickness: 3.5,
            link_selected_outline_thickness: 2.0,
            link_hover_tolerance: 2.5,
            link_min_bend: 30.0,
            drag_out_link_thickness: 2.0,
            pin_radius: 4.0,
            pin_hit_radius: 8.0,
            pin_spacing: 4.0,
        }
    }
}

impl FlowStyle {
    /// Distance between two sub-grid lines; the snapping step for dragged
    /// nodes.
    pub fn snap_step(&self) -> f32 {
        self.grid_size / self.grid_subdivisions
    }

    pub fn node_border(&self, selected: bool) -> Stroke {
        if selected {
            Stroke::new(self.node_border_selected_thickness, self.colors.node_selected_border)
        } else {
            Stroke::new(self.node_border_thickness, self.colors.node_border)
        }
    }
}
