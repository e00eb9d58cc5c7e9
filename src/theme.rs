//! Color palette for the IDE panels (Catppuccin Mocha).

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_folder_fg: Color,
    pub tree_file_fg: Color,
    pub tree_system_fg: Color,
    pub tree_endpoint_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,
    pub tab_active_fg: Color,
    pub tab_inactive_fg: Color,

    // Status bar
    pub status_fg: Color,

    // Semantic
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,

    // Editor
    pub editor_fg: Color,
    pub editor_line_nr: Color,
    pub editor_line_nr_current: Color,
    pub editor_gutter_sep: Color,
    pub editor_cursor_fg: Color,
    pub editor_cursor_bg: Color,
    pub editor_current_line_bg: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        dark_theme()
    }
}

pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_selected_bg: Color::Rgb(69, 71, 90),     // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244),  // #cdd6f4 (text)
        tree_folder_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),
        tree_system_fg: Color::Rgb(108, 112, 134),    // #6c7086 (overlay0)
        tree_endpoint_fg: Color::Rgb(166, 227, 161),  // #a6e3a1 (green)

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250),
        tab_active_fg: Color::Rgb(249, 226, 175),     // #f9e2af (yellow)
        tab_inactive_fg: Color::Rgb(108, 112, 134),

        status_fg: Color::Rgb(205, 214, 244),

        error_fg: Color::Rgb(243, 139, 168),          // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175),
        success_fg: Color::Rgb(166, 227, 161),
        info_fg: Color::Rgb(137, 180, 250),
        dim_fg: Color::Rgb(108, 112, 134),

        editor_fg: Color::Rgb(205, 214, 244),
        editor_line_nr: Color::Rgb(108, 112, 134),
        editor_line_nr_current: Color::Rgb(249, 226, 175),
        editor_gutter_sep: Color::Rgb(69, 71, 90),
        editor_cursor_fg: Color::Rgb(30, 30, 46),     // #1e1e2e (base)
        editor_cursor_bg: Color::Rgb(205, 214, 244),
        editor_current_line_bg: Color::Rgb(49, 50, 68), // #313244 (surface0)
    }
}
