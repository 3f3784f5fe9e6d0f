//! Colors shared by the interface panels.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Background Colors
// ============================================================================

/// Pressable button background (#1a1f26)
pub const BG_BUTTON: Color = Color::Rgb(26, 31, 38);

// ============================================================================
// Accent Colors
// ============================================================================

/// Focused panel border and active field (#00d4aa)
pub const ACCENT: Color = Color::Rgb(0, 212, 170);

/// Unfocused panel border (#1e2530)
pub const BORDER: Color = Color::Rgb(30, 37, 48);

// ============================================================================
// Status Colors
// ============================================================================

pub const GREEN_SUCCESS: Color = Color::Rgb(74, 222, 128);
pub const AMBER_WARNING: Color = Color::Rgb(251, 191, 36);
pub const RED_ERROR: Color = Color::Rgb(248, 113, 113);

// ============================================================================
// Text Colors
// ============================================================================

pub const TEXT_PRIMARY: Color = Color::Rgb(226, 232, 240);
pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184);

/// Disabled buttons and hints (#64748b)
pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139);

pub fn border(focused: bool) -> Style {
    Style::default().fg(if focused { ACCENT } else { BORDER })
}

pub fn field(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_PRIMARY)
    }
}

/// Color for a message line, picked from its leading marker.
pub fn message(line: &str) -> Style {
    let color = if line.starts_with('✓') {
        GREEN_SUCCESS
    } else if line.starts_with('⚠') {
        AMBER_WARNING
    } else if line.starts_with('❌') {
        RED_ERROR
    } else {
        TEXT_SECONDARY
    };
    Style::default().fg(color)
}
