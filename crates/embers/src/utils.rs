//! Generally useful shared code.

/// Reset all attributes, clear the screen and move the cursor home.
pub const RESET_SCREEN: &str = "\x1b[0m\x1b[2J\x1b[H";
