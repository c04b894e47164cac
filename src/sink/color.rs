//! ANSI escape codes for terminal output.

pub const FG_RED: &str = "\x1b[31m";
pub const FG_GREEN: &str = "\x1b[32m";
pub const FG_YELLOW: &str = "\x1b[33m";
pub const FG_BLUE: &str = "\x1b[34m";
pub const FG_MAGENTA: &str = "\x1b[35m";
pub const FG_WHITE: &str = "\x1b[37m";

pub const BG_BLACK: &str = "\x1b[40m";

pub const RESET: &str = "\x1b[0m";
