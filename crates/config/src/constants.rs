//! Default locations and limits

pub const DATA_DIR: &str = "data";
pub const DOWNLOADS_DIR: &str = "downloads";

/// 500 MiB, the long-standing upload cap
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

pub const DEFAULT_PLATFORM: &str = "cli-win32-x64";
pub const DEFAULT_QUALITY: &str = "stable";
