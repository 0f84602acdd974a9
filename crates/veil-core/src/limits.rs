//! Input limits enforced at the engine boundary

use std::time::Duration;

/// Longest accepted keyword, in characters
pub const MAX_KEYWORD_LENGTH: usize = 200;

/// Most ad-hoc keywords accepted per call
pub const MAX_KEYWORDS_COUNT: usize = 100;

pub const MAX_FILE_SIZE_MB: usize = 50;

pub const MAX_FILE_SIZE_BYTES: usize = MAX_FILE_SIZE_MB * 1024 * 1024;

/// Most files accepted per batch
pub const MAX_FILES_COUNT: usize = 20;

/// Bounded wait for the dictionary lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
