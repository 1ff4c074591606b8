/// Default page size for generation listings
pub const DEFAULT_PAGE_SIZE: i64 = 15;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum accepted image upload size in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Length of the random suffix appended to stored image filenames
pub const STORAGE_SUFFIX_LEN: usize = 10;

/// Key segment under which uploaded images are stored
pub const GENERATIONS_STORAGE_DIR: &str = "generations";
