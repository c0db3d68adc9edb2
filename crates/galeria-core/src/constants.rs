//! Defaults shared by configuration and the adapters.

pub const DEFAULT_SOURCE_TABLE: &str = "productos";
pub const DEFAULT_SOURCE_BUCKET: &str = "imagenes";
pub const DEFAULT_SOURCE_PAGE_SIZE: usize = 1000;
pub const DEFAULT_SOURCE_CSV_PATH: &str = "productos_rows.csv";

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
pub const DEFAULT_DESTINATION_COLLECTION: &str = "productos";

pub const DEFAULT_ASSET_KEY_PREFIX: &str = "obras";
pub const DEFAULT_STAGING_DIR: &str = "temp_images";
pub const DEFAULT_MAGICK_PATH: &str = "magick";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TRANSCODE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ASSET_BYTES: u64 = 50 * 1024 * 1024;

/// Destination field holding the server-assigned migration timestamp.
pub const MIGRATED_AT_FIELD: &str = "migrado_el";

/// Destination field holding the source record id, used for upserts.
pub const SOURCE_ID_FIELD: &str = "source_id";
