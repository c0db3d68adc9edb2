//! Galeria Catalog Library
//!
//! Adapters for both ends of the catalog migration: the Supabase source
//! (PostgREST table or a CSV export of it, plus the public storage bucket), the
//! HTTP asset fetcher, and the Firestore destination (REST API).

pub mod csv_export;
pub mod error;
pub mod fetcher;
pub mod firestore;
pub mod supabase;
pub mod traits;

pub use csv_export::CsvCatalogReader;
pub use error::{CatalogError, CatalogResult};
pub use fetcher::HttpAssetFetcher;
pub use firestore::FirestoreCatalogWriter;
pub use supabase::SupabaseCatalogReader;
pub use traits::{
    AssetFetcher, DestinationCatalogWriter, SourceCatalogReader, WriteAction, WriteResult,
};
