mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::PLAYLIST_VERSIONED_SCHEMAS;
pub use store::SqlitePlaylistStore;
pub use trait_def::PlaylistStore;
