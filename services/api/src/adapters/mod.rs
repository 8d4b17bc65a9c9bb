pub mod db;
pub mod http_probe;
pub mod local_fs;

pub use db::DbAdapter;
pub use http_probe::HttpProbeAdapter;
pub use local_fs::FileLocalStore;
