pub mod db;
pub mod jsearch;
pub mod memory;
pub mod storage;

pub use db::DbAdapter;
pub use jsearch::JSearchAdapter;
pub use memory::MemoryDbAdapter;
pub use storage::LocalFileStorage;
