pub mod db;
pub mod models;
pub mod storage;

pub use rusqlite;
