pub mod documents;
pub mod filter;
pub mod ids;
pub mod memory;
pub mod persistence;
pub mod projection;
