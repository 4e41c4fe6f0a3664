pub mod indicators;
pub mod table;
