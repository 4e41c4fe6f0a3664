pub mod csv_source;

pub use csv_source::read_csv_records;
