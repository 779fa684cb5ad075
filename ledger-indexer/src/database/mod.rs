//! Adapters for the source database and the document index

pub mod elastic;
pub mod mappings;
pub mod postgres;

pub use elastic::ElasticIndex;
pub use mappings::mapping_for;
pub use postgres::PostgresSource;
