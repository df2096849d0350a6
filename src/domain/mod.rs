pub mod allocator;
pub mod ingest;
pub mod lifecycle;
pub mod models;
pub mod results;
