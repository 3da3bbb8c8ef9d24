pub mod enqueue;
pub mod migrate;
pub mod serve;
