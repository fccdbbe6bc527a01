pub mod embedding_handler;
pub mod publish_handler;
