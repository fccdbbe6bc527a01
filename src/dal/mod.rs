pub mod extractor;
pub mod hub;
pub mod s3;
pub mod signing;
