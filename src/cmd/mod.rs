pub mod evaluate;
pub mod preprocess;
pub mod vocab;
