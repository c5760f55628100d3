pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// one typed context per command
pub fn vocab() -> LogCtx<ops::vocab::Vocab> { LogCtx::new(config::logs_are_json()) }
pub fn preprocess() -> LogCtx<ops::preprocess::Preprocess> { LogCtx::new(config::logs_are_json()) }
pub fn evaluate() -> LogCtx<ops::evaluate::Evaluate> { LogCtx::new(config::logs_are_json()) }
