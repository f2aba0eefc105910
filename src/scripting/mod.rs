pub mod sandbox;
pub mod runner;

pub use sandbox::{BoaEngine, ScriptContext, ScriptEngine, ScriptLimits};
pub use runner::{apply_extractors, ScriptRunner};
