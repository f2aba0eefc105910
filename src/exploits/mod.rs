pub mod dispatcher;
pub mod lfi;
pub mod module;
pub mod registry;

pub use dispatcher::ExploitDispatcher;
pub use lfi::LfiModule;
pub use module::{ExploitModule, ExploitRunner};
pub use registry::ExploitRegistry;
