pub mod app;
pub mod components;
pub mod fs;
pub mod logging;
pub mod markdown;
pub mod paths;
pub mod settings;
pub mod shell;
pub mod store;
pub mod sync;
pub mod theme;
