pub mod editor;
pub mod header;
pub mod preview;
pub mod status;
