pub mod settings;
pub mod tables;
