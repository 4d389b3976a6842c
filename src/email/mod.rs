pub mod clients;
pub mod templates;

pub use templates::load_templates;
