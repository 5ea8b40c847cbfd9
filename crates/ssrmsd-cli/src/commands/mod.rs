pub mod evaluate;
pub mod templates;
