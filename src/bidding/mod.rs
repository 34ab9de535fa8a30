pub mod anti_snipe;
pub mod engine;
pub mod validate;
