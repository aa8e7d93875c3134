pub mod crop;
pub mod health;
