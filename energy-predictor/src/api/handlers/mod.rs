pub mod health;
pub mod predict;
pub mod rooms;
