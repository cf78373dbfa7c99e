pub mod cell;
pub mod chase;
pub mod entity;
