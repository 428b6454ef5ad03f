pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
pub mod webhook;

pub use entities::*;
pub use ports::*;
pub use value_objects::*;
