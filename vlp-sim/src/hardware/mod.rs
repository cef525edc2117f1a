//! Hardware module for emitter, receiver and sensor models

pub mod emitter;
pub mod receiver;
pub mod sensor;

pub use emitter::Emitter;
pub use receiver::{Receiver, ReceiverParams};
pub use sensor::{Sensor, SensorLayout};
