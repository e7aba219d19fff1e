// Domain layer: module locations, symbols, and the resolution/trust ports.

pub mod model;
pub mod ports;
