// Domain layer: station model and ports. No IO, no rendering.

pub mod model;
pub mod ports;
