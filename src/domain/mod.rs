// Domain layer: core models and ports (interfaces). No transport or storage code here.

pub mod model;
pub mod ports;
