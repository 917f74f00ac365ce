// Domain layer: table rows, report types and ports (interfaces).

pub mod model;
pub mod ports;
