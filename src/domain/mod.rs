// Domain layer: 與後端交換的資料結構，以及 core 使用的 ports

pub mod model;
pub mod ports;
