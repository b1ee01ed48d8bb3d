// Domain layer: models and ports shared by the quiz and the redirect resolver.

pub mod model;
pub mod ports;
