pub mod gateway;
pub mod mercadopago;

pub use gateway::*;
pub use mercadopago::*;
