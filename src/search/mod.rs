pub mod gateway;

pub use gateway::SearchGateway;
