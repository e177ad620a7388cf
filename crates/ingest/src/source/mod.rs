pub mod gateway;
pub mod traits;

pub use gateway::GatewaySource;
pub use traits::MetadataSource;
