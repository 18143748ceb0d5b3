pub mod client;
pub mod gateway;
pub mod simulated;
pub mod transport;
pub mod types;

pub use client::HttpRemote;
pub use gateway::RemoteGateway;
pub use simulated::{OfflineTransport, SimulatedServer};
pub use transport::{PushTransport, RemoteSource};
pub use types::{Delivery, DeliveryStrategy, PushAck, RemoteError};
