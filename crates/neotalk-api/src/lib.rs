// neotalk-api: Async Rust client for the NeoTalk backend (REST + event stream)

pub mod client;
pub mod dashboards;
pub mod error;
pub mod extensions;
pub mod transport;
pub mod types;
pub mod websocket;

pub use client::NeoTalkClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    ComponentInstanceDto, ComponentPositionDto, DashboardComponentDto, DashboardDto,
    DashboardLayoutDto, SizeConstraintsDto,
};
