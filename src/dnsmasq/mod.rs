pub mod reload;
pub mod render;

pub use reload::{CommandReloader, ServiceReloader};
pub use render::{FeatureToggles, DHCP_LEASE_TIME};
