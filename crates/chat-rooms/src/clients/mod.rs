//! Type-safe wrappers around [`CellClient`](cell_framework::CellClient), one per kind of
//! chat cell.

pub mod building_client;
pub mod censor_client;
pub mod public_address_client;
pub mod room_client;
pub mod user_client;

pub use building_client::*;
pub use censor_client::*;
pub use public_address_client::*;
pub use room_client::*;
pub use user_client::*;
