mod amount;
mod identity;
mod snapshot;
mod time;
mod view;

pub mod status;

pub use amount::Wei;
pub use identity::{Identity, InvalidIdentity};
pub use snapshot::AuctionListSnapshot;
pub use status::{QUORUM, Status};
pub use time::Timestamp;
pub use view::{AuctionView, Phase};

pub use alloy_primitives::utils::UnitsError;
