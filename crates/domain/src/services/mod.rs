//! Domain services for Group Trek.
//!
//! Services contain logic that operates on domain models without touching
//! storage or the network.

pub mod distance;
pub mod group_view;
pub mod presence;

pub use distance::{attach_distances, haversine_meters, view_of, EARTH_RADIUS_METERS};
pub use group_view::GroupView;
pub use presence::MemberChange;
