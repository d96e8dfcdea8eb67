//! Great-circle distances between members.

use geo::Point;

use crate::models::{Member, MemberDistance, MemberView};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points (x = longitude, y = latitude),
/// rounded to the nearest meter.
pub fn haversine_meters(a: Point<f64>, b: Point<f64>) -> i64 {
    let phi1 = a.y().to_radians();
    let phi2 = b.y().to_radians();
    let d_phi = (b.y() - a.y()).to_radians();
    let d_lambda = (b.x() - a.x()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_METERS * c).round() as i64
}

/// Attaches pairwise distances to every located member.
///
/// Members without a location get an empty list and never appear as a
/// target. This is quadratic in the group size, which is fine for walking
/// groups of tens of people.
pub fn attach_distances(members: Vec<Member>) -> Vec<MemberView> {
    members
        .iter()
        .cloned()
        .map(|member| view_of(member, &members))
        .collect()
}

/// Builds the view of one member against the rest of its group.
pub fn view_of(member: Member, group_members: &[Member]) -> MemberView {
    let distances = match member.position() {
        Some(origin) => group_members
            .iter()
            .filter(|other| other.id != member.id)
            .filter_map(|other| {
                other.position().map(|target| MemberDistance {
                    member_id: other.id,
                    distance_meters: haversine_meters(origin, target),
                })
            })
            .collect(),
        None => Vec::new(),
    };
    MemberView { member, distances }
}
