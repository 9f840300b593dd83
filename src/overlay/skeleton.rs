use crate::analysis::{Landmark, LandmarkSet};

pub const NOSE: usize = 0;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// Bones of the 33-point body-pose topology, as landmark index pairs.
pub const SKELETON_CONNECTIONS: [(usize, usize); 28] = [
    // Face
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (3, 5),
    (4, 6),
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 10),
    // Arms
    (11, 12),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
    // Torso
    (11, 23),
    (12, 24),
    (23, 24),
    // Legs and feet
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// Connections whose two endpoints are both present in `landmarks`.
pub fn visible_bones(
    landmarks: &LandmarkSet,
) -> impl Iterator<Item = ((usize, usize), &Landmark, &Landmark)> + '_ {
    SKELETON_CONNECTIONS
        .iter()
        .filter_map(move |&(start, end)| match (landmarks.get(start), landmarks.get(end)) {
            (Some(a), Some(b)) => Some(((start, end), a, b)),
            _ => None,
        })
}
