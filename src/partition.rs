use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three autonomous catalog partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeName {
    LibraryA,
    LibraryB,
    LibraryC,
}

/// Fixed enumeration order of the cluster. Fan-out hop targets are derived
/// from this order, so it must not change.
pub const ALL_NODES: [NodeName; 3] = [NodeName::LibraryA, NodeName::LibraryB, NodeName::LibraryC];

impl NodeName {
    /// Lowest id of this partition's seed range (A = 1000, B = 2000, C = 3000).
    pub fn base_id(&self) -> u64 {
        match self {
            NodeName::LibraryA => 1000,
            NodeName::LibraryB => 2000,
            NodeName::LibraryC => 3000,
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeName::LibraryA => write!(f, "Library A"),
            NodeName::LibraryB => write!(f, "Library B"),
            NodeName::LibraryC => write!(f, "Library C"),
        }
    }
}

impl FromStr for NodeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" | "Library A" => Ok(NodeName::LibraryA),
            "B" | "b" | "Library B" => Ok(NodeName::LibraryB),
            "C" | "c" | "Library C" => Ok(NodeName::LibraryC),
            other => Err(format!("Unknown node name: {}", other)),
        }
    }
}

/// Maps a book id to its owning partition.
///
/// The id is bucketed by its leading-thousands digit with round-half-to-even
/// semantics (`f64::round_ties_even`). Boundary ids therefore land exactly
/// where existing deployments expect them: 1500 and 2500 both round to bucket
/// 2 and belong to Library B.
pub fn resolve(id: u64) -> NodeName {
    let bucket = (id as f64 / 1000.0).round_ties_even() as i64;
    match bucket {
        1 => NodeName::LibraryA,
        2 => NodeName::LibraryB,
        _ => NodeName::LibraryC,
    }
}

/// Returns the two partitions other than `node`, preserving the relative
/// order of [`ALL_NODES`]. Hops 2 and 3 of a fan-out transaction target these
/// in order.
pub fn peers(node: NodeName) -> [NodeName; 2] {
    let mut others = ALL_NODES.iter().copied().filter(|n| *n != node);
    [others.next().unwrap(), others.next().unwrap()]
}

/// Range-based placement used for user membership: users below 2000 belong to
/// Library A, below 3000 to Library B, everyone else to Library C.
pub fn home_of_user(user_id: u64) -> NodeName {
    if user_id < 2000 {
        NodeName::LibraryA
    } else if user_id < 3000 {
        NodeName::LibraryB
    } else {
        NodeName::LibraryC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_maps_by_leading_thousands_digit() {
        assert_eq!(resolve(1001), NodeName::LibraryA);
        assert_eq!(resolve(1499), NodeName::LibraryA);
        assert_eq!(resolve(2002), NodeName::LibraryB);
        assert_eq!(resolve(2004), NodeName::LibraryB);
        assert_eq!(resolve(3001), NodeName::LibraryC);
        assert_eq!(resolve(4002), NodeName::LibraryC);
    }

    #[test]
    fn resolve_boundary_ids_round_half_to_even() {
        // 1.5 and 2.5 both round to 2 under banker's rounding.
        assert_eq!(resolve(1500), NodeName::LibraryB);
        assert_eq!(resolve(2500), NodeName::LibraryB);
        // 0.5 rounds to 0 and 3.5 rounds to 4, neither bucket 1 nor 2.
        assert_eq!(resolve(500), NodeName::LibraryC);
        assert_eq!(resolve(3500), NodeName::LibraryC);
    }

    #[test]
    fn resolve_is_total_over_three_partitions() {
        for id in 0..10_000 {
            let node = resolve(id);
            assert!(ALL_NODES.contains(&node));
        }
    }

    #[test]
    fn peers_preserve_enumeration_order() {
        assert_eq!(peers(NodeName::LibraryA), [NodeName::LibraryB, NodeName::LibraryC]);
        assert_eq!(peers(NodeName::LibraryB), [NodeName::LibraryA, NodeName::LibraryC]);
        assert_eq!(peers(NodeName::LibraryC), [NodeName::LibraryA, NodeName::LibraryB]);
    }

    #[test]
    fn user_homes_follow_id_ranges() {
        assert_eq!(home_of_user(1002), NodeName::LibraryA);
        assert_eq!(home_of_user(1999), NodeName::LibraryA);
        assert_eq!(home_of_user(2001), NodeName::LibraryB);
        assert_eq!(home_of_user(3001), NodeName::LibraryC);
    }

    #[test]
    fn node_names_parse_and_display() {
        assert_eq!("A".parse::<NodeName>().unwrap(), NodeName::LibraryA);
        assert_eq!("Library B".parse::<NodeName>().unwrap(), NodeName::LibraryB);
        assert_eq!(NodeName::LibraryC.to_string(), "Library C");
        assert!("D".parse::<NodeName>().is_err());
    }
}
