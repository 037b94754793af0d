//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Enums such as [`crate::Resource`] and [`crate::UserRole`] appear in URL
//! paths and JSON payloads as lowercase names. This macro keeps the two
//! directions of that mapping in one table.
//!
//! # Example
//!
//! ```rust
//! use marketlink_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum OrderState {
//!     Open,
//!     Delivered,
//! }
//!
//! impl_wire_name_conversions!(OrderState {
//!     Open => "open",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(OrderState::Delivered.to_string(), "delivered");
//! assert_eq!("OPEN".parse::<OrderState>().unwrap(), OrderState::Open);
//! ```

/// Implements Display and FromStr for enums with a lowercase wire name
///
/// Parsing is case-insensitive; errors name the enum and the rejected input.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum DisputeState {
        Open,
        UnderReview,
        Resolved,
    }

    impl_wire_name_conversions!(DisputeState {
        Open => "open",
        UnderReview => "under_review",
        Resolved => "resolved",
    });

    #[test]
    fn displays_wire_name() {
        assert_eq!(DisputeState::UnderReview.to_string(), "under_review");
        assert_eq!(format!("/disputes?state={}", DisputeState::Open), "/disputes?state=open");
    }

    #[test]
    fn parses_mixed_case() {
        assert_eq!(DisputeState::from_str("Resolved").unwrap(), DisputeState::Resolved);
        assert_eq!(DisputeState::from_str("UNDER_REVIEW").unwrap(), DisputeState::UnderReview);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = DisputeState::from_str("escalated").unwrap_err();
        assert!(err.contains("Invalid DisputeState: escalated"));
        assert!(DisputeState::from_str("").is_err());
    }
}
