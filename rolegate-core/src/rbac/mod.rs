//! Roles and their dashboard namespaces
//!
//! - [`Role`]: the closed set of six account categories
//! - [`RouteMap`]: the role → path-prefix table every redirect is computed from
//!
//! # Example
//! ```rust,ignore
//! use rolegate_core::rbac::{Role, RouteMap};
//!
//! let map = RouteMap::standard();
//! assert_eq!(map.prefix(Role::Admin), Some("/admin"));
//! assert_eq!(map.owner_of("/admin/users"), Some(Role::Admin));
//! ```

mod roles;
mod route_map;

pub use roles::{Role, RoleParseError};
pub use route_map::{RouteMap, RouteMapError};

pub(crate) use route_map::strip_query;
