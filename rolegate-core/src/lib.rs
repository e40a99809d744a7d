//! Rolegate - Core
//!
//! Sign-in plumbing for a multi-role portal: take the identity provider's
//! callback, keep one local session, ask the backend which role that
//! session really has, and route every view by that role.
//!
//! # Overview
//!
//! ```rust,no_run
//! use rolegate_core::config::RolegateConfig;
//! use rolegate_core::navigation::{Lifetime, RecordingNavigator};
//! use rolegate_core::portal::{Portal, Visit};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RolegateConfig::load()?;
//! let portal = Portal::open(&config, Arc::new(RecordingNavigator::new()))?;
//!
//! let view = Lifetime::new();
//! if let Visit::Guarded(guard) = portal.visit("/dashboard", view.token()).await {
//!     println!("{:?}", guard.settled().await);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`session`] - the single persisted session slot, one writer and many readers
//! - [`callback`] - turns provider callback parameters into a session or an error code
//! - [`resolver`] - canonical role lookup with caching and stale-result suppression
//! - [`rbac`] - the closed role set and the role → namespace table
//! - [`guard`] - pure routing decisions plus the mounted, redirect-once guard view
//! - [`navigation`] - navigation effects and view lifetimes
//! - [`portal`] - composition root wiring all of the above
//! - [`config`], [`logging`], [`http`] - ambient setup and the dev role-lookup server

pub mod callback;
pub mod config;
pub mod guard;
pub mod http;
pub mod logging;
pub mod navigation;
pub mod portal;
pub mod rbac;
pub mod resolver;
pub mod session;

pub use callback::{CallbackErrorCode, CallbackIngestor, CallbackParams, IngestState};
pub use config::RolegateConfig;
pub use guard::{decide, decide_entry, GuardDecision, GuardView, RouteGuard};
pub use navigation::{Lifetime, LifetimeToken, NavigationMode, Navigator};
pub use portal::{Portal, RouteKind, Visit};
pub use rbac::{Role, RouteMap};
pub use resolver::{ResolveError, RoleResolver, RoleSnapshot};
pub use session::{Session, SessionStore, SessionUser};
