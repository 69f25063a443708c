//! Client state: session, directory, timeline and compose box.
//!
//! All mutation goes through [`reducer::reduce`], driven by the store task
//! that [`Dispatcher`] spawns. Network calls run beside it and report back
//! as [`Action`]s; results tagged for a selection that is no longer current
//! are dropped.

pub mod action;
pub mod directory;
pub mod dispatcher;
pub mod effects;
pub mod markup;
pub mod reducer;
pub mod state;
pub mod timeline;
pub mod view;

pub use action::{Action, Effect};
pub use dispatcher::{Dispatcher, StoreConfig};
pub use state::{AppState, Banner, BannerKind, SessionPhase};
pub use timeline::TimelinePhase;
