//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request path
//!     → router.rs (route lookup)
//!     → tree.rs (segment trie, longest registered prefix)
//!     → service name → ServiceRegistry
//!     → Return: matched Service or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[] (ordered)
//!     → Insert into RouteTreeBuilder (last duplicate wins)
//!     → Freeze as immutable RouteTree
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deepest registered ancestor wins; `/` acts as a catch-all
//! - `*` segments match any one segment and absorb unmatched tails

pub mod router;
pub mod tree;

pub use router::{RouteError, Router};
pub use tree::{PatternError, RouteTree, RouteTreeBuilder};
