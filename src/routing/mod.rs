//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     (method, pattern, accept type, target)
//!     → path.rs (validate pattern)
//!     → matcher.rs (immutable RouteEntry)
//!     → router.rs (append to copy-on-write table)
//!
//! Lookup (per request, against one snapshot):
//!     (method, raw path, Accept header)
//!     → matcher.rs (method + structural path match)
//!     → mime.rs (accept-type negotiation)
//!     → RouteMatch (params and splat derived on demand)
//! ```
//!
//! # Design Decisions
//! - Registration order is priority; no sorting or compilation step
//! - Matching is a pure function of (snapshot, method, path, accept)
//! - No regex in the hot path (segment comparison only)

pub mod matcher;
pub mod method;
pub mod mime;
pub mod path;
pub mod router;

pub use matcher::{RouteEntry, RouteMatch, Target};
pub use method::HttpMethod;
pub use path::PathPattern;
pub use router::{RouteSnapshot, RouteTable};
