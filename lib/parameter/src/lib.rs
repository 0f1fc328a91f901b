//! Typed parameter and template model: how a configuration's values are
//! declared, how they depend on each other, and how they resolve to
//! concrete JSON at deploy time.

mod error;
mod resolve;
mod sort;
mod template;
mod value;

pub use error::{ParameterError, Result};
pub use resolve::{EntityLookup, EnvSource, ProcessEnv, resolve_all};
pub use sort::topological_order;
pub use template::render as render_template;
pub use value::{Parameter, ParameterRef};
