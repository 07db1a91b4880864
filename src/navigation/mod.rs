//! Navigation resolution: decide whether input is a URL or a search, infer
//! display metadata, and compose the proxy redirect target.

mod classifier;
mod metadata;
mod resolver;

pub use classifier::classify;
pub use metadata::Icon;
pub use resolver::NavigationResolver;
