pub mod catalog;
pub mod domain;
pub mod locator;
pub mod memory;
pub mod ports;
pub mod progress;
pub mod session;

pub use catalog::CatalogError;
pub use domain::{Annotation, BookMetadata, CatalogEntry, LocatorKind, ReadingProgress, ResourceLocator};
pub use locator::{LocatorConfig, LocatorParser};
pub use ports::{LocalStore, PortError, PortResult, ReachabilityService, RemoteStore};
pub use progress::{Backend, ProgressStore};
pub use session::ReadingSession;
