pub mod local;
pub mod remote;

pub use local::LocalLayoutStore;
pub use remote::{RemoteExporter, RemoteLayoutStore};
