pub mod artifact;
pub mod store;

pub use artifact::SessionArtifact;
pub use store::SessionStore;
