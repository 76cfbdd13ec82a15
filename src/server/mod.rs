mod tools;

pub use tools::{DocsPageRequest, DocsServer};
