mod maildir;

pub use maildir::*;
