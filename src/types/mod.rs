pub mod entry;
pub mod error;
pub mod locale;

pub use entry::{Entry, Format};
pub use error::{DocError, Result};
pub use locale::Lang;
