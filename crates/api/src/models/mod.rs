pub mod diagnostic;
pub mod handle;
pub mod language;
pub mod symbol;
pub mod usr;

pub use diagnostic::*;
pub use handle::*;
pub use language::*;
pub use symbol::*;
pub use usr::*;
