//! Terminal output: the [`Surface`] trait, its ANSI implementation and the
//! raw-mode guard.

mod guard;
mod output;
mod style;
mod surface;

pub use guard::TerminalGuard;
pub use output::OutputBuffer;
pub use style::{Rgb, Style};
pub use surface::{AnsiSurface, Surface};
