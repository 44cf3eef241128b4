pub mod firm;
pub mod fund;
pub mod household;

pub use firm::*;
pub use fund::*;
pub use household::*;
