pub mod financial;
pub mod profile;
pub mod reading;
pub mod sizing;

pub use financial::*;
pub use profile::*;
pub use reading::*;
pub use sizing::*;
