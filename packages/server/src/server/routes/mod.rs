// HTTP routes
pub mod dashboard;
pub mod health;
pub mod scans;

pub use dashboard::*;
pub use health::*;
pub use scans::*;
