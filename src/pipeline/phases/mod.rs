#[path = "01_scan.rs"]
pub mod scan;
#[path = "02_interpret.rs"]
pub mod interpret;
#[path = "03_seed.rs"]
pub mod seed;

pub use interpret::InterpretPhase;
pub use scan::{classify, ScanPhase};
pub use seed::SeedPhase;
