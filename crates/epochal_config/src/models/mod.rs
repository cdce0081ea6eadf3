pub mod compression;
pub mod epochal;
pub mod limits;
pub mod logging;
pub mod status;
