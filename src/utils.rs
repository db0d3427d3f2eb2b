pub mod discovery;
pub mod logging;
pub mod uid;
