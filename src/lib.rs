// Modules
pub mod cli;
pub mod error;
pub mod logic;
pub mod models;
pub mod utils;

pub use error::{ConversionError, ErrorKind};
pub use logic::batch::{run_batch, run_batch_file, run_batch_with, BatchOptions};
pub use logic::encapsulate::{encapsulate, try_encapsulate};
pub use models::config::{BatchConfig, PdfEntry};
pub use models::{BatchItemResult, BatchResult, ConversionRequest, ConversionResult};
