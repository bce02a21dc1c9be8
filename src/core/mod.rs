//! Per-file filtering and batch processing

pub mod filter;
pub mod invoker;
pub mod processor;
pub mod selection;

pub use filter::{ProcessStatus, Processed, TranspileFilter};
pub use invoker::invoke;
pub use processor::{load_file_list, process_files, BatchResult, FileOutcome};
pub use selection::ExtensionPolicy;
