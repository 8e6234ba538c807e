pub mod replay;
pub mod report;
