//! Analysis orchestration
//!
//! Chains the single-purpose agents into one garment analysis:
//! - **Identify**: name, category and core attributes
//! - **Detail**: construction and embellishments
//! - **Style**: aesthetics and occasions
//!
//! Passes run in order; a failed pass leaves a `PassFailure` in the report
//! instead of aborting the chain.

pub mod multipass;

pub use multipass::{AnalysisReport, MergedAnalysis, MultiPassAnalyzer, Pass, PassFailure};
