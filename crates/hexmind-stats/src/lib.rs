//! Statistical summaries for training runs.
//!
//! The trainer reports progress as summaries over sliding windows of recent
//! loss values rather than raw per-iteration numbers.
//!
//! # Examples
//!
//! ```
//! use hexmind_stats::descriptive::DescriptiveStats;
//!
//! let losses = [0.4, 0.38, 0.35, 0.36, 0.31];
//! let stats = DescriptiveStats::new(losses).unwrap();
//! assert_eq!(stats.min, 0.31);
//! assert_eq!(stats.max, 0.4);
//! ```

pub mod descriptive;
