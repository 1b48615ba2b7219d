pub mod corpus;
pub mod redistribute;
pub mod reference;
pub mod resolver;
pub mod scoring;

pub use corpus::{CefrLevel, Corpus, ExamTag, Tier, WordEntry};
pub use redistribute::{redistribute, TierSet};
pub use reference::{load_references, ReferenceData, ReferencePaths};
pub use resolver::{classify, rescore, resolve, Signal, SignalCounts};
pub use scoring::{char_code_hash, frequency_estimate, spelling_complexity};
