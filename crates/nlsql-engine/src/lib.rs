//! nlsql engine
//!
//! Knowledge base construction and question answering:
//! - Table annotation and the strict annotation literal parser
//! - Knowledge base builder with pluggable pacing
//! - Router, query synthesizer and the pipeline that sequences them

pub mod literal;
pub mod annotator;
pub mod pacing;
pub mod builder;
pub mod router;
pub mod synthesizer;
pub mod pipeline;

pub use literal::{parse_annotation, parse_literal, AnnotationParseError, Literal};
pub use annotator::{AnnotatorError, TableAnnotator};
pub use pacing::{FixedIntervalPacer, NoPacing, Pacer, TokenBucketPacer};
pub use builder::{BuildError, BuildReport, KnowledgeBaseBuilder, TableFailure};
pub use router::{parse_table_list, Router, RouterError, RoutingParseError};
pub use synthesizer::{GenerationError, QuerySynthesizer};
pub use pipeline::{Pipeline, PipelineError};
