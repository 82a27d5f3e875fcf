pub mod chunker;
pub mod document;
pub mod embedding;
pub mod index;
pub mod loader;
pub mod pipeline;

pub use chunker::{Chunk, ChunkConfig, Chunker};
pub use embedding::{Embedder, EmbeddingError, EmbeddingIdentity};
pub use index::{IndexError, SearchHit, VectorIndex};
pub use loader::{DocumentLoader, LoadError, Source, SourceList, SourceLoader};
pub use pipeline::{IngestError, IngestReport, IngestionPipeline};
