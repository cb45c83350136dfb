pub const DOCUMENTS_PREFIX: &str = "documents/";
pub const THUMBS_PREFIX: &str = "thumbs/";

pub const COPY_CHUNK_SIZE: usize = 4096;
