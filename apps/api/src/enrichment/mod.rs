// AI enrichment: keyword categorization, the upload-time pipeline and the
// standalone analysis routes. Upstream calls go through `cognitive`.

pub mod categorize;
pub mod handlers;
pub mod pipeline;
