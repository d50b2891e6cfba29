// Timeline entries: upload, listing/search, restricted edits, deletion.

pub mod handlers;
pub mod store;
pub mod upload;
