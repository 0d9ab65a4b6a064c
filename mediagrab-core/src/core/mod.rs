pub mod download;
pub mod errors;
pub mod filename;
pub mod metadata;
pub mod mime;
pub mod options;
pub mod process;
pub mod url_parser;
pub mod ytdlp;
