pub mod creds;
pub mod sender;
