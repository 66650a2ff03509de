pub mod archive;
pub mod check;
pub mod export;
pub mod info;
pub mod init;
pub mod validate;
