pub mod activate;
pub mod cli;
pub mod init;
pub mod submit;
