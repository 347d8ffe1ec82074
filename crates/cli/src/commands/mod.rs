pub mod history;
pub mod init;
pub mod serve;
pub mod status;
