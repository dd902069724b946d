pub mod clean;
pub mod hash;
pub mod init;
pub mod path;
pub mod status;
pub mod watch;
