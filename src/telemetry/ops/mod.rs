pub mod init;
pub mod company;
pub mod scan;
pub mod jobs;
