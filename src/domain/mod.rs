pub mod models;
pub mod publish;
pub mod question;
pub mod response;
pub mod survey;
