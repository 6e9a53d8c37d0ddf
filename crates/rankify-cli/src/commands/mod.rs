pub mod compare;
pub mod evaluate;
pub mod init;
pub mod parse_answer;
pub mod validate_key;
