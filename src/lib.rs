pub mod application;
pub mod domain;
pub mod interfaces;
pub mod platform;
pub mod security;
pub mod storage;
