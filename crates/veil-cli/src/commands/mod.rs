pub mod dict;
pub mod redact;
