//! Maven repository protocol: deploy URL layout, authentication, the HTTP
//! PUT transport, and the per-file upload-with-retry task.

pub mod publish;
pub mod repository;
pub mod upload;
