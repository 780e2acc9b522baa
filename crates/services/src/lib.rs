//! # services
//!
//! Application logic sitting between the HTTP adapters and the ports:
//! authentication, discussion/analysis access control, and the prompts and
//! defensive parsing around the external language model.

pub mod analyses;
pub mod auth;
pub mod discussions;
pub mod gateway;

pub use analyses::AnalysisService;
pub use auth::AuthService;
pub use discussions::{title_from_content, DiscussionDetail, DiscussionService};
pub use gateway::Gateway;
