pub(crate) mod analyses;
pub(crate) mod assistant;
pub(crate) mod auth;
pub(crate) mod discussions;
pub(crate) mod system;
