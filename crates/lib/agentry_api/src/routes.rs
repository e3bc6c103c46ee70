//! Route paths.

pub const GET_API_HEALTH: &str = "/api/health";
pub const GET_API_AGENTS_ME: &str = "/api/agents/me";
