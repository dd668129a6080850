//! User subscription tools.

use super::CatalogEntry;
use crate::core::backend::HttpMethod::Post;

pub const TOOLS: &[CatalogEntry] = &[
    CatalogEntry::payload(
        "subscribeToAgent",
        "Subscribe a user to an agent",
        "/agent/subscribe",
        Post,
    ),
    CatalogEntry::payload(
        "unsubscribeFromAgent",
        "Unsubscribe a user from an agent",
        "/agent/unsubscribe",
        Post,
    ),
    CatalogEntry::path_param(
        "getAgentSubscribers",
        "Get a list of subscribers for a given agent",
        "agentId",
        "/agent/{agentId}/subscribers",
    ),
    CatalogEntry::path_param(
        "getSubscribedAgents",
        "Get a list of agents a user is subscribed to",
        "userId",
        "/user/{userId}/agents",
    ),
];
