//! Agent management tools.

use super::CatalogEntry;
use crate::core::backend::HttpMethod::{Post, Put};

pub const TOOLS: &[CatalogEntry] = &[
    CatalogEntry::payload("registerAgent", "Register a new agent", "/agent/register", Post),
    CatalogEntry::payload(
        "unregisterAgent",
        "Unregister an existing agent",
        "/agent/unregister",
        Post,
    ),
    CatalogEntry::payload("updateAgentName", "Update an agent's name", "/agent/update-name", Put),
    CatalogEntry::payload(
        "updateAgentDescription",
        "Update an agent's description",
        "/agent/update-description",
        Put,
    ),
    CatalogEntry::payload("updateAgentImage", "Update an agent's image", "/agent/update-image", Put),
    CatalogEntry::payload(
        "updateAgentManager",
        "Update an agent's manager address",
        "/agent/update-manager-address",
        Put,
    ),
    CatalogEntry::payload(
        "updateAgentPublic",
        "Update agent public settings",
        "/agent/update-public",
        Put,
    ),
    CatalogEntry::payload("updateAgentInfo", "Update general agent info", "/agent/update-info", Put),
];
