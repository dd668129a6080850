//! Fee configuration and retrieval tools.

use super::CatalogEntry;
use crate::core::backend::HttpMethod::Post;

pub const TOOLS: &[CatalogEntry] = &[
    CatalogEntry::payload(
        "setFees",
        "Set fees for an agent or organization",
        "/fees/set",
        Post,
    ),
    CatalogEntry::fixed_get(
        "getOrganizationFees",
        "Get fees settings for your organization",
        "/fees/organization",
    ),
    CatalogEntry::path_param(
        "getAgentFees",
        "Get fees settings for a specific agent",
        "agentId",
        "/agent/{agentId}/fees",
    ),
    CatalogEntry::fixed_get(
        "getFeesBalances",
        "Get fee balances for the organization",
        "/fees/balances",
    ),
];
