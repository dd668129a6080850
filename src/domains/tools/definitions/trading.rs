//! Trading tools: batch execution, positions and orders.

use super::CatalogEntry;
use crate::core::backend::HttpMethod::Post;

pub const TOOLS: &[CatalogEntry] = &[
    // Batch operations
    CatalogEntry::payload(
        "closePerpetualsTrade",
        "Close a perpetuals trade for an agent",
        "/agent/batch-close",
        Post,
    ),
    CatalogEntry::payload(
        "spotTrade",
        "Execute a spot trade for an agent",
        "/agent/batch-swap",
        Post,
    ),
    // Positions & orders
    CatalogEntry::path_param(
        "getAgentBatches",
        "Retrieve all batches for a given agent",
        "agentId",
        "/agent/{agentId}/batches",
    ),
    CatalogEntry::path_param(
        "getBatchPositions",
        "Retrieve positions for a specific batch",
        "batchId",
        "/batch/{batchId}/positions",
    ),
    CatalogEntry::path_param(
        "getAgentPositions",
        "Retrieve positions for a given agent",
        "agentId",
        "/agent/{agentId}/positions",
    ),
    CatalogEntry::path_param(
        "getPositionsForSmartAccount",
        "Get positions for a smart account",
        "accountId",
        "/smart-account/{accountId}/positions",
    ),
    CatalogEntry::path_param(
        "getOrdersForSmartAccount",
        "Get orders for a smart account",
        "accountId",
        "/smart-account/{accountId}/orders",
    ),
];
