//! Token and native-currency withdrawal tools.

use super::CatalogEntry;
use crate::core::backend::HttpMethod::Post;

pub const TOOLS: &[CatalogEntry] = &[
    CatalogEntry::payload(
        "withdrawToken",
        "Withdraw an ERC-20 token from the platform",
        "/withdraw/token",
        Post,
    ),
    CatalogEntry::payload(
        "withdrawNative",
        "Withdraw the native chain currency (e.g., ETH)",
        "/withdraw/native",
        Post,
    ),
];
