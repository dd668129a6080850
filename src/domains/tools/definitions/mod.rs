//! Tool definitions module.
//!
//! The Symphony catalog is a static table: every row names a tool, describes
//! it and says how it maps onto the backend. [`register_all`] turns the rows
//! into contracts. Rows are grouped by API area, one file per area.
//!
//! ## Adding a New Tool
//!
//! Add a [`CatalogEntry`] to the matching area file. Tools that do not fit a
//! row shape (like `symphonyRequest`) get their own file and are registered
//! explicitly in [`register_all`].

pub mod agents;
pub mod custom_request;
pub mod fees;
pub mod subscriptions;
pub mod trading;
pub mod withdrawals;

pub use custom_request::SymphonyRequestTool;

use super::contract::ToolContract;
use super::error::ToolError;
use super::registry::ToolRegistry;
use crate::core::backend::HttpMethod;

/// How a catalog tool reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forward a `payload` object to a fixed path.
    Payload {
        path: &'static str,
        method: HttpMethod,
    },
    /// GET a path built by substituting one string argument.
    PathParam {
        field: &'static str,
        template: &'static str,
    },
    /// GET a fixed path without arguments.
    FixedGet { path: &'static str },
}

/// One row of the tool catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub route: Route,
}

impl CatalogEntry {
    pub const fn payload(
        name: &'static str,
        description: &'static str,
        path: &'static str,
        method: HttpMethod,
    ) -> Self {
        Self {
            name,
            description,
            route: Route::Payload { path, method },
        }
    }

    pub const fn path_param(
        name: &'static str,
        description: &'static str,
        field: &'static str,
        template: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            route: Route::PathParam { field, template },
        }
    }

    pub const fn fixed_get(name: &'static str, description: &'static str, path: &'static str) -> Self {
        Self {
            name,
            description,
            route: Route::FixedGet { path },
        }
    }

    /// Build the contract described by this row.
    pub fn contract(&self) -> ToolContract {
        match self.route {
            Route::Payload { path, method } => {
                ToolContract::payload(self.name, path, method, self.description)
            }
            Route::PathParam { field, template } => {
                ToolContract::path_param(self.name, self.description, field, template)
            }
            Route::FixedGet { path } => ToolContract::fixed_get(self.name, self.description, path),
        }
    }
}

/// Every catalog row, in registration order.
pub fn catalog() -> impl Iterator<Item = &'static CatalogEntry> {
    agents::TOOLS
        .iter()
        .chain(subscriptions::TOOLS)
        .chain(trading::TOOLS)
        .chain(fees::TOOLS)
        .chain(withdrawals::TOOLS)
}

/// Register the whole Symphony tool set.
pub fn register_all(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(SymphonyRequestTool::contract())?;
    for entry in catalog() {
        registry.register(entry.contract())?;
    }
    Ok(())
}
