//! # Armature - Declarative Azure Resource Manager Handlers
//!
//! Armature is a library of declarative resource and data-source handlers
//! for Azure Resource Manager, designed to be embedded in a host
//! reconciliation engine. Each handler maps one configuration block onto
//! create/read/update/delete calls against the management API and
//! reconciles remote state back into local state.
//!
//! ## Core Concepts
//!
//! - **Resources**: handlers exposing Create/Read/Update/Delete for one
//!   remote object type
//! - **Data Sources**: read-only lookups of existing remote objects
//! - **Schemas**: declarative attribute sets with validation, immutability
//!   and sensitivity metadata consumed by the host's diff engine
//! - **State**: the attribute accessor/mutator correlating local
//!   configuration with a remote object through its composite identifier
//! - **Client**: typed management API traits the host backs with a real
//!   transport
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Host Engine                             │
//! │        (plan/diff, import, drift detection)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Resource Registry                         │
//! │        (schema validation, handler dispatch)                │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                    │
//!          ▼                  ▼                    ▼
//! ┌────────────────┐ ┌─────────────────┐ ┌──────────────────┐
//! │  VM Extension  │ │   Integration   │ │      Policy      │
//! │    handler     │ │ Runtime handler │ │ Definition (data)│
//! └────────────────┘ └─────────────────┘ └──────────────────┘
//!          │                  │                    │
//!          └──────────────────┼────────────────────┘
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Typed ARM Client                           │
//! │    (get / create_or_update / delete / operation wait)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use armature::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(build_arm_client()?);
//!     let ctx = ProviderContext::new(client).with_require_import(true);
//!     let registry = ResourceRegistry::with_builtins();
//!
//!     let mut state = ResourceState::from_attributes(configured_attributes());
//!     registry
//!         .create("azure_virtual_machine_extension", &mut state, &ctx)
//!         .await?;
//!     println!("created {}", state.id().unwrap());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arm;
pub mod client;
pub mod error;
pub mod resources;
pub mod schema;
pub mod state;

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::arm::id::ResourceId;
    pub use crate::client::{ApiError, ArmClient, Operation, OperationStatus};
    pub use crate::error::{Error, Result};
    pub use crate::resources::{
        DataSource, ProviderContext, Resource, ResourceRegistry,
    };
    pub use crate::schema::{Attribute, AttributeType, DiffSuppress, Schema};
    pub use crate::state::{AttributeMap, ResourceState};
}

pub use error::{Error, Result};
