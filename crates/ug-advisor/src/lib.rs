//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Advisory-text collaborator crate root."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
//! Free-text infrastructure guidance over a read-only fleet summary.
//!
//! Nothing in this crate is on the tick path: advisors read a
//! [`AdvisoryContext`] built from a published snapshot and failures degrade
//! to a fixed apology message.

pub mod client;
pub mod context;
pub mod errors;

pub use client::{
    advise_or_fallback, build_advisor, AdvisoryReply, AdvisoryService, HttpAdvisor,
    OfflineAdvisor, FALLBACK_RESPONSE, IDLE_RESPONSE,
};
pub use context::{system_prompt, AdvisoryContext, ChatRole, ChatTurn};
pub use errors::{AdvisorError, Result};
