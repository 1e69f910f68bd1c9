//! Source whitelist enforcement for PipeWrench answers.
//!
//! - [`whitelist`]: the approved-source registry
//! - [`citations`]: URL citation extraction from answer text
//! - [`checker`]: classification of citations into a compliance outcome
//!
//! # Example
//! ```
//! use pipewrench_compliance::{check_compliance, extract_citations, WhitelistRegistry};
//!
//! let registry = WhitelistRegistry::builtin().unwrap();
//! let citations = extract_citations("Per https://www.osha.gov/confined-spaces, test the atmosphere first.");
//! let check = check_compliance(&citations, &registry);
//! assert!(check.all_whitelisted());
//! ```

pub mod checker;
pub mod citations;
pub mod url;
pub mod whitelist;

pub use checker::{check_compliance, ComplianceCheck, ComplianceStatus};
pub use citations::{extract_citations, Citation};
pub use url::{normalize_url, NormalizedUrl};
pub use whitelist::{WhitelistEntry, WhitelistRegistry, WhitelistSummary};
