//! # FoodLink Forms
//!
//! Submission pipeline for the FoodLink donation, request and volunteer
//! forms, plus the fixed food-bank directory behind the "find nearby" page.
//!
//! None of this is a security boundary. Rate limits, CSRF tokens, the
//! sanitizer and the anomaly screen all run on the client side and can be
//! bypassed by anyone who skips the client. They keep honest users from
//! double-submitting and turn away lazy probes; the backend still has to
//! validate everything itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foodlink_forms::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = SubmissionPipeline::builder()
//!         .with_endpoint("https://foodlink.example.org/api/submit")
//!         .build()?;
//!
//!     let form = Form::Donation(DonationForm {
//!         name: Some("Mary Jane".into()),
//!         email: Some("mary@example.org".into()),
//!         donation_type: Some("canned-goods".into()),
//!         ..Default::default()
//!     });
//!
//!     let report = pipeline.submit(&form).await;
//!     println!("{:?}: {}", report.final_state(), report.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  FormCommand  ┌─────────────────────────┐  POST   ┌─────────┐
//! │ Presentation │ ────────────► │   SubmissionPipeline    │ ──────► │ Backend │
//! └──────────────┘ ◄──────────── │                         │         └─────────┘
//!                    FormEvent   │ Validators ◄─ Sanitizer │
//!                                │ RateLimiter ◄─ Session  │
//!                                │ AnomalyDetector         │
//!                                │ AuditLogger             │
//!                                │ Transport               │
//!                                └─────────────────────────┘
//! ```

pub mod anomaly;
pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod form;
pub mod locator;
pub mod pipeline;
pub mod rate_limit;
pub mod sanitize;
pub mod session;
pub mod transport;
pub mod types;
pub mod validate;

pub use config::FormsConfig;
pub use error::{FormError, Result};
pub use pipeline::SubmissionPipeline;
pub use session::Session;
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::FormsConfig;
    pub use crate::error::{FormError, Result};
    pub use crate::form::{DonationForm, Form, FormKind, RequestForm, VolunteerForm};
    pub use crate::pipeline::SubmissionPipeline;
    pub use crate::session::Session;
    pub use crate::transport::Transport;
    pub use crate::types::*;
}
