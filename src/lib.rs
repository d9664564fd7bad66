//! Commission computation for small sales teams.
//!
//! Sales sheets are read by [`infra::loader`], cleaned by [`domain::normalize`]
//! and priced by [`domain::commission`] against a [`domain::CommissionPlan`].

pub mod app;
pub mod domain;
pub mod infra;
pub mod util;
