//! # guardrail-actions
//!
//! The action catalog ([`Action`]) and the [`ActionPlanner`] that turns an
//! intent into a single-step draft plan. This is the only crate that knows
//! which actions exist.
//!
//! ```rust,ignore
//! use guardrail_actions::{Action, ActionPlanner};
//!
//! let planner = ActionPlanner::new(8453);
//! let intent = Action::approve_exact(usdc, router, amount).into();
//! ```

pub mod action;
pub mod planner;

pub use action::{
    Action, Erc20ApproveParams, Erc20TransferParams, NativeTransferParams, SwapParams, CATALOG,
};
pub use planner::ActionPlanner;
