// SPDX-License-Identifier: MIT

//! Services module - upstream client, token lifecycle, route protection.

pub mod graph;
pub mod protected;
pub mod token;

pub use graph::GraphClient;
pub use protected::{AuthCheck, HashedTokenComparer, RouteGuard, TokenComparer};
pub use token::TokenManager;
