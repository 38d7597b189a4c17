// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Common utility functions.

mod env;
pub mod json;
mod tls;

pub use env::*;
pub use tls::*;
