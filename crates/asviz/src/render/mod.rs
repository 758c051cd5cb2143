// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output renderers for outlines and graphs.

pub mod html;
pub mod json;
pub mod text;
