// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for labeled boxes and the session's class list.

pub mod annotation;
pub mod registry;
