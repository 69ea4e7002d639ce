// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod license;
pub mod member;
pub mod snapshot;

pub use license::{CategoryScheme, LicenseCategory, SchemeError};
pub use member::{
    CareerStats, Car, License, Member, MemberCareerResponse, MemberInfoResponse,
    RecentRacesResponse,
};
pub use snapshot::{CategorySnapshot, CategoryStats, NamedValue, RaceResult, StatSnapshot};
