/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that are common across the components of DBRB-rs.
//!
//! Types specific to a single component, e.g., the per-payload [broadcast
//! record](crate::broadcast_data::BroadcastRecord), are defined next to that component.

pub mod basic;

pub mod certificate;

pub mod crypto_primitives;

pub mod view;
