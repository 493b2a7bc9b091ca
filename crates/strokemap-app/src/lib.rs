// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dataset;
pub mod fields;
pub mod filter;
pub mod range;
pub mod state;
pub mod view;

pub use dataset::*;
pub use fields::*;
pub use filter::*;
pub use range::*;
pub use state::*;
pub use view::*;
