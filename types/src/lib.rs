//! Configuration types shared between the hotbar engine and its front ends.
//!
//! Everything in here is plain data: it deserializes from the TOML config
//! file and is handed to `hotbar-core` to build the runtime objects.

pub mod formatting;
mod config;
mod geometry;

pub use config::{
    ActionConfig, BindingConfig, BindingTarget, ConfirmationMode, HotbarConfig, PolicyConfig,
};
pub use geometry::Rect;
