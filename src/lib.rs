//! lnoi400-pdk: parametric technology and component library for the
//! LNOI400 lithium-niobate-on-insulator photonic process.
//!
//! The library derives a complete [`Technology`](technology::Technology)
//! (layers, materials, extrusion rules, port cross-sections) from a small
//! set of fabrication parameters and generates validated layouts of the
//! standard photonic and RF building blocks.
//!
//! # Architecture
//!
//! - **Technology**: built deterministically from
//!   [`TechnologyParams`](technology::TechnologyParams); immutable once built
//! - **Components**: serde parameter structs implementing
//!   [`Generator`](components::Generator), registered in a static catalog
//! - **Utilities**: CPW sizing by target impedance and edge coupler placement
//!
//! Geometry is flat: sub-components are placed by port and copied into the
//! parent, so every generated component is a set of polygons per layer
//! plus its ports.
//!
//! # Modules
//!
//! - [`technology`]: Technology builder and the default technology slot
//! - [`components`]: Component generators and the catalog
//! - [`layout`]: Points, polygons, paths, ports and components
//! - [`utils`]: CPW sizing and edge coupler placement
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types

pub mod components;
pub mod config;
pub mod error;
pub mod layout;
pub mod technology;
pub mod utils;

pub use components::{component_names, generate, Generator};
pub use error::{ConfigError, ParameterError, ParameterResult, ValidationError};
pub use layout::{Component, Port};
pub use technology::{default_technology, Technology, TechnologyParams};
