//! Scaffolding for containerised ROS development environments.
//!
//! From a handful of choices (distro, simulator, workspace mounts, extra
//! packages) this crate renders a `Dockerfile`, a `.env` file and a
//! `docker-compose.yaml`, saves the choices so the environment can be
//! regenerated, and drives the resulting container through its lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ros-env (binary)
//!     │
//!     ├── create / create_from
//!     │       ├── distro     resolve the codename against the rosdistro index
//!     │       ├── deps       split a dependency file into apt and pip buckets
//!     │       ├── options    turn command-line choices into GenerationOptions
//!     │       ├── identity   host uid/gid and names
//!     │       ├── generator  render and write the three artifacts
//!     │       └── config     save / load the choices as YAML
//!     │
//!     └── build / start / stop / kill / delete
//!             ├── preflight  locate the engine binary
//!             ├── engine     one EngineCall per docker invocation
//!             └── lifecycle  observe, plan, execute
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ros_env::distro::HttpIndex;
//! use ros_env::identity::HostIdentity;
//! use ros_env::options::{self, Request};
//! use ros_env::generator::{self, files};
//!
//! let base = std::env::current_dir()?;
//! let request = Request { distro: Some("jazzy".into()), ..Default::default() };
//! let options = options::prepare(&request, &HttpIndex::from_env(), &base)?;
//! let artifacts = generator::generate(&options, &HostIdentity::capture(), &base)?;
//! files::write_artifacts(&base, &artifacts)?;
//! ```

pub mod config;
pub mod deps;
pub mod distro;
pub mod engine;
pub mod error;
pub mod generator;
pub mod identity;
pub mod lifecycle;
pub mod mounts;
pub mod options;
pub mod preflight;

pub use error::{Error, Result};
pub use options::GenerationOptions;
